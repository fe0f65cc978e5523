//! VDAB Job Archiver
//!
//! Archives stale job applications on the VDAB portal by replaying an
//! authenticated browser session: the session identifier is recovered from the
//! page context, the application list is walked page by page and every
//! application older than the cutoff is archived.

// Module declarations
pub mod domain;
pub mod application;
pub mod infrastructure;
pub mod cli;

#[cfg(test)]
pub(crate) mod test_utils;

pub use application::{JobArchiver, MessageRouter};
pub use domain::{InboundCommand, OutboundEvent, PageContext, SessionIdentifier};
