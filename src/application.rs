//! Application layer: the archiving actor and the message router in front of it.

pub mod archiver;
pub mod router;

pub use archiver::{ArchiverError, ArchiverStatus, IdentifierCheck, JobArchiver, StartOutcome};
pub use router::{BroadcastSink, MessageRouter, NOT_ON_PORTAL};
