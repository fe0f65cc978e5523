//! Domain module - session identifiers, application records and run state
//!
//! Everything in here is plain data plus the rules that operate on it
//! (identifier validation, age classification, run counters). No I/O.

pub mod session_id;
pub mod application_record;
pub mod page_context;
pub mod run_state;
pub mod events;

pub use session_id::{SessionIdentifier, InvalidIdentifier, MIN_IDENTIFIER_DIGITS};
pub use application_record::{
    ActivityCode, AgeFilter, ApplicationId, ApplicationRecord, ApplicationsPage, CurrentActivity,
    RawTimestamp,
};
pub use page_context::{MetaTag, PageContext, PageContextProvider};
pub use run_state::{ArchiveSummary, RunCounters};
pub use events::{CommandResponse, EventSink, InboundCommand, OutboundEvent, ProgressEvent};
