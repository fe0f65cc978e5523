//! Messages exchanged between the UI, the router and the archiver.
//!
//! Wire shapes use an `action` tag, e.g.
//! `{"action":"updateProgress","current":0,"total":3,"message":"..."}`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub current: u32,
    pub total: u32,
    pub message: String,
}

impl ProgressEvent {
    /// Share of pages done, 0-100. A zero total renders as 0.
    pub fn percentage(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            f64::from(self.current) / f64::from(self.total) * 100.0
        }
    }
}

/// Events flowing from the archiver to the UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum OutboundEvent {
    UpdateProgress(ProgressEvent),
    ProcessComplete { message: String },
    ProcessError { error: String },
}

impl OutboundEvent {
    pub fn error(error: impl Into<String>) -> Self {
        Self::ProcessError { error: error.into() }
    }
}

/// Commands flowing from the UI to the archiver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum InboundCommand {
    StartArchiving {
        #[serde(rename = "olderThanMonths")]
        older_than_months: u32,
    },
    StopArchiving,
    TestIdExtraction,
    GetCurrentId,
}

/// Reply to an [`InboundCommand`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum CommandResponse {
    Ack {
        success: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    Identifier {
        success: bool,
        id: Option<String>,
    },
}

impl CommandResponse {
    pub const fn ok() -> Self {
        Self::Ack { success: true, error: None }
    }

    pub fn refused(error: impl Into<String>) -> Self {
        Self::Ack {
            success: false,
            error: Some(error.into()),
        }
    }

    pub const fn is_success(&self) -> bool {
        match self {
            Self::Ack { success, .. } | Self::Identifier { success, .. } => *success,
        }
    }
}

/// Fire-and-forget delivery of archiver events. Implementations must not block
/// and silently drop events nobody listens to.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: OutboundEvent);
}
