//! Errors raised while talking to the VDAB portal.

use reqwest::StatusCode;
use thiserror::Error;

/// The `Display` text of each variant is what the UI shows.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PortalError {
    #[error("Authentication error ({status}). Please refresh the page and try again.")]
    Authentication { status: u16 },

    #[error("HTTP error! status: {status}")]
    Http { status: u16 },

    #[error("Request failed: {0}")]
    Transport(String),

    #[error("Unexpected response body: {0}")]
    Decode(String),

    #[error(
        "Could not extract WERKZOEKENDE_ID. Please make sure you are on the VDAB job applications page and that the page has loaded completely."
    )]
    IdentifierNotFound,
}

impl PortalError {
    /// Maps a non-success status to the authentication or plain HTTP variant.
    pub fn from_status(status: StatusCode) -> Self {
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Self::Authentication {
                status: status.as_u16(),
            },
            other => Self::Http {
                status: other.as_u16(),
            },
        }
    }

    pub const fn is_authentication(&self) -> bool {
        matches!(self, Self::Authentication { .. })
    }
}

impl From<reqwest::Error> for PortalError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_decode() {
            Self::Decode(error.to_string())
        } else if let Some(status) = error.status() {
            Self::from_status(status)
        } else {
            Self::Transport(error.to_string())
        }
    }
}
