//! Session-scoped user identifier (`werkzoekendeId`, `ikl` in portal URLs)

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Shortest digit run accepted as a session identifier.
pub const MIN_IDENTIFIER_DIGITS: usize = 8;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("'{0}' is not a session identifier (expected at least {MIN_IDENTIFIER_DIGITS} digits)")]
pub struct InvalidIdentifier(pub String);

/// Numeric identifier of the logged-in job seeker.
///
/// Only constructed through [`SessionIdentifier::parse`], so every value is an
/// all-digit string of at least [`MIN_IDENTIFIER_DIGITS`] characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SessionIdentifier(String);

impl SessionIdentifier {
    pub fn parse(raw: &str) -> Option<Self> {
        let candidate = raw.trim();
        let valid = candidate.len() >= MIN_IDENTIFIER_DIGITS
            && candidate.bytes().all(|b| b.is_ascii_digit());
        valid.then(|| Self(candidate.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for SessionIdentifier {
    type Error = InvalidIdentifier;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value).ok_or(InvalidIdentifier(value))
    }
}

impl From<SessionIdentifier> for String {
    fn from(id: SessionIdentifier) -> Self {
        id.0
    }
}

impl fmt::Display for SessionIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
