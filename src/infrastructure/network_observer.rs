//! Passive observation of requests the page issues.
//!
//! Whatever hook the host environment offers (a proxy, a devtools protocol
//! listener, a HAR replay) only has to call
//! [`NetworkObserver::on_request_issued`]. The [`IdentifierCache`] is the
//! observer the archiver hands out: it picks `ikl=` identifiers out of the URLs
//! and keeps the identifier the archiver works with.

use serde::{Deserialize, Serialize};
use std::sync::{PoisonError, RwLock};
use tracing::{debug, info};

use crate::domain::SessionIdentifier;
use crate::infrastructure::identifier_resolver::identifier_in_request_url;

/// Receives the URL of every request the page issues. Called synchronously,
/// possibly from several threads.
pub trait NetworkObserver: Send + Sync {
    fn on_request_issued(&self, url: &str);
}

/// How identifiers seen on the network interact with a validated one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentifierPolicy {
    /// Once the probe call accepted an identifier, later sightings no longer
    /// replace it.
    #[default]
    PinAfterValidation,
    /// Every sighting replaces the cached identifier (last write wins).
    OverwriteOnSight,
}

#[derive(Debug, Default)]
struct CacheState {
    current: Option<SessionIdentifier>,
    observed: Option<SessionIdentifier>,
    pinned: bool,
}

/// In-memory home of the session identifier for one archiver.
#[derive(Debug, Default)]
pub struct IdentifierCache {
    policy: IdentifierPolicy,
    state: RwLock<CacheState>,
}

impl IdentifierCache {
    pub fn new(policy: IdentifierPolicy) -> Self {
        Self {
            policy,
            state: RwLock::default(),
        }
    }

    /// Identifier requests are currently made with.
    pub fn current(&self) -> Option<SessionIdentifier> {
        self.read(|state| state.current.clone())
    }

    /// Latest identifier seen in an outgoing request, regardless of policy.
    pub fn observed(&self) -> Option<SessionIdentifier> {
        self.read(|state| state.observed.clone())
    }

    pub fn is_pinned(&self) -> bool {
        self.read(|state| state.pinned)
    }

    /// Caches a resolved identifier unless a pinned one is already in place.
    pub fn store(&self, id: SessionIdentifier) {
        self.write(|state| {
            if !(state.pinned && self.policy == IdentifierPolicy::PinAfterValidation) {
                state.current = Some(id);
            }
        });
    }

    /// Records that `id` passed validation.
    pub fn mark_validated(&self, id: SessionIdentifier) {
        self.write(|state| {
            state.current = Some(id);
            state.pinned = self.policy == IdentifierPolicy::PinAfterValidation;
        });
    }

    fn read<T>(&self, f: impl FnOnce(&CacheState) -> T) -> T {
        f(&self.state.read().unwrap_or_else(PoisonError::into_inner))
    }

    fn write<T>(&self, f: impl FnOnce(&mut CacheState) -> T) -> T {
        f(&mut self.state.write().unwrap_or_else(PoisonError::into_inner))
    }
}

impl NetworkObserver for IdentifierCache {
    fn on_request_issued(&self, url: &str) {
        let Some(id) = identifier_in_request_url(url) else {
            return;
        };

        self.write(|state| {
            state.observed = Some(id.clone());

            if state.pinned && self.policy == IdentifierPolicy::PinAfterValidation {
                debug!("📡 Ignoring identifier {} from request, validated one is pinned", id);
                return;
            }
            if state.current.as_ref() != Some(&id) {
                info!("📡 Captured WERKZOEKENDE_ID from request: {}", id);
            }
            state.current = Some(id);
        });
    }
}
