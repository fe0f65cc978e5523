//! JobArchiver: the archiving actor of one page context
//!
//! One run at a time. A run validates the session identifier, then walks the
//! listing page by page, archiving every application older than the cutoff.
//! Progress, errors and the final summary leave through the [`EventSink`].

use chrono::Utc;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::domain::{
    AgeFilter, ApplicationRecord, ApplicationsPage, ArchiveSummary, EventSink, OutboundEvent,
    PageContext, PageContextProvider, RunCounters, SessionIdentifier,
};
use crate::infrastructure::config::ArchivingConfig;
use crate::infrastructure::identifier_resolver::{DiscoveryContext, resolve_identifier};
use crate::infrastructure::network_observer::{IdentifierCache, NetworkObserver};
use crate::infrastructure::portal_client::PortalApi;
use crate::infrastructure::portal_error::PortalError;

/// Archiver errors. `Display` is the text shown to the user.
#[derive(Debug, thiserror::Error)]
pub enum ArchiverError {
    #[error("Archiving is already running")]
    AlreadyRunning,

    #[error(
        "Could not extract or validate WERKZOEKENDE_ID. Please make sure you are on the correct VDAB page and try again."
    )]
    IdentifierValidation,

    #[error("Error processing page {page}: {source}")]
    Page {
        page: u32,
        #[source]
        source: PortalError,
    },
}

/// Result of [`JobArchiver::test_identifier`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentifierCheck {
    pub valid: bool,
    /// Identifier cached after the check, valid or not.
    pub id: Option<SessionIdentifier>,
}

#[derive(Debug)]
pub enum StartOutcome {
    Started(JoinHandle<Result<ArchiveSummary, ArchiverError>>),
    AlreadyRunning,
}

impl StartOutcome {
    pub const fn is_started(&self) -> bool {
        matches!(self, Self::Started(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ArchiverStatus {
    pub running: bool,
    pub counters: RunCounters,
}

struct ArchiverInner {
    api: Arc<dyn PortalApi>,
    page: Arc<dyn PageContextProvider>,
    events: Arc<dyn EventSink>,
    identifiers: Arc<IdentifierCache>,
    item_delay: Duration,
    running: AtomicBool,
    cancel: Mutex<Option<CancellationToken>>,
    counters: Mutex<RunCounters>,
}

/// Cheap-to-clone handle; clones share the same run state.
#[derive(Clone)]
pub struct JobArchiver {
    inner: Arc<ArchiverInner>,
}

/// Owned by the active run. Dropping it returns the archiver to idle.
struct RunGuard {
    inner: Arc<ArchiverInner>,
    token: CancellationToken,
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        *lock(&self.inner.cancel) = None;
        *lock(&self.inner.counters) = RunCounters::default();
        self.inner.running.store(false, Ordering::Release);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl JobArchiver {
    pub fn new(
        api: Arc<dyn PortalApi>,
        page: Arc<dyn PageContextProvider>,
        events: Arc<dyn EventSink>,
        config: &ArchivingConfig,
    ) -> Self {
        Self {
            inner: Arc::new(ArchiverInner {
                api,
                page,
                events,
                identifiers: Arc::new(IdentifierCache::new(config.identifier_policy)),
                item_delay: config.item_delay(),
                running: AtomicBool::new(false),
                cancel: Mutex::new(None),
                counters: Mutex::new(RunCounters::default()),
            }),
        }
    }

    /// Observer to hand to whatever sees the page's outgoing requests.
    pub fn network_observer(&self) -> Arc<dyn NetworkObserver> {
        self.inner.identifiers.clone()
    }

    pub fn is_running(&self) -> bool {
        self.inner.running.load(Ordering::Acquire)
    }

    pub fn status(&self) -> ArchiverStatus {
        ArchiverStatus {
            running: self.is_running(),
            counters: *lock(&self.inner.counters),
        }
    }

    /// Cached identifier, otherwise a fresh resolution from the page.
    /// Does not cache what it resolves.
    pub fn current_identifier(&self) -> Option<SessionIdentifier> {
        self.inner
            .identifiers
            .current()
            .or_else(|| self.resolve_from(&self.inner.page.snapshot()))
    }

    /// Resolves the identifier if needed and probes the portal with it.
    /// A successful probe caches the identifier.
    pub async fn test_identifier(&self) -> IdentifierCheck {
        let ctx = self.inner.page.snapshot();
        let Some(id) = self.inner.identifiers.current().or_else(|| self.resolve_from(&ctx)) else {
            error!("❌ Could not extract WERKZOEKENDE_ID");
            return IdentifierCheck { valid: false, id: None };
        };
        info!("✅ Successfully extracted WERKZOEKENDE_ID: {}", id);

        let valid = match self.inner.api.probe_identifier(&id, &ctx).await {
            Ok(()) => {
                self.inner.identifiers.mark_validated(id);
                true
            }
            Err(e) if e.is_authentication() => {
                warn!("🔒 Portal refused the session for WERKZOEKENDE_ID {}: {}", id, e);
                false
            }
            Err(e) => {
                warn!("⚠️ WERKZOEKENDE_ID extracted but API request failed: {}", e);
                false
            }
        };

        IdentifierCheck {
            valid,
            id: self.inner.identifiers.current(),
        }
    }

    /// Starts a run in the background. No-op while a run is active.
    pub fn start(&self, older_than_months: u32) -> StartOutcome {
        let Ok(guard) = self.acquire() else {
            debug!("Start ignored, a run is already active");
            return StartOutcome::AlreadyRunning;
        };

        let archiver = self.clone();
        StartOutcome::Started(tokio::spawn(async move {
            archiver.execute(older_than_months, guard).await
        }))
    }

    /// Runs to completion on the current task.
    pub async fn run(&self, older_than_months: u32) -> Result<ArchiveSummary, ArchiverError> {
        let guard = self.acquire()?;
        self.execute(older_than_months, guard).await
    }

    /// Asks the active run to stop before its next page fetch or archive call.
    /// Returns whether a run was active.
    pub fn stop(&self) -> bool {
        match lock(&self.inner.cancel).as_ref() {
            Some(token) => {
                info!("🛑 Stop requested");
                token.cancel();
                true
            }
            None => false,
        }
    }

    fn acquire(&self) -> Result<RunGuard, ArchiverError> {
        self.inner
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| ArchiverError::AlreadyRunning)?;

        let token = CancellationToken::new();
        *lock(&self.inner.cancel) = Some(token.clone());
        Ok(RunGuard {
            inner: Arc::clone(&self.inner),
            token,
        })
    }

    async fn execute(
        &self,
        older_than_months: u32,
        guard: RunGuard,
    ) -> Result<ArchiveSummary, ArchiverError> {
        let run_id = Uuid::new_v4();
        info!(
            "🚀 Archive run {} started for jobs older than {} months",
            run_id, older_than_months
        );

        if !self.test_identifier().await.valid {
            let error = ArchiverError::IdentifierValidation;
            self.emit(OutboundEvent::error(error.to_string()));
            return Err(error);
        }

        let filter = AgeFilter::months_before(Utc::now(), older_than_months);
        debug!("Cutoff for run {}: {}", run_id, filter.cutoff());

        let mut counters = RunCounters::default();
        let mut failure = None;

        while counters.has_more_pages() && !guard.token.is_cancelled() {
            self.emit(OutboundEvent::UpdateProgress(counters.progress_event()));

            let ctx = self.inner.page.snapshot();
            let page = match self.fetch_page(counters.current_page, &ctx).await {
                Ok(page) => page,
                Err(source) => {
                    let error = ArchiverError::Page {
                        page: counters.current_page,
                        source,
                    };
                    error!("❌ {}", error);
                    self.emit(OutboundEvent::error(error.to_string()));
                    failure = Some(error);
                    break;
                }
            };

            if counters.total_pages.is_none() {
                info!("📚 Total pages to process: {}", page.total_pages());
            }
            counters.fix_total_pages(page.total_pages());

            if page.results.is_empty() {
                info!("📭 Page {} is empty, stopping", counters.current_page);
                break;
            }

            let old: Vec<&ApplicationRecord> =
                page.results.iter().filter(|r| filter.is_old(r)).collect();
            counters.record_page(count(page.results.len()), count(old.len()));
            self.publish(&counters);
            debug!(
                "Page {}: {} applications, {} older than cutoff",
                counters.current_page,
                page.results.len(),
                old.len()
            );

            for record in old {
                if guard.token.is_cancelled() {
                    break;
                }
                let Some(id) = &record.id else {
                    warn!("⚠️ Skipping old application without id");
                    continue;
                };

                match self.inner.api.archive_application(id, &ctx).await {
                    Ok(()) => {
                        counters.record_archived();
                        self.publish(&counters);
                    }
                    Err(e) => error!("❌ Error archiving job {}: {}", id, e),
                }

                tokio::time::sleep(self.inner.item_delay).await;
            }

            counters.advance_page();
            self.publish(&counters);
        }

        let summary = counters.summary(guard.token.is_cancelled());
        info!("🏁 Archive run {} finished: {}", run_id, summary);
        self.emit(OutboundEvent::ProcessComplete {
            message: summary.to_string(),
        });

        match failure {
            Some(error) => Err(error),
            None => Ok(summary),
        }
    }

    async fn fetch_page(
        &self,
        page_number: u32,
        ctx: &PageContext,
    ) -> Result<ApplicationsPage, PortalError> {
        let id = self.session_identifier(ctx).ok_or(PortalError::IdentifierNotFound)?;
        self.inner.api.fetch_applications_page(&id, page_number, ctx).await
    }

    /// Identifier for the next request, read again for every page so that a
    /// changed session is picked up when the policy allows it.
    fn session_identifier(&self, ctx: &PageContext) -> Option<SessionIdentifier> {
        if let Some(id) = self.inner.identifiers.current() {
            return Some(id);
        }
        let id = self.resolve_from(ctx)?;
        self.inner.identifiers.store(id.clone());
        Some(id)
    }

    fn resolve_from(&self, ctx: &PageContext) -> Option<SessionIdentifier> {
        let observed = self.inner.identifiers.observed();
        resolve_identifier(&DiscoveryContext::new(ctx).with_observed(observed.as_ref()))
            .map(|found| found.id)
    }

    fn publish(&self, counters: &RunCounters) {
        *lock(&self.inner.counters) = *counters;
    }

    fn emit(&self, event: OutboundEvent) {
        self.inner.events.emit(event);
    }
}

fn count(len: usize) -> u32 {
    u32::try_from(len).unwrap_or(u32::MAX)
}
