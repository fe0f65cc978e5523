//! Test utilities for the archiver
//!
//! A scripted [`PortalApi`] that records every call, an [`EventSink`] that keeps
//! every event, and record/page builders shared by the unit tests.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use url::Url;

use crate::domain::{
    ApplicationId, ApplicationRecord, ApplicationsPage, EventSink, OutboundEvent, PageContext,
    RawTimestamp, SessionIdentifier,
};
use crate::infrastructure::{PortalApi, PortalError};

/// Identifier carried by [`portal_page`].
pub const TEST_ID: &str = "12345678";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PortalCall {
    Probe(String),
    Fetch { id: String, page: u32 },
    Archive(String),
}

type FetchHook = Box<dyn Fn(u32) + Send + Sync>;

/// Portal fake answering from a script. Pages that were not scripted come back
/// empty.
#[derive(Default)]
pub struct ScriptedPortal {
    pages: Mutex<HashMap<u32, Result<ApplicationsPage, PortalError>>>,
    failing_archives: Mutex<HashSet<String>>,
    probe_error: Mutex<Option<PortalError>>,
    calls: Mutex<Vec<PortalCall>>,
    on_fetch: Mutex<Option<FetchHook>>,
}

impl ScriptedPortal {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_page(&self, number: u32, page: ApplicationsPage) -> &Self {
        self.pages.lock().unwrap().insert(number, Ok(page));
        self
    }

    pub fn with_page_error(&self, number: u32, error: PortalError) -> &Self {
        self.pages.lock().unwrap().insert(number, Err(error));
        self
    }

    /// Archiving `id` answers HTTP 500.
    pub fn failing_archive(&self, id: &str) -> &Self {
        self.failing_archives.lock().unwrap().insert(id.to_string());
        self
    }

    pub fn with_probe_error(&self, error: PortalError) -> &Self {
        *self.probe_error.lock().unwrap() = Some(error);
        self
    }

    /// Runs `hook` with the page number right before a page is answered.
    pub fn on_fetch(&self, hook: impl Fn(u32) + Send + Sync + 'static) -> &Self {
        *self.on_fetch.lock().unwrap() = Some(Box::new(hook));
        self
    }

    pub fn calls(&self) -> Vec<PortalCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn fetched_pages(&self) -> Vec<u32> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                PortalCall::Fetch { page, .. } => Some(page),
                _ => None,
            })
            .collect()
    }

    pub fn archived(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                PortalCall::Archive(id) => Some(id),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: PortalCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl PortalApi for ScriptedPortal {
    async fn fetch_applications_page(
        &self,
        id: &SessionIdentifier,
        page_number: u32,
        _ctx: &PageContext,
    ) -> Result<ApplicationsPage, PortalError> {
        self.record(PortalCall::Fetch {
            id: id.to_string(),
            page: page_number,
        });
        if let Some(hook) = self.on_fetch.lock().unwrap().as_ref() {
            hook(page_number);
        }
        self.pages
            .lock()
            .unwrap()
            .get(&page_number)
            .cloned()
            .unwrap_or_else(|| Ok(ApplicationsPage::default()))
    }

    async fn archive_application(
        &self,
        application: &ApplicationId,
        _ctx: &PageContext,
    ) -> Result<(), PortalError> {
        self.record(PortalCall::Archive(application.to_string()));
        if self.failing_archives.lock().unwrap().contains(application.as_str()) {
            return Err(PortalError::Http { status: 500 });
        }
        Ok(())
    }

    async fn probe_identifier(
        &self,
        id: &SessionIdentifier,
        _ctx: &PageContext,
    ) -> Result<(), PortalError> {
        self.record(PortalCall::Probe(id.to_string()));
        match self.probe_error.lock().unwrap().clone() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

/// Keeps every emitted event in order.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<OutboundEvent>>,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<OutboundEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                OutboundEvent::ProcessError { error } => Some(error),
                _ => None,
            })
            .collect()
    }

    pub fn completions(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                OutboundEvent::ProcessComplete { message } => Some(message),
                _ => None,
            })
            .collect()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: OutboundEvent) {
        self.events.lock().unwrap().push(event);
    }
}

/// Page on the portal with [`TEST_ID`] in its query.
pub fn portal_page() -> PageContext {
    let url = format!("https://www.vdab.be/vindeenjob/prive?ikl={TEST_ID}");
    PageContext::new(Url::parse(&url).unwrap())
}

/// Record last changed well before any realistic cutoff.
pub fn old_record(id: &str) -> ApplicationRecord {
    dated_record(id, "2001-02-03T04:05:06Z")
}

/// Record dated far in the future, never old.
pub fn fresh_record(id: &str) -> ApplicationRecord {
    dated_record(id, "2999-01-01T00:00:00Z")
}

pub fn undated_record(id: &str) -> ApplicationRecord {
    ApplicationRecord {
        id: Some(ApplicationId::new(id)),
        ..ApplicationRecord::default()
    }
}

fn dated_record(id: &str, timestamp: &str) -> ApplicationRecord {
    ApplicationRecord {
        id: Some(ApplicationId::new(id)),
        last_changed: Some(RawTimestamp::Text(timestamp.to_string())),
        current_activity: None,
    }
}

pub fn applications(results: Vec<ApplicationRecord>, page_count: u32) -> ApplicationsPage {
    ApplicationsPage {
        results,
        page_count: Some(page_count),
    }
}
