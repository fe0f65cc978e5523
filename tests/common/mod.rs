//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use url::Url;

use vdab_job_archiver_lib::domain::{
    ApplicationId, ApplicationsPage, PageContext, SessionIdentifier,
};
use vdab_job_archiver_lib::infrastructure::{PortalApi, PortalError};

pub const SESSION_ID: &str = "20242024";

/// Portal fake fed with raw listing JSON, the way the endpoint answers.
#[derive(Default)]
pub struct FakePortal {
    pages: Mutex<HashMap<u32, Value>>,
    archive_status: Mutex<HashMap<String, u16>>,
    probe_status: Mutex<Option<u16>>,
    pub fetched: Mutex<Vec<(String, u32)>>,
    pub archived: Mutex<Vec<String>>,
}

impl FakePortal {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn page(&self, number: u32, body: Value) -> &Self {
        self.pages.lock().unwrap().insert(number, body);
        self
    }

    pub fn archive_fails(&self, id: &str, status: u16) -> &Self {
        self.archive_status.lock().unwrap().insert(id.to_string(), status);
        self
    }

    pub fn probe_fails(&self, status: u16) -> &Self {
        *self.probe_status.lock().unwrap() = Some(status);
        self
    }

    pub fn fetched_pages(&self) -> Vec<u32> {
        self.fetched.lock().unwrap().iter().map(|(_, page)| *page).collect()
    }

    pub fn archived_ids(&self) -> Vec<String> {
        self.archived.lock().unwrap().clone()
    }
}

#[async_trait]
impl PortalApi for FakePortal {
    async fn fetch_applications_page(
        &self,
        id: &SessionIdentifier,
        page_number: u32,
        _ctx: &PageContext,
    ) -> Result<ApplicationsPage, PortalError> {
        self.fetched.lock().unwrap().push((id.to_string(), page_number));
        let body = self
            .pages
            .lock()
            .unwrap()
            .get(&page_number)
            .cloned()
            .unwrap_or_else(|| json!({ "results": [] }));
        serde_json::from_value(body).map_err(|e| PortalError::Decode(e.to_string()))
    }

    async fn archive_application(
        &self,
        application: &ApplicationId,
        _ctx: &PageContext,
    ) -> Result<(), PortalError> {
        self.archived.lock().unwrap().push(application.to_string());
        match self.archive_status.lock().unwrap().get(application.as_str()) {
            Some(&status) => Err(PortalError::Http { status }),
            None => Ok(()),
        }
    }

    async fn probe_identifier(
        &self,
        _id: &SessionIdentifier,
        _ctx: &PageContext,
    ) -> Result<(), PortalError> {
        match *self.probe_status.lock().unwrap() {
            Some(401 | 403) => Err(PortalError::Authentication { status: 401 }),
            Some(status) => Err(PortalError::Http { status }),
            None => Ok(()),
        }
    }
}

/// Application page of the portal whose identifier is only in an inline script.
pub fn applications_page() -> PageContext {
    let url =
        Url::parse("https://www.vdab.be/vindeenjob/prive/bewaarde-vacatures-en-sollicitaties")
            .unwrap();
    PageContext::new(url)
        .with_script(format!(r#"window.__STATE__ = {{ "werkzoekendeId": "{SESSION_ID}" }};"#))
        .with_cookie_header("XSRF-TOKEN=token-1; JSESSIONID=abc")
}
