//! HTTP client for the VDAB portal's application endpoints
//!
//! Every call is made exactly once: the archiving loop decides what a failure
//! means, this layer only maps responses to [`PortalError`].

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use reqwest::{Client, ClientBuilder, Response};
use tracing::{debug, error, info};
use url::Url;

use crate::domain::{ApplicationId, ApplicationsPage, PageContext, SessionIdentifier};
use crate::infrastructure::config::PortalConfig;
use crate::infrastructure::portal_error::PortalError;
use crate::infrastructure::request_builder::{RequestKind, SessionRequestBuilder};

/// The three portal calls the archiver needs.
#[async_trait]
pub trait PortalApi: Send + Sync {
    /// One page of the user's active applications.
    async fn fetch_applications_page(
        &self,
        id: &SessionIdentifier,
        page_number: u32,
        ctx: &PageContext,
    ) -> Result<ApplicationsPage, PortalError>;

    /// Marks one application as archived.
    async fn archive_application(
        &self,
        application: &ApplicationId,
        ctx: &PageContext,
    ) -> Result<(), PortalError>;

    /// Minimal request proving the identifier is accepted by the portal.
    async fn probe_identifier(
        &self,
        id: &SessionIdentifier,
        ctx: &PageContext,
    ) -> Result<(), PortalError>;
}

/// reqwest-backed [`PortalApi`].
#[derive(Debug, Clone)]
pub struct PortalClient {
    client: Client,
    config: PortalConfig,
    headers: SessionRequestBuilder,
}

impl PortalClient {
    pub fn with_config(config: PortalConfig) -> Result<Self> {
        // Cookies come from the page context, never from a jar of our own
        let client = ClientBuilder::new()
            .timeout(config.request_timeout())
            .user_agent(&config.user_agent)
            .cookie_store(false)
            .gzip(true)
            .brotli(true)
            .build()
            .map_err(|e| anyhow!("Failed to create HTTP client: {}", e))?;

        Ok(Self {
            client,
            headers: SessionRequestBuilder::from_config(&config),
            config,
        })
    }

    pub fn list_url(&self, id: &SessionIdentifier, page_number: u32) -> Result<Url, PortalError> {
        let page_size = self.config.page_size.to_string();
        let page_number = page_number.to_string();
        Url::parse_with_params(
            &self.config.list_endpoint,
            [
                ("actief", "true"),
                ("werkzoekendeRol", "KLANT"),
                ("pageNumber", page_number.as_str()),
                ("listSize", page_size.as_str()),
                ("werkzoekendeId", id.as_str()),
                ("pageSize", page_size.as_str()),
            ],
        )
        .map_err(|e| PortalError::Transport(format!("invalid list endpoint: {e}")))
    }

    pub fn probe_url(&self, id: &SessionIdentifier) -> Result<Url, PortalError> {
        Url::parse_with_params(
            &self.config.probe_endpoint,
            [("pagina", "0"), ("ikl", id.as_str()), ("paginaGrootte", "1")],
        )
        .map_err(|e| PortalError::Transport(format!("invalid probe endpoint: {e}")))
    }

    pub fn archive_url(&self, application: &ApplicationId) -> Result<Url, PortalError> {
        let mut url = Url::parse(&self.config.archive_endpoint)
            .map_err(|e| PortalError::Transport(format!("invalid archive endpoint: {e}")))?;
        url.path_segments_mut()
            .map_err(|()| PortalError::Transport("archive endpoint cannot be a base".into()))?
            .pop_if_empty()
            .push(application.as_str())
            .push("archiveer");
        Ok(url)
    }

    /// Non-2xx responses become errors; 401/403 are reported as authentication failures.
    fn check_status(response: Response, what: &str) -> Result<Response, PortalError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        error!("❌ {} failed with HTTP {}", what, status);
        Err(PortalError::from_status(status))
    }
}

#[async_trait]
impl PortalApi for PortalClient {
    async fn fetch_applications_page(
        &self,
        id: &SessionIdentifier,
        page_number: u32,
        ctx: &PageContext,
    ) -> Result<ApplicationsPage, PortalError> {
        let url = self.list_url(id, page_number)?;
        info!("🌐 Fetching page {} with WERKZOEKENDE_ID: {}", page_number, id);

        let response = self
            .client
            .get(url)
            .headers(self.headers.headers(RequestKind::List, ctx))
            .send()
            .await?;
        let response = Self::check_status(response, "Listing applications")?;

        let page = response.json::<ApplicationsPage>().await?;
        debug!(
            "Page {} returned {} results (aantalPaginas={:?})",
            page_number,
            page.results.len(),
            page.page_count
        );
        Ok(page)
    }

    async fn archive_application(
        &self,
        application: &ApplicationId,
        ctx: &PageContext,
    ) -> Result<(), PortalError> {
        let url = self.archive_url(application)?;

        let response = self
            .client
            .put(url)
            .headers(self.headers.headers(RequestKind::Archive, ctx))
            .body(application.to_string())
            .send()
            .await?;
        Self::check_status(response, &format!("Archiving job {application}"))?;

        info!("🗄️ Job {} archived successfully", application);
        Ok(())
    }

    async fn probe_identifier(
        &self,
        id: &SessionIdentifier,
        ctx: &PageContext,
    ) -> Result<(), PortalError> {
        let url = self.probe_url(id)?;

        let response = self
            .client
            .get(url)
            .headers(self.headers.headers(RequestKind::Probe, ctx))
            .send()
            .await?;
        Self::check_status(response, "Validating WERKZOEKENDE_ID")?;

        info!("✅ WERKZOEKENDE_ID validation successful - can make API requests");
        Ok(())
    }
}
