//! Builds a [`PageContext`] from material exported out of the browser:
//! a saved HTML document, the `document.cookie` string and a storage dump.
//!
//! Storage dump format (either section optional):
//! ```json
//! { "localStorage": { "key": "value" }, "sessionStorage": { "key": "value" } }
//! ```

use anyhow::{Context, Result};
use scraper::{Html, Selector};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::path::PathBuf;
use tokio::fs;
use tracing::{debug, info};
use url::Url;

use crate::domain::{MetaTag, PageContext};

/// Where each part of the page context comes from.
#[derive(Debug, Clone, Default)]
pub struct PageSnapshotSources {
    pub page_url: Option<String>,
    pub html_path: Option<PathBuf>,
    pub cookie_header: Option<String>,
    pub cookie_path: Option<PathBuf>,
    pub storage_path: Option<PathBuf>,
    pub resource_urls: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
struct StorageDump {
    #[serde(default, rename = "localStorage")]
    local_storage: Map<String, Value>,
    #[serde(default, rename = "sessionStorage")]
    session_storage: Map<String, Value>,
}

impl PageSnapshotSources {
    pub async fn load(&self) -> Result<PageContext> {
        let mut ctx = PageContext::default();

        if let Some(raw_url) = &self.page_url {
            let url =
                Url::parse(raw_url).with_context(|| format!("Invalid page URL: {raw_url}"))?;
            ctx.url = Some(url);
        }

        if let Some(path) = &self.html_path {
            let html = fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read HTML snapshot {path:?}"))?;
            let (scripts, meta_tags) = parse_html_document(&html);
            info!(
                "📄 Loaded HTML snapshot: {} inline scripts, {} meta tags",
                scripts.len(),
                meta_tags.len()
            );
            ctx.inline_scripts = scripts;
            ctx.meta_tags = meta_tags;
        }

        if let Some(path) = &self.cookie_path {
            let cookies = fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read cookie file {path:?}"))?;
            ctx.cookie_header = cookies.trim().to_string();
        }
        // An explicit cookie string wins over the file
        if let Some(cookies) = &self.cookie_header {
            ctx.cookie_header = cookies.trim().to_string();
        }

        if let Some(path) = &self.storage_path {
            let raw = fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read storage dump {path:?}"))?;
            let dump: StorageDump = serde_json::from_str(&raw)
                .with_context(|| format!("Invalid storage dump {path:?}"))?;
            ctx.local_storage = flatten_storage(dump.local_storage);
            ctx.session_storage = flatten_storage(dump.session_storage);
            debug!(
                "Loaded {} localStorage and {} sessionStorage entries",
                ctx.local_storage.len(),
                ctx.session_storage.len()
            );
        }

        ctx.resource_urls.clone_from(&self.resource_urls);
        Ok(ctx)
    }
}

/// Inline script texts and named meta tags of an HTML document.
/// Scripts with a `src` attribute carry no inline text and are skipped.
pub fn parse_html_document(html: &str) -> (Vec<String>, Vec<MetaTag>) {
    let document = Html::parse_document(html);

    let scripts: Vec<String> = Selector::parse("script:not([src])")
        .map(|selector| {
            document
                .select(&selector)
                .map(|script| script.text().collect::<String>())
                .filter(|text| !text.trim().is_empty())
                .collect()
        })
        .unwrap_or_default();

    let meta_tags: Vec<MetaTag> = Selector::parse("meta[name]")
        .map(|selector| {
            document
                .select(&selector)
                .filter_map(|meta| {
                    let element = meta.value();
                    Some(MetaTag {
                        name: element.attr("name")?.to_string(),
                        content: element.attr("content").unwrap_or_default().to_string(),
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    (scripts, meta_tags)
}

/// Storage values are strings in the browser; anything else is kept as JSON text.
fn flatten_storage(entries: Map<String, Value>) -> Vec<(String, String)> {
    entries
        .into_iter()
        .map(|(key, value)| match value {
            Value::String(text) => (key, text),
            other => (key, other.to_string()),
        })
        .collect()
}
