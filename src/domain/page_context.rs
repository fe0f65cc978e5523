//! Snapshot of the browser page the archiver acts on behalf of.
//!
//! The identifier resolver and the request builder only ever read from a
//! [`PageContext`]; they never touch the network or the filesystem.

use serde::{Deserialize, Serialize};
use url::Url;

/// Host suffix every supported page lives under.
pub const PORTAL_HOST: &str = "vdab.be";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaTag {
    pub name: String,
    pub content: String,
}

/// Everything the page exposes that can carry session details.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageContext {
    /// `window.location` of the page.
    pub url: Option<Url>,
    /// Text content of every inline `<script>` element, in document order.
    #[serde(default)]
    pub inline_scripts: Vec<String>,
    #[serde(default)]
    pub meta_tags: Vec<MetaTag>,
    /// Raw `document.cookie` string (`name=value; name2=value2`).
    #[serde(default)]
    pub cookie_header: String,
    #[serde(default)]
    pub local_storage: Vec<(String, String)>,
    #[serde(default)]
    pub session_storage: Vec<(String, String)>,
    /// URLs already present in the page's resource timeline.
    #[serde(default)]
    pub resource_urls: Vec<String>,
}

impl PageContext {
    pub fn new(url: Url) -> Self {
        Self {
            url: Some(url),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_script(mut self, script: impl Into<String>) -> Self {
        self.inline_scripts.push(script.into());
        self
    }

    #[must_use]
    pub fn with_meta(mut self, name: impl Into<String>, content: impl Into<String>) -> Self {
        self.meta_tags.push(MetaTag {
            name: name.into(),
            content: content.into(),
        });
        self
    }

    #[must_use]
    pub fn with_cookie_header(mut self, cookies: impl Into<String>) -> Self {
        self.cookie_header = cookies.into();
        self
    }

    #[must_use]
    pub fn with_local_item(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.local_storage.push((key.into(), value.into()));
        self
    }

    #[must_use]
    pub fn with_session_item(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.session_storage.push((key.into(), value.into()));
        self
    }

    #[must_use]
    pub fn with_resource_url(mut self, url: impl Into<String>) -> Self {
        self.resource_urls.push(url.into());
        self
    }

    /// Cookie pairs in header order. A pair without `=` yields an empty value.
    pub fn cookies(&self) -> impl Iterator<Item = (&str, &str)> {
        self.cookie_header
            .split(';')
            .map(str::trim)
            .filter(|pair| !pair.is_empty())
            .map(|pair| pair.split_once('=').unwrap_or((pair, "")))
    }

    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies()
            .find(|(cookie_name, _)| *cookie_name == name)
            .map(|(_, value)| value)
    }

    /// `content` of the first `<meta name=...>` with the given name.
    pub fn meta_content(&self, name: &str) -> Option<&str> {
        self.meta_tags
            .iter()
            .find(|tag| tag.name == name)
            .map(|tag| tag.content.as_str())
    }

    /// Whether the page is served from the portal.
    pub fn is_on_portal(&self) -> bool {
        self.url
            .as_ref()
            .and_then(Url::host_str)
            .is_some_and(|host| host == PORTAL_HOST || host.ends_with(".vdab.be"))
    }

    /// Local storage followed by session storage.
    pub fn storage_entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.local_storage
            .iter()
            .chain(&self.session_storage)
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }
}

/// Source of the current page state.
///
/// Each call returns a fresh snapshot so cookie rotations between requests are
/// picked up.
pub trait PageContextProvider: Send + Sync {
    fn snapshot(&self) -> PageContext;
}

impl PageContextProvider for PageContext {
    fn snapshot(&self) -> PageContext {
        self.clone()
    }
}

impl PageContextProvider for std::sync::RwLock<PageContext> {
    fn snapshot(&self) -> PageContext {
        self.read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(url: &str) -> PageContext {
        PageContext::new(Url::parse(url).unwrap())
    }

    #[test]
    fn test_cookie_parsing_keeps_values_with_equals() {
        let ctx =
            page("https://www.vdab.be/").with_cookie_header(" a=1; XSRF-TOKEN=abc==; flag ;b=");
        let pairs: Vec<_> = ctx.cookies().collect();
        assert_eq!(pairs, vec![("a", "1"), ("XSRF-TOKEN", "abc=="), ("flag", ""), ("b", "")]);
        assert_eq!(ctx.cookie("XSRF-TOKEN"), Some("abc=="));
        assert_eq!(ctx.cookie("missing"), None);
    }

    #[test]
    fn test_portal_detection() {
        assert!(page("https://www.vdab.be/vindeenjob").is_on_portal());
        assert!(page("https://vdab.be/").is_on_portal());
        assert!(!page("https://example.com/?next=vdab.be").is_on_portal());
        assert!(!PageContext::default().is_on_portal());
    }

    #[test]
    fn test_storage_entries_order() {
        let ctx = PageContext::default()
            .with_session_item("s", "2")
            .with_local_item("l", "1");
        let keys: Vec<_> = ctx.storage_entries().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["l", "s"]);
    }

    #[test]
    fn test_shared_context_snapshot_sees_updates() {
        let shared = std::sync::RwLock::new(page("https://www.vdab.be/"));
        shared.write().unwrap().cookie_header = "XSRF-TOKEN=new".into();
        assert_eq!(shared.snapshot().cookie("XSRF-TOKEN"), Some("new"));
    }
}
