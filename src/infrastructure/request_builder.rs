//! Headers that make a request look like it came from the portal's own front end.

use reqwest::header::{
    ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE, COOKIE, HeaderMap, HeaderName, HeaderValue, REFERER,
};
use tracing::{debug, warn};

use crate::domain::PageContext;
use crate::infrastructure::config::PortalConfig;

/// Cookie the portal issues its anti-forgery token in.
pub const XSRF_COOKIE: &str = "XSRF-TOKEN";
/// Meta tag some pages render the token into instead.
pub const XSRF_META: &str = "_token";

const CLIENT_HINTS: [(&str, &str); 7] = [
    ("sec-ch-ua", r#""Not)A;Brand";v="8", "Chromium";v="138", "Brave";v="138""#),
    ("sec-ch-ua-mobile", "?0"),
    ("sec-ch-ua-platform", r#""Windows""#),
    ("sec-fetch-dest", "empty"),
    ("sec-fetch-mode", "cors"),
    ("sec-fetch-site", "same-origin"),
    ("sec-gpc", "1"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    List,
    Probe,
    /// State-mutating; carries the anti-forgery token.
    Archive,
}

impl RequestKind {
    pub const fn is_mutating(self) -> bool {
        matches!(self, Self::Archive)
    }
}

#[derive(Debug, Clone)]
pub struct SessionRequestBuilder {
    referer: String,
    monitor_key: String,
    accept_language: String,
}

impl SessionRequestBuilder {
    pub fn from_config(config: &PortalConfig) -> Self {
        Self {
            referer: config.referer.clone(),
            monitor_key: config.monitor_key.clone(),
            accept_language: config.accept_language.clone(),
        }
    }

    /// Header set for `kind`, read synchronously from `ctx`.
    pub fn headers(&self, kind: RequestKind, ctx: &PageContext) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json, text/plain, */*"));
        insert_text(&mut headers, ACCEPT_LANGUAGE, &self.accept_language);
        for (name, value) in CLIENT_HINTS {
            headers.insert(HeaderName::from_static(name), HeaderValue::from_static(value));
        }
        insert_text(&mut headers, HeaderName::from_static("vej-key-monitor"), &self.monitor_key);
        insert_text(&mut headers, REFERER, &self.referer);

        if !ctx.cookie_header.trim().is_empty() {
            insert_text(&mut headers, COOKIE, ctx.cookie_header.trim());
        }

        if kind.is_mutating() {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
            insert_text(
                &mut headers,
                HeaderName::from_static("x-xsrf-token"),
                &extract_xsrf_token(ctx),
            );
        }

        headers
    }
}

/// Anti-forgery token: `XSRF-TOKEN` cookie, then `<meta name="_token">`,
/// otherwise empty.
pub fn extract_xsrf_token(ctx: &PageContext) -> String {
    if let Some(token) = ctx.cookie(XSRF_COOKIE) {
        return token.to_string();
    }
    if let Some(token) = ctx.meta_content(XSRF_META) {
        return token.to_string();
    }
    debug!("No XSRF token in cookies or meta tags, sending empty token");
    String::new()
}

fn insert_text(headers: &mut HeaderMap, name: HeaderName, value: &str) {
    match HeaderValue::from_str(value) {
        Ok(value) => {
            headers.insert(name, value);
        }
        Err(e) => warn!("⚠️ Dropping header {}: {}", name, e),
    }
}
