//! Discovery of the session identifier from page context.
//!
//! The portal never exposes the identifier in one documented place, so it is
//! recovered from whichever surface currently carries it. Sources are tried
//! from most reliable (explicit URL) to least (free text search), and the first
//! one that yields an identifier of at least eight digits wins.

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use tracing::{debug, info, warn};

use crate::domain::{PageContext, SessionIdentifier};

/// Query parameter carrying the identifier on portal URLs.
pub const IDENTIFIER_PARAM: &str = "ikl";

static PATH_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"/(\d{8,})").expect("valid regex"));
static REQUEST_IKL: Lazy<Regex> = Lazy::new(|| Regex::new(r"ikl=(\d+)").expect("valid regex"));
static STORAGE_IKL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)ikl['":\s]*["']?(\d+)["']?"#).expect("valid regex"));
static COOKIE_IKL: Lazy<Regex> = Lazy::new(|| Regex::new(r"ikl.*?(\d+)").expect("valid regex"));
static LONG_DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d{8,}").expect("valid regex"));

/// Tried in order against every inline script.
static SCRIPT_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r#"(?i)werkzoekendeId['":\s]*["']?(\d+)["']?"#,
        r#"(?i)ikl['":\s]*["']?(\d+)["']?"#,
        r#"(?i)userId['":\s]*["']?(\d+)["']?"#,
        r#"(?i)"ikl":\s*"?(\d+)"?"#,
        r"(?i)pagina=\d+&ikl=(\d+)",
    ]
    .into_iter()
    .map(|pattern| Regex::new(pattern).expect("valid regex"))
    .collect()
});

/// Where an identifier was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiscoverySource {
    UrlQuery,
    UrlPath,
    NetworkRequests,
    InlineScripts,
    WebStorage,
    Cookies,
}

impl fmt::Display for DiscoverySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::UrlQuery => "URL parameters",
            Self::UrlPath => "URL path",
            Self::NetworkRequests => "network requests",
            Self::InlineScripts => "script content",
            Self::WebStorage => "storage",
            Self::Cookies => "cookies",
        })
    }
}

/// Inputs of one resolution: the page itself plus what the network observer saw.
#[derive(Debug, Clone, Copy)]
pub struct DiscoveryContext<'a> {
    pub page: &'a PageContext,
    pub observed_request: Option<&'a SessionIdentifier>,
}

impl<'a> DiscoveryContext<'a> {
    pub const fn new(page: &'a PageContext) -> Self {
        Self {
            page,
            observed_request: None,
        }
    }

    #[must_use]
    pub const fn with_observed(mut self, observed: Option<&'a SessionIdentifier>) -> Self {
        self.observed_request = observed;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedIdentifier {
    pub id: SessionIdentifier,
    pub source: DiscoverySource,
}

type Extractor = fn(&DiscoveryContext<'_>) -> Option<SessionIdentifier>;

/// The strategy chain, highest priority first.
const STRATEGIES: [(DiscoverySource, Extractor); 6] = [
    (DiscoverySource::UrlQuery, from_url_query),
    (DiscoverySource::UrlPath, from_url_path),
    (DiscoverySource::NetworkRequests, from_network_requests),
    (DiscoverySource::InlineScripts, from_inline_scripts),
    (DiscoverySource::WebStorage, from_web_storage),
    (DiscoverySource::Cookies, from_cookies),
];

/// Runs the strategy chain and returns the first identifier found.
pub fn resolve_identifier(ctx: &DiscoveryContext<'_>) -> Option<ResolvedIdentifier> {
    for (source, extract) in STRATEGIES {
        if let Some(id) = extract(ctx) {
            info!("🔎 Found WERKZOEKENDE_ID in {}: {}", source, id);
            return Some(ResolvedIdentifier { id, source });
        }
        debug!("No WERKZOEKENDE_ID in {}", source);
    }

    warn!("⚠️ Could not extract WERKZOEKENDE_ID dynamically, please check the page");
    None
}

/// `ikl=<digits>` inside a request URL, if long enough to be an identifier.
pub fn identifier_in_request_url(url: &str) -> Option<SessionIdentifier> {
    REQUEST_IKL
        .captures(url)
        .and_then(|caps| SessionIdentifier::parse(&caps[1]))
}

fn from_url_query(ctx: &DiscoveryContext<'_>) -> Option<SessionIdentifier> {
    let url = ctx.page.url.as_ref()?;
    url.query_pairs()
        .find(|(name, _)| name == IDENTIFIER_PARAM)
        .and_then(|(_, value)| SessionIdentifier::parse(&value))
}

fn from_url_path(ctx: &DiscoveryContext<'_>) -> Option<SessionIdentifier> {
    let url = ctx.page.url.as_ref()?;
    PATH_ID
        .captures(url.path())
        .and_then(|caps| SessionIdentifier::parse(&caps[1]))
}

fn from_network_requests(ctx: &DiscoveryContext<'_>) -> Option<SessionIdentifier> {
    ctx.observed_request.cloned().or_else(|| {
        ctx.page
            .resource_urls
            .iter()
            .find_map(|url| identifier_in_request_url(url))
    })
}

fn from_inline_scripts(ctx: &DiscoveryContext<'_>) -> Option<SessionIdentifier> {
    ctx.page.inline_scripts.iter().find_map(|script| {
        SCRIPT_PATTERNS.iter().find_map(|pattern| {
            pattern
                .captures(script)
                .and_then(|caps| SessionIdentifier::parse(&caps[1]))
        })
    })
}

fn from_web_storage(ctx: &DiscoveryContext<'_>) -> Option<SessionIdentifier> {
    ctx.page
        .storage_entries()
        .find_map(|(key, value)| match_key_value(key, value, &STORAGE_IKL))
}

fn from_cookies(ctx: &DiscoveryContext<'_>) -> Option<SessionIdentifier> {
    ctx.page
        .cookies()
        .find_map(|(name, value)| match_key_value(name, value, &COOKIE_IKL))
}

/// Shared rule for storage entries and cookies: a descriptive key yields the
/// first long digit run of its value, otherwise a value mentioning `ikl` is
/// searched with `value_pattern`.
fn match_key_value(key: &str, value: &str, value_pattern: &Regex) -> Option<SessionIdentifier> {
    let key = key.to_lowercase();
    if key.contains("werkzoekende") || key.contains("user") {
        if let Some(id) = LONG_DIGITS
            .find(value)
            .and_then(|m| SessionIdentifier::parse(m.as_str()))
        {
            return Some(id);
        }
    }

    if value.contains(IDENTIFIER_PARAM) {
        return value_pattern
            .captures(value)
            .and_then(|caps| SessionIdentifier::parse(&caps[1]));
    }

    None
}
