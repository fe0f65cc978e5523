use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::infrastructure::PageSnapshotSources;

/// CLI entry point
#[derive(Parser, Debug)]
#[command(name = "vdab-job-archiver", version)]
#[command(
    about = "Archives stale job applications on the VDAB portal from an authenticated browser session"
)]
pub struct Cli {
    /// Configuration file (defaults to the user config directory). The
    /// preference file is kept in the same directory.
    #[arg(long, global = true, env = "VDAB_ARCHIVER_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Archive every application older than the cutoff. Ctrl-C stops after the current request.
    Archive(ArchiveArgs),
    /// Show the session identifier found in the page context
    ResolveId(PageArgs),
    /// Resolve the session identifier and check that the portal accepts it
    TestId(PageArgs),
    /// Show or change the stored cutoff
    Prefs(PrefsArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ArchiveArgs {
    /// Archive applications older than this many months (stored for next time)
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub older_than: Option<u32>,

    #[command(flatten)]
    pub page: PageArgs,
}

#[derive(Args, Debug, Clone)]
pub struct PrefsArgs {
    /// New cutoff in months
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub older_than: Option<u32>,
}

/// Where the page context is read from.
#[derive(Args, Debug, Clone, Default)]
pub struct PageArgs {
    /// URL of the portal page the session is on
    #[arg(long, env = "VDAB_PAGE_URL")]
    pub page_url: Option<String>,

    /// Saved HTML of that page (inline scripts and meta tags)
    #[arg(long)]
    pub html: Option<PathBuf>,

    /// The page's cookie string, as in `document.cookie`
    #[arg(long, env = "VDAB_COOKIES", hide_env_values = true)]
    pub cookies: Option<String>,

    /// File holding the cookie string
    #[arg(long)]
    pub cookie_file: Option<PathBuf>,

    /// JSON dump of `localStorage` and `sessionStorage`
    #[arg(long)]
    pub storage: Option<PathBuf>,

    /// URL of a resource the page already loaded (repeatable)
    #[arg(long = "resource-url")]
    pub resource_urls: Vec<String>,

    /// URL of a request the page issued after loading (repeatable)
    #[arg(long = "observed-request")]
    pub observed_requests: Vec<String>,
}

impl PageArgs {
    pub fn snapshot_sources(&self) -> PageSnapshotSources {
        PageSnapshotSources {
            page_url: self.page_url.clone(),
            html_path: self.html.clone(),
            cookie_header: self.cookies.clone(),
            cookie_path: self.cookie_file.clone(),
            storage_path: self.storage.clone(),
            resource_urls: self.resource_urls.clone(),
        }
    }
}
