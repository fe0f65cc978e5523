//! Counters of one archiving run and the summary reported when it ends.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::events::ProgressEvent;

/// Mutable counters of the active run.
///
/// `current_page` only moves once a page has been fully filtered and archived;
/// `total_pages` is taken from the first page and never revised.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunCounters {
    pub total_seen: u32,
    pub total_old: u32,
    pub total_archived: u32,
    pub current_page: u32,
    pub total_pages: Option<u32>,
}

impl RunCounters {
    /// Fixes the page count. Later calls are ignored.
    pub fn fix_total_pages(&mut self, total_pages: u32) {
        if self.total_pages.is_none() {
            self.total_pages = Some(total_pages);
        }
    }

    pub const fn has_more_pages(&self) -> bool {
        match self.total_pages {
            Some(total) => self.current_page < total,
            None => true,
        }
    }

    pub const fn record_page(&mut self, seen: u32, old: u32) {
        self.total_seen += seen;
        self.total_old += old;
    }

    pub const fn record_archived(&mut self) {
        self.total_archived += 1;
    }

    pub const fn advance_page(&mut self) {
        self.current_page += 1;
    }

    /// Progress message announcing the page about to be fetched.
    pub fn progress_event(&self) -> ProgressEvent {
        let page_label = self.current_page + 1;
        let message = match self.total_pages {
            Some(total) => format!("Processing page {page_label} of {total}..."),
            None => format!("Processing page {page_label}..."),
        };
        ProgressEvent {
            current: self.current_page,
            total: self.total_pages.unwrap_or(1),
            message,
        }
    }

    pub const fn summary(&self, stopped: bool) -> ArchiveSummary {
        ArchiveSummary {
            processed: self.total_seen,
            old: self.total_old,
            archived: self.total_archived,
            stopped,
        }
    }
}

/// Outcome of a finished or stopped run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveSummary {
    pub processed: u32,
    pub old: u32,
    pub archived: u32,
    pub stopped: bool,
}

impl fmt::Display for ArchiveSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lead = if self.stopped { "Process stopped." } else { "Process completed!" };
        write!(
            f,
            "{lead} Processed {} jobs, found {} old jobs, archived {}.",
            self.processed, self.old, self.archived
        )
    }
}
