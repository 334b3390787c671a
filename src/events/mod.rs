//! Crawl events
//!
//! The engine never prints. Everything worth surfacing during a run (pages
//! fetched, items skipped, fields that failed to evaluate) is emitted as a
//! [`CrawlEvent`] to an [`EventSink`] chosen by the caller.

mod sink;

pub use sink::{CollectingSink, EventSink, TracingSink};

use serde::Serialize;
use std::fmt;

/// What happened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// Fetcher resources were created
    RunStarted,
    /// A listing or single page was retrieved for traversal
    PageFetched,
    /// The traversed page could not be retrieved (fatal)
    PageFailed,
    /// Detail links were enumerated on a listing page
    ItemsFound,
    /// A list element had no usable link
    LinkSkipped,
    /// A detail page was extracted into a record
    ItemExtracted,
    /// A detail page failed; the run continues
    ItemFailed,
    /// A field's selector could not be evaluated
    FieldFailed,
    /// Pagination moved to the next page
    PageAdvanced,
    /// Pagination ended (no link, self link, or page limit)
    PaginationStopped,
    /// The run ended
    RunFinished,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RunStarted => "run_started",
            Self::PageFetched => "page_fetched",
            Self::PageFailed => "page_failed",
            Self::ItemsFound => "items_found",
            Self::LinkSkipped => "link_skipped",
            Self::ItemExtracted => "item_extracted",
            Self::ItemFailed => "item_failed",
            Self::FieldFailed => "field_failed",
            Self::PageAdvanced => "page_advanced",
            Self::PaginationStopped => "pagination_stopped",
            Self::RunFinished => "run_finished",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One diagnostic event: `{event, url, field, detail}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrawlEvent {
    #[serde(rename = "event")]
    pub kind: EventKind,
    pub url: Option<String>,
    pub field: Option<String>,
    pub detail: String,
}

impl CrawlEvent {
    pub fn new(kind: EventKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            url: None,
            field: None,
            detail: detail.into(),
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }
}
