//! Phase definitions for a single crawl run
//!
//! A run moves `Init → FetchPage → (EnumerateItems → ExtractEach | ExtractPage)
//! → ResolveNext → (FetchPage | Done)`, and may drop into `Failed` from any
//! non-terminal phase.

use std::fmt;

/// Represents the current phase of a crawl run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunPhase {
    // ===== Setup =====
    /// Fetcher is being created
    Init,

    // ===== Page loop =====
    /// Retrieving the page currently being traversed
    FetchPage,

    /// List mode: collecting detail links from the page
    EnumerateItems,

    /// List mode: visiting each detail page in turn
    ExtractEach,

    /// Single-page mode: extracting the page itself
    ExtractPage,

    /// Deciding whether to follow pagination
    ResolveNext,

    // ===== Terminal =====
    /// Loop finished normally
    Done,

    /// Run aborted
    Failed,
}

impl RunPhase {
    /// Returns true if the run cannot leave this phase
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    /// Returns true if `next` is a legal successor of this phase
    pub fn can_transition_to(&self, next: RunPhase) -> bool {
        use RunPhase::*;

        if next == Failed {
            return !self.is_terminal();
        }

        matches!(
            (self, next),
            (Init, FetchPage)
                | (FetchPage, EnumerateItems)
                | (FetchPage, ExtractPage)
                | (EnumerateItems, ExtractEach)
                | (ExtractEach, ResolveNext)
                | (ExtractPage, ResolveNext)
                | (ResolveNext, FetchPage)
                | (ResolveNext, Done)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::FetchPage => "fetch_page",
            Self::EnumerateItems => "enumerate_items",
            Self::ExtractEach => "extract_each",
            Self::ExtractPage => "extract_page",
            Self::ResolveNext => "resolve_next",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }

    /// Returns all phases
    pub fn all_phases() -> Vec<Self> {
        vec![
            Self::Init,
            Self::FetchPage,
            Self::EnumerateItems,
            Self::ExtractEach,
            Self::ExtractPage,
            Self::ResolveNext,
            Self::Done,
            Self::Failed,
        ]
    }
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
