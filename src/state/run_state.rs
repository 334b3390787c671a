use crate::state::RunPhase;
use crate::url::same_page;
use crate::HarvestError;

/// Why the page loop stopped following pagination
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaginationStop {
    /// Pagination absent or disabled
    Disabled,
    /// No next-page link on the page
    NoNextLink,
    /// The next-page link points back at the current page
    SelfLink,
}

impl PaginationStop {
    pub fn describe(&self) -> &'static str {
        match self {
            Self::Disabled => "pagination disabled",
            Self::NoNextLink => "no next page link",
            Self::SelfLink => "next page link points to the current page",
        }
    }
}

/// Tracks the progress of one crawl run through the page loop
///
/// The orchestrator owns one of these per run. It enforces legal phase
/// transitions and the `max_pages` bound on traversed pages.
#[derive(Debug, Clone)]
pub struct RunState {
    /// Current phase
    phase: RunPhase,

    /// Page being traversed (listing or single page)
    current_url: Option<String>,

    /// Number of times pagination advanced to a new page
    pages_visited: usize,

    /// Pages actually retrieved for traversal
    pages_fetched: usize,

    /// Upper bound on traversed pages, if any
    max_pages: Option<usize>,
}

impl RunState {
    /// Creates a run positioned at the start URL
    pub fn new(start_url: impl Into<String>, max_pages: Option<usize>) -> Self {
        Self {
            phase: RunPhase::Init,
            current_url: Some(start_url.into()),
            pages_visited: 0,
            pages_fetched: 0,
            max_pages,
        }
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    pub fn current_url(&self) -> Option<&str> {
        self.current_url.as_deref()
    }

    pub fn pages_visited(&self) -> usize {
        self.pages_visited
    }

    pub fn pages_fetched(&self) -> usize {
        self.pages_fetched
    }

    /// Counts a traversed page that was retrieved successfully
    pub fn record_fetch(&mut self) {
        self.pages_fetched += 1;
    }

    /// Moves to `next`, rejecting transitions the run graph does not allow
    pub fn transition(&mut self, next: RunPhase) -> Result<(), HarvestError> {
        if !self.phase.can_transition_to(next) {
            return Err(HarvestError::InvalidTransition {
                from: self.phase,
                to: next,
            });
        }
        tracing::trace!("run phase {} -> {}", self.phase, next);
        self.phase = next;
        Ok(())
    }

    /// Returns true if the loop should process another page
    pub fn should_continue(&self) -> bool {
        self.current_url.is_some() && !self.page_limit_reached()
    }

    /// Returns true once `max_pages` pages have been traversed
    pub fn page_limit_reached(&self) -> bool {
        self.max_pages
            .is_some_and(|limit| self.pages_visited >= limit)
    }

    /// Applies the pagination decision for the current page
    ///
    /// Advancing sets the new current URL and counts a visited page. A missing
    /// link or a link back to the current page ends pagination without
    /// touching the page count.
    pub fn advance(&mut self, next_url: Option<String>) -> Result<String, PaginationStop> {
        let next = next_url.ok_or(PaginationStop::NoNextLink)?;

        if self
            .current_url
            .as_deref()
            .is_some_and(|current| same_page(current, &next))
        {
            return Err(PaginationStop::SelfLink);
        }

        self.current_url = Some(next.clone());
        self.pages_visited += 1;
        Ok(next)
    }

    /// Ends the page loop
    pub fn stop(&mut self) {
        self.current_url = None;
    }
}
