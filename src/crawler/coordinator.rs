//! Crawl coordinator - main crawl orchestration logic
//!
//! This module contains the page loop that drives one crawl run:
//! - Opening the fetcher for the job's engine
//! - Fetching the page currently being traversed
//! - List mode: enumerating and visiting detail pages one at a time
//! - Single-page mode: extracting the page itself
//! - Following pagination within the `max_pages` bound
//! - Releasing the fetcher and assembling the outcome

use crate::config::{CrawlJob, CrawlOutcome, CrawlRecord};
use crate::crawler::extractor::extract_record;
use crate::crawler::fetcher::Fetcher;
use crate::crawler::navigation::{list_items, next_page_url};
use crate::events::{CrawlEvent, EventKind, EventSink};
use crate::state::{PaginationStop, RunPhase, RunState};
use crate::HarvestError;
use std::time::Duration;

/// Drives one crawl job to completion
pub struct Coordinator<'a> {
    job: &'a CrawlJob,
    sink: &'a dyn EventSink,
}

impl<'a> Coordinator<'a> {
    /// Creates a coordinator for `job`, reporting events to `sink`
    pub fn new(job: &'a CrawlJob, sink: &'a dyn EventSink) -> Self {
        Self { job, sink }
    }

    /// Runs the job and returns its outcome
    ///
    /// Never fails: setup errors, the fatal fetch of a traversed page and
    /// per-item errors all end up in `CrawlOutcome::errors`. Records gathered
    /// before a failure are kept. The fetcher is closed exactly once on every
    /// path that opened it.
    pub async fn run(&self) -> CrawlOutcome {
        let job = self.job;
        let mut outcome = CrawlOutcome::new(job.context.clone());
        let page_limit = job
            .pagination
            .as_ref()
            .filter(|p| p.enabled)
            .and_then(|p| p.page_limit());
        let mut state = RunState::new(job.start_url.clone(), page_limit);

        let mut fetcher = match Fetcher::open(job).await {
            Ok(fetcher) => fetcher,
            Err(e) => {
                let _ = state.transition(RunPhase::Failed);
                outcome.push_error(format!("Crawl setup failed: {}", e));
                self.emit(CrawlEvent::new(EventKind::RunFinished, e.to_string()).with_url(&job.start_url));
                return outcome;
            }
        };

        self.emit(
            CrawlEvent::new(
                EventKind::RunStarted,
                format!("{} fetcher ready", fetcher.engine()),
            )
            .with_url(&job.start_url),
        );

        let result = self.traverse(&mut fetcher, &mut state, &mut outcome).await;
        fetcher.close().await;

        match result {
            Ok(()) => outcome.success = true,
            Err(e) => {
                let _ = state.transition(RunPhase::Failed);
                outcome.push_error(format!("Crawl failed: {}", e));
            }
        }
        outcome.total_items = outcome.records.len();

        self.emit(CrawlEvent::new(
            EventKind::RunFinished,
            format!(
                "{} after {} page(s): {} records, {} errors",
                state.phase(),
                state.pages_fetched(),
                outcome.total_items,
                outcome.errors.len()
            ),
        ));

        outcome
    }

    /// The page loop
    async fn traverse(
        &self,
        fetcher: &mut Fetcher,
        state: &mut RunState,
        outcome: &mut CrawlOutcome,
    ) -> Result<(), HarvestError> {
        let job = self.job;
        let pagination = job.pagination.as_ref().filter(|p| p.enabled);
        let ready_selector = job
            .navigation
            .as_ref()
            .map(|n| n.list_item_expression.as_str());

        while state.should_continue() {
            let Some(current) = state.current_url().map(str::to_string) else {
                break;
            };

            state.transition(RunPhase::FetchPage)?;
            if state.pages_visited() > 0 {
                self.pause().await;
            }

            // The document is confined to this block so it never lives across an await
            let (detail_urls, next_url) = {
                let document = match fetcher.load(&current, ready_selector).await {
                    Ok(document) => document,
                    Err(e) => {
                        self.emit(CrawlEvent::new(EventKind::PageFailed, e.to_string()).with_url(&current));
                        return Err(e);
                    }
                };
                state.record_fetch();
                self.emit(CrawlEvent::new(
                    EventKind::PageFetched,
                    format!("page {}", state.pages_fetched()),
                )
                .with_url(&current));

                let detail_urls = match &job.navigation {
                    Some(navigation) => {
                        state.transition(RunPhase::EnumerateItems)?;
                        Some(list_items(&document, &current, Some(navigation), self.sink))
                    }
                    None => {
                        state.transition(RunPhase::ExtractPage)?;
                        outcome.push_record(extract_record(&document, &job.fields, self.sink));
                        None
                    }
                };

                // Resolved from the listing page before any detail visit moves the session
                let next_url = next_page_url(&document, &current, pagination, self.sink);
                (detail_urls, next_url)
            };

            if let Some(urls) = detail_urls {
                state.transition(RunPhase::ExtractEach)?;
                self.visit_items(fetcher, &urls, outcome).await;
            }

            state.transition(RunPhase::ResolveNext)?;
            let decision = match pagination {
                Some(_) => state.advance(next_url),
                None => Err(PaginationStop::Disabled),
            };

            match decision {
                Ok(next) => {
                    self.emit(
                        CrawlEvent::new(
                            EventKind::PageAdvanced,
                            format!("page {}", state.pages_visited() + 1),
                        )
                        .with_url(next),
                    );
                }
                Err(reason) => {
                    self.emit(
                        CrawlEvent::new(EventKind::PaginationStopped, reason.describe()).with_url(&current),
                    );
                    state.stop();
                }
            }
        }

        // Stopped by max_pages: the resolved next page was never fetched
        if state.page_limit_reached() {
            if let Some(unfollowed) = state.current_url() {
                self.emit(
                    CrawlEvent::new(
                        EventKind::PaginationStopped,
                        format!("page limit of {} reached", state.pages_fetched()),
                    )
                    .with_url(unfollowed),
                );
                outcome.next_page_url = Some(unfollowed.to_string());
            }
        }

        state.transition(RunPhase::Done)
    }

    /// Visits detail pages one at a time; a failing item never stops the rest
    async fn visit_items(&self, fetcher: &mut Fetcher, urls: &[String], outcome: &mut CrawlOutcome) {
        for (index, item_url) in urls.iter().enumerate() {
            if index > 0 {
                self.pause().await;
            }

            match self.extract_item(fetcher, item_url).await {
                Ok(record) => {
                    self.emit(
                        CrawlEvent::new(
                            EventKind::ItemExtracted,
                            format!("{} field(s)", record.len()),
                        )
                        .with_url(item_url),
                    );
                    outcome.push_record(record);
                }
                Err(e) => {
                    let message = format!("Error extracting from {}: {}", item_url, e);
                    self.emit(CrawlEvent::new(EventKind::ItemFailed, &message).with_url(item_url));
                    outcome.push_error(message);
                }
            }
        }
    }

    async fn extract_item(&self, fetcher: &mut Fetcher, url: &str) -> Result<CrawlRecord, HarvestError> {
        let document = fetcher.load(url, None).await?;
        Ok(extract_record(&document, &self.job.fields, self.sink))
    }

    /// Inter-request delay
    async fn pause(&self) {
        let delay: Duration = self.job.timing.inter_request_delay();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    fn emit(&self, event: CrawlEvent) {
        self.sink.emit(&event);
    }
}

/// Runs a crawl job with the given event sink
///
/// The job is not validated here; [`crate::service::HarvestEngine::submit`]
/// validates before calling this.
///
/// # Example
///
/// ```no_run
/// use sumi_harvest::config::load_job;
/// use sumi_harvest::crawler::run_crawl;
/// use sumi_harvest::events::TracingSink;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let job = load_job(Path::new("job.json"))?;
/// let outcome = run_crawl(&job, &TracingSink).await;
/// println!("{} records", outcome.total_items);
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(job: &CrawlJob, sink: &dyn EventSink) -> CrawlOutcome {
    Coordinator::new(job, sink).run().await
}
