//! Engine entry points for callers
//!
//! A [`HarvestEngine`] is an explicit value built by whoever embeds the
//! crawler (CLI, HTTP handler, test). It holds the event sink and exposes the
//! three operations callers need: submit a job, validate a job, and list the
//! supported fetch engines.

use crate::config::{validate, CrawlJob, CrawlOutcome, FetchEngine, ValidationReport};
use crate::crawler::run_crawl;
use crate::events::{EventSink, TracingSink};
use crate::ConfigError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Fetch engines offered by this build
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineCatalog {
    pub engines: Vec<FetchEngine>,
    pub default: FetchEngine,
}

/// Crawl engine handle
///
/// Cheap to clone; clones share the sink. Each `submit` call is an
/// independent run with its own fetcher, so runs may execute concurrently.
#[derive(Clone)]
pub struct HarvestEngine {
    sink: Arc<dyn EventSink>,
}

impl HarvestEngine {
    /// Engine reporting events through `tracing`
    pub fn new() -> Self {
        Self::with_sink(Arc::new(TracingSink))
    }

    /// Engine reporting events to a caller-provided sink
    pub fn with_sink(sink: Arc<dyn EventSink>) -> Self {
        Self { sink }
    }

    /// Validates and runs a job
    ///
    /// An invalid job is not executed: the outcome is unsuccessful and lists
    /// the validation errors. This never returns an error; every failure is
    /// reported inside the outcome.
    pub async fn submit(&self, job: &CrawlJob) -> CrawlOutcome {
        let report = validate(job);
        for warning in &report.warnings {
            tracing::warn!("{}", warning);
        }

        if !report.valid {
            tracing::error!("Rejected job for {}: {} error(s)", job.start_url, report.errors.len());
            let errors = report
                .errors
                .into_iter()
                .map(|error| ConfigError::Validation(error).to_string());
            return CrawlOutcome::rejected(job.context.clone(), errors);
        }

        tracing::info!("Starting {} crawl of {}", job.fetch_engine, job.start_url);
        run_crawl(job, self.sink.as_ref()).await
    }

    /// Checks a job without running it
    pub fn validate(&self, job: &CrawlJob) -> ValidationReport {
        validate(job)
    }

    /// Supported fetch engines and the default one
    pub fn engines(&self) -> EngineCatalog {
        EngineCatalog {
            engines: FetchEngine::all(),
            default: FetchEngine::default(),
        }
    }
}

impl Default for HarvestEngine {
    fn default() -> Self {
        Self::new()
    }
}
