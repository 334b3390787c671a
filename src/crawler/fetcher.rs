//! Page fetchers
//!
//! A [`Fetcher`] turns a URL into a [`Document`]. Two strategies exist:
//! - `Static`: one HTTP GET per page, body parsed as HTML
//! - `Rendered`: a headless browser session kept for the whole run
//!
//! A fetcher is opened at the start of a run, used exclusively by that run,
//! and closed exactly once when the run ends.

use crate::config::{CrawlJob, FetchEngine, TimingSpec};
use crate::crawler::browser::RenderedFetcher;
use crate::crawler::document::Document;
use crate::HarvestError;
use reqwest::{Client, StatusCode, Url};

/// Desktop browser user agent sent by the static fetcher
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Page retrieval strategy for one run
#[derive(Debug)]
pub enum Fetcher {
    Static(StaticFetcher),
    Rendered(RenderedFetcher),
}

impl Fetcher {
    /// Creates the fetcher selected by `job.fetch_engine`
    ///
    /// Fails with [`HarvestError::Setup`] when the HTTP client or the browser
    /// cannot be created.
    pub async fn open(job: &CrawlJob) -> Result<Self, HarvestError> {
        match job.fetch_engine {
            FetchEngine::Static => Ok(Self::Static(StaticFetcher::open(&job.timing)?)),
            FetchEngine::Rendered => {
                let executable = job.browser_executable.as_deref();
                Ok(Self::Rendered(RenderedFetcher::open(&job.timing, executable).await?))
            }
        }
    }

    pub fn engine(&self) -> FetchEngine {
        match self {
            Self::Static(_) => FetchEngine::Static,
            Self::Rendered(_) => FetchEngine::Rendered,
        }
    }

    /// Loads `url`
    ///
    /// `ready_selector` names an element the rendered fetcher waits for
    /// before reading the DOM; the static fetcher ignores it.
    pub async fn load(&mut self, url: &str, ready_selector: Option<&str>) -> Result<Document, HarvestError> {
        match self {
            Self::Static(fetcher) => fetcher.load(url).await,
            Self::Rendered(fetcher) => fetcher.load(url, ready_selector).await,
        }
    }

    /// Releases the underlying client or browser; safe to call repeatedly
    pub async fn close(&mut self) {
        match self {
            Self::Static(fetcher) => fetcher.close(),
            Self::Rendered(fetcher) => fetcher.close().await,
        }
    }
}

/// Builds the HTTP client used by the static fetcher
///
/// The total request timeout is the job's page load timeout.
pub fn build_http_client(timing: &TimingSpec) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timing.page_load_timeout())
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetch-and-parse strategy
#[derive(Debug)]
pub struct StaticFetcher {
    client: Option<Client>,
}

impl StaticFetcher {
    pub fn open(timing: &TimingSpec) -> Result<Self, HarvestError> {
        let client = build_http_client(timing).map_err(|e| HarvestError::Setup {
            engine: FetchEngine::Static,
            message: e.to_string(),
        })?;

        Ok(Self {
            client: Some(client),
        })
    }

    /// Fetches `url` and parses the body
    ///
    /// Any status other than 200 is an error carrying the status code.
    pub async fn load(&self, url: &str) -> Result<Document, HarvestError> {
        let client = self.client.as_ref().ok_or(HarvestError::Closed)?;

        let target = Url::parse(url).map_err(|source| HarvestError::InvalidUrl {
            url: url.to_string(),
            source,
        })?;

        let response = client
            .get(target)
            .send()
            .await
            .map_err(|e| classify_error(url, e))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(HarvestError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(|e| classify_error(url, e))?;
        tracing::debug!("Fetched {} ({} bytes)", url, body.len());

        Ok(Document::parse(url, &body))
    }

    pub fn close(&mut self) {
        if self.client.take().is_some() {
            tracing::debug!("HTTP client released");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.client.is_none()
    }
}

fn classify_error(url: &str, error: reqwest::Error) -> HarvestError {
    if error.is_timeout() {
        HarvestError::Timeout {
            url: url.to_string(),
        }
    } else {
        HarvestError::Http {
            url: url.to_string(),
            source: error,
        }
    }
}
