//! Rendered fetch strategy
//!
//! Drives one headless Chrome session over CDP for the whole run. Pages are
//! visited in the same tab; after navigation the fetcher optionally waits for
//! a readiness selector, then snapshots the rendered DOM into a [`Document`].

use crate::config::{FetchEngine, TimingSpec};
use crate::crawler::document::Document;
use crate::HarvestError;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::Page;
use futures::StreamExt;
use std::path::Path;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout, Instant};

/// How often the readiness selector is polled
const READY_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Browser-backed strategy
pub struct RenderedFetcher {
    browser: Option<Browser>,
    page: Option<Page>,
    handler: Option<JoinHandle<()>>,
    /// URL the tab was last navigated to
    current_url: Option<String>,
    page_load_timeout: Duration,
    element_wait_timeout: Duration,
}

impl RenderedFetcher {
    /// Launches a headless browser and opens the working tab
    ///
    /// If the tab cannot be opened after the browser started, the browser is
    /// shut down before the setup error is returned.
    pub async fn open(timing: &TimingSpec, executable: Option<&Path>) -> Result<Self, HarvestError> {
        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .arg("--disable-dev-shm-usage")
            .arg("--disable-gpu")
            .window_size(1920, 1080)
            .request_timeout(timing.page_load_timeout());
        if let Some(path) = executable {
            builder = builder.chrome_executable(path);
        }
        let config = builder.build().map_err(setup_error)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| setup_error(e.to_string()))?;

        // The CDP connection only makes progress while its handler is polled
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!("Browser handler stopped: {}", e);
                    break;
                }
            }
        });

        let mut fetcher = Self {
            browser: Some(browser),
            page: None,
            handler: Some(handler),
            current_url: None,
            page_load_timeout: timing.page_load_timeout(),
            element_wait_timeout: timing.element_wait_timeout(),
        };

        let page = match fetcher.browser.as_ref() {
            Some(browser) => browser.new_page("about:blank").await,
            None => return Err(setup_error("browser missing after launch".to_string())),
        };

        match page {
            Ok(page) => {
                fetcher.page = Some(page);
                tracing::info!("Headless browser session started");
                Ok(fetcher)
            }
            Err(e) => {
                fetcher.close().await;
                Err(setup_error(e.to_string()))
            }
        }
    }

    /// Navigates to `url` (unless already there) and snapshots the DOM
    ///
    /// Navigation is bounded by the page load timeout. A readiness selector
    /// that never appears within the element wait timeout is not an error;
    /// whatever has rendered by then is returned.
    pub async fn load(&mut self, url: &str, ready_selector: Option<&str>) -> Result<Document, HarvestError> {
        if self.page.is_none() {
            return Err(HarvestError::Closed);
        }
        let navigate = self.begin_navigation(url);
        let page = self.page.as_ref().ok_or(HarvestError::Closed)?;

        if navigate {
            match timeout(self.page_load_timeout, page.goto(url)).await {
                Err(_) => {
                    return Err(HarvestError::Timeout {
                        url: url.to_string(),
                    })
                }
                Ok(Err(e)) => {
                    return Err(HarvestError::Browser {
                        url: url.to_string(),
                        message: e.to_string(),
                    })
                }
                Ok(Ok(_)) => {}
            }
            self.current_url = Some(url.to_string());
            tracing::debug!("Navigated to {}", url);
        }

        if let Some(selector) = ready_selector {
            wait_for_element(page, selector, self.element_wait_timeout).await;
        }

        let markup = page.content().await.map_err(|e| HarvestError::Browser {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        Ok(Document::parse(url, &markup))
    }

    /// Returns true if the tab must navigate to `url`
    ///
    /// The recorded URL is cleared first: until `goto` succeeds, the tab may
    /// hold a partially loaded page.
    fn begin_navigation(&mut self, url: &str) -> bool {
        if self.current_url.as_deref() == Some(url) {
            return false;
        }
        self.current_url = None;
        true
    }

    /// Closes the tab and the browser process; safe to call repeatedly
    pub async fn close(&mut self) {
        if let Some(page) = self.page.take() {
            if let Err(e) = page.close().await {
                tracing::warn!("Failed to close browser tab: {}", e);
            }
        }

        if let Some(mut browser) = self.browser.take() {
            if let Err(e) = browser.close().await {
                tracing::warn!("Failed to close browser: {}", e);
            }
            if let Err(e) = browser.wait().await {
                tracing::warn!("Failed to wait for browser exit: {}", e);
            }
            tracing::info!("Headless browser session closed");
        }

        if let Some(handler) = self.handler.take() {
            handler.abort();
        }

        self.current_url = None;
    }

    pub fn is_closed(&self) -> bool {
        self.browser.is_none()
    }
}

impl std::fmt::Debug for RenderedFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderedFetcher")
            .field("open", &!self.is_closed())
            .field("current_url", &self.current_url)
            .field("page_load_timeout", &self.page_load_timeout)
            .field("element_wait_timeout", &self.element_wait_timeout)
            .finish()
    }
}

impl Drop for RenderedFetcher {
    fn drop(&mut self) {
        // Reached only when the run was abandoned without close()
        let Some(mut browser) = self.browser.take() else {
            return;
        };
        let page = self.page.take();
        let handler = self.handler.take();

        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn(async move {
                    if let Some(page) = page {
                        let _ = page.close().await;
                    }
                    if let Err(e) = browser.close().await {
                        tracing::warn!("Browser cleanup on drop failed: {}", e);
                    }
                    let _ = browser.wait().await;
                    if let Some(handler) = handler {
                        handler.abort();
                    }
                });
            }
            Err(_) => {
                tracing::warn!("Browser dropped outside a runtime; process may outlive the run");
                if let Some(handler) = handler {
                    handler.abort();
                }
            }
        }
    }
}

async fn wait_for_element(page: &Page, selector: &str, wait: Duration) {
    let deadline = Instant::now() + wait;
    loop {
        if page.find_element(selector).await.is_ok() {
            return;
        }
        if Instant::now() >= deadline {
            tracing::debug!("Timed out waiting for '{}'", selector);
            return;
        }
        sleep(READY_POLL_INTERVAL).await;
    }
}

fn setup_error(message: String) -> HarvestError {
    HarvestError::Setup {
        engine: FetchEngine::Rendered,
        message,
    }
}
