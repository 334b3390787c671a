use crate::events::{CrawlEvent, EventKind};
use std::sync::Mutex;

/// Receiver for crawl events
///
/// Sinks are shared between concurrent runs, so implementations must be
/// thread-safe. `emit` must not panic and should return quickly; it is
/// called inline from the crawl loop.
pub trait EventSink: Send + Sync {
    /// Records one event
    fn emit(&self, event: &CrawlEvent);
}

/// Default sink: forwards every event to `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: &CrawlEvent) {
        let url = event.url.as_deref().unwrap_or("-");
        let field = event.field.as_deref().unwrap_or("-");

        match event.kind {
            EventKind::PageFailed => {
                tracing::error!(event = %event.kind, url, "{}", event.detail)
            }
            EventKind::ItemFailed | EventKind::LinkSkipped => {
                tracing::warn!(event = %event.kind, url, "{}", event.detail)
            }
            EventKind::FieldFailed => {
                tracing::warn!(event = %event.kind, url, field, "{}", event.detail)
            }
            EventKind::RunStarted | EventKind::RunFinished | EventKind::PageFetched => {
                tracing::info!(event = %event.kind, url, "{}", event.detail)
            }
            _ => tracing::debug!(event = %event.kind, url, "{}", event.detail),
        }
    }
}

/// Sink that keeps every event in memory
#[derive(Debug, Default)]
pub struct CollectingSink {
    events: Mutex<Vec<CrawlEvent>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events recorded so far
    pub fn events(&self) -> Vec<CrawlEvent> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Events of one kind
    pub fn of_kind(&self, kind: EventKind) -> Vec<CrawlEvent> {
        self.events().into_iter().filter(|e| e.kind == kind).collect()
    }
}

impl EventSink for CollectingSink {
    fn emit(&self, event: &CrawlEvent) {
        let mut events = match self.events.lock() {
            Ok(events) => events,
            Err(poisoned) => poisoned.into_inner(),
        };
        events.push(event.clone());
    }
}
