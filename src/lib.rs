//! Sumi-Harvest: a declarative crawl engine
//!
//! This crate turns a declarative crawl job (start page, list navigation,
//! pagination and field selectors) into structured records, using either a
//! static HTTP fetcher or a headless browser behind one fetch contract.

pub mod config;
pub mod crawler;
pub mod events;
pub mod service;
pub mod state;
pub mod url;

use config::FetchEngine;
use thiserror::Error;

/// Main error type for Sumi-Harvest operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Failed to set up {engine} fetcher: {message}")]
    Setup {
        engine: FetchEngine,
        message: String,
    },

    #[error("HTTP {status} for {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("Browser error for {url}: {message}")]
    Browser { url: String, message: String },

    #[error("Fetcher already closed")]
    Closed,

    #[error("Invalid URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        source: ::url::ParseError,
    },

    #[error("Invalid phase transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: state::RunPhase,
        to: state::RunPhase,
    },
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read job file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unsupported job file format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid configuration: {0}")]
    Validation(String),
}

/// A single field's selector could not be evaluated
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Invalid selector '{expression}': {message}")]
    InvalidSelector { expression: String, message: String },
}

/// A link could not be turned into an absolute URL
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResolutionError {
    #[error("Empty link")]
    Empty,

    #[error("Invalid base URL '{0}'")]
    InvalidBase(String),

    #[error("Cannot resolve '{href}': {message}")]
    Join { href: String, message: String },
}

/// Result type alias for Sumi-Harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::{CrawlJob, CrawlOutcome, CrawlRecord, FieldValue};
pub use events::{CollectingSink, CrawlEvent, EventKind, EventSink, TracingSink};
pub use service::{EngineCatalog, HarvestEngine};
pub use state::RunPhase;
