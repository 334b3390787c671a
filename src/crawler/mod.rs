//! Crawler module for page fetching, extraction and traversal
//!
//! This module contains the core crawl engine, including:
//! - Fetch strategies (static HTTP and headless browser) behind one enum
//! - Field extraction from a parsed document
//! - List and pagination link traversal
//! - The page loop that ties them together

mod browser;
mod coordinator;
mod document;
mod extractor;
mod fetcher;
mod navigation;

pub use browser::RenderedFetcher;
pub use coordinator::{run_crawl, Coordinator};
pub use document::{compile_selector, Document};
pub use extractor::{extract, extract_record, resolve_value};
pub use fetcher::{build_http_client, Fetcher, StaticFetcher, USER_AGENT};
pub use navigation::{list_items, next_page_url};
