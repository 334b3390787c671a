//! Job model for Sumi-Harvest
//!
//! This module holds the declarative crawl job (what to fetch, what to
//! extract, how to paginate), its outcome type, job file loading, and the
//! static validator that gates execution.
//!
//! # Example
//!
//! ```no_run
//! use sumi_harvest::config::{load_job, validate};
//! use std::path::Path;
//!
//! let job = load_job(Path::new("job.toml")).unwrap();
//! let report = validate(&job);
//! println!("valid: {}, warnings: {:?}", report.valid, report.warnings);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Context, CrawlJob, CrawlOutcome, CrawlRecord, FetchEngine, FieldSpec, FieldValue,
    NavigationSpec, PaginationSpec, SelectorSpec, TimingSpec,
};

// Re-export parser functions
pub use parser::{compute_job_hash, load_job, load_job_with_hash, parse_job_json, parse_job_toml};

pub use validation::{validate, ValidationReport};
