use crate::config::types::CrawlJob;
use crate::{ConfigError, ConfigResult};
use sha2::{Digest, Sha256};
use std::path::Path;

/// Loads a crawl job from a JSON or TOML file
///
/// The format is chosen by file extension (`.json` or `.toml`). The job is
/// parsed but not validated; run it through [`crate::config::validate`]
/// before execution.
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use sumi_harvest::config::load_job;
///
/// let job = load_job(Path::new("jobs/books.json")).unwrap();
/// println!("Start URL: {}", job.start_url);
/// ```
pub fn load_job(path: &Path) -> ConfigResult<CrawlJob> {
    let content = std::fs::read_to_string(path)?;

    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "json" => parse_job_json(&content),
        "toml" => parse_job_toml(&content),
        other => Err(ConfigError::UnsupportedFormat(format!(
            "'{}' (expected .json or .toml)",
            other
        ))),
    }
}

/// Parses a crawl job from its JSON representation
pub fn parse_job_json(content: &str) -> ConfigResult<CrawlJob> {
    Ok(serde_json::from_str(content)?)
}

/// Parses a crawl job from a TOML document
pub fn parse_job_toml(content: &str) -> ConfigResult<CrawlJob> {
    Ok(toml::from_str(content)?)
}

/// Computes a SHA-256 hash of the job file content
///
/// Logged alongside each run so results can be tied to a job revision.
pub fn compute_job_hash(path: &Path) -> ConfigResult<String> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}

/// Loads a job and returns both the job and its file hash
pub fn load_job_with_hash(path: &Path) -> ConfigResult<(CrawlJob, String)> {
    let job = load_job(path)?;
    let hash = compute_job_hash(path)?;
    Ok((job, hash))
}
