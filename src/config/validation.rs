use crate::config::types::{CrawlJob, FetchEngine};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use url::Url;

/// Result of a static job check
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

/// Checks a crawl job for structural and business-rule completeness
///
/// Nothing is fetched. Errors make the job unrunnable; warnings are advisory.
///
/// # Checks
///
/// - `start_url` is present and an absolute http(s) URL
/// - at least one field; every field has a unique, non-empty name and a
///   non-empty selector expression
/// - navigation, when present, has a list item expression
/// - enabled pagination has a next page expression and a positive `max_pages`
/// - timing values are finite and non-negative
///
/// A rendered job with less than one second between requests gets a warning.
pub fn validate(job: &CrawlJob) -> ValidationReport {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    validate_start_url(&job.start_url, &mut errors);
    validate_fields(job, &mut errors);

    if let Some(navigation) = &job.navigation {
        if navigation.list_item_expression.trim().is_empty() {
            errors.push("Navigation: list_item_expression is required".to_string());
        }
    }

    if let Some(pagination) = job.pagination.as_ref().filter(|p| p.enabled) {
        let has_expression = pagination
            .next_page_expression
            .as_deref()
            .is_some_and(|e| !e.trim().is_empty());
        if !has_expression {
            errors.push(
                "Pagination: next_page_expression is required when pagination is enabled"
                    .to_string(),
            );
        }

        if let Some(max_pages) = pagination.max_pages {
            if max_pages <= 0 {
                errors.push("Pagination: max_pages must be greater than 0".to_string());
            }
        }
    }

    validate_timing(job, &mut errors);

    if job.fetch_engine == FetchEngine::Rendered && job.timing.inter_request_delay_seconds < 1.0 {
        warnings.push(
            "Consider increasing inter_request_delay_seconds for the RENDERED engine to avoid being blocked"
                .to_string(),
        );
    }

    ValidationReport {
        valid: errors.is_empty(),
        errors,
        warnings,
    }
}

fn validate_start_url(start_url: &str, errors: &mut Vec<String>) {
    if start_url.trim().is_empty() {
        errors.push("start_url is required".to_string());
        return;
    }

    match Url::parse(start_url) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
        Ok(url) => errors.push(format!(
            "start_url must use http or https, got '{}'",
            url.scheme()
        )),
        Err(e) => errors.push(format!("start_url '{}' is not an absolute URL: {}", start_url, e)),
    }
}

fn validate_fields(job: &CrawlJob, errors: &mut Vec<String>) {
    if job.fields.is_empty() {
        errors.push("At least one field is required".to_string());
        return;
    }

    let mut seen = HashSet::new();
    for (i, field) in job.fields.iter().enumerate() {
        if field.name.trim().is_empty() {
            errors.push(format!("Field {}: name is required", i));
        } else if !seen.insert(field.name.as_str()) {
            errors.push(format!("Field {}: duplicate name '{}'", i, field.name));
        }

        if field.selector.expression.trim().is_empty() {
            errors.push(format!("Field {}: selector expression is required", i));
        }
    }
}

fn validate_timing(job: &CrawlJob, errors: &mut Vec<String>) {
    let timing = &job.timing;

    if !timing.page_load_timeout_seconds.is_finite() || timing.page_load_timeout_seconds <= 0.0 {
        errors.push("Timing: page_load_timeout_seconds must be greater than 0".to_string());
    }

    if !timing.element_wait_timeout_seconds.is_finite() || timing.element_wait_timeout_seconds < 0.0
    {
        errors.push("Timing: element_wait_timeout_seconds cannot be negative".to_string());
    }

    if !timing.inter_request_delay_seconds.is_finite() || timing.inter_request_delay_seconds < 0.0 {
        errors.push("Timing: inter_request_delay_seconds cannot be negative".to_string());
    }
}
