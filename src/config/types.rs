use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Opaque caller data carried from the job to the outcome untouched
pub type Context = serde_json::Map<String, serde_json::Value>;

/// One extracted record: field name to value. Fields with no match are omitted.
pub type CrawlRecord = BTreeMap<String, FieldValue>;

/// Page retrieval strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FetchEngine {
    /// Fetch the markup over HTTP and parse it
    #[serde(rename = "STATIC", alias = "static", alias = "beautifulsoup")]
    Static,

    /// Drive a headless browser and read the rendered DOM
    #[default]
    #[serde(rename = "RENDERED", alias = "rendered", alias = "selenium")]
    Rendered,
}

impl FetchEngine {
    /// Wire identifier of the engine
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Static => "STATIC",
            Self::Rendered => "RENDERED",
        }
    }

    /// The closed set of supported engines
    pub fn all() -> Vec<Self> {
        vec![Self::Static, Self::Rendered]
    }
}

impl fmt::Display for FetchEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How to locate and read one value in a document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectorSpec {
    /// CSS selector expression
    #[serde(alias = "selector")]
    pub expression: String,

    /// `"text"`, `"html"`, or the name of an element attribute
    #[serde(default = "default_attribute")]
    pub attribute: String,

    /// Collect every match instead of the first one
    #[serde(default)]
    pub multiple: bool,
}

impl SelectorSpec {
    /// Selector reading the trimmed text of the first match
    pub fn text(expression: impl Into<String>) -> Self {
        Self {
            expression: expression.into(),
            attribute: default_attribute(),
            multiple: false,
        }
    }

    /// Same selector, reading `attribute` instead
    pub fn with_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.attribute = attribute.into();
        self
    }

    /// Same selector, collecting all matches
    pub fn all(mut self) -> Self {
        self.multiple = true;
        self
    }
}

/// A named output field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    #[serde(alias = "field_name")]
    pub name: String,

    #[serde(alias = "selector_config")]
    pub selector: SelectorSpec,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, selector: SelectorSpec) -> Self {
        Self {
            name: name.into(),
            selector,
        }
    }
}

/// List-page navigation; its presence switches the crawl to list mode
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationSpec {
    /// Selector for each item on a listing page
    #[serde(alias = "list_items_selector")]
    pub list_item_expression: String,

    /// Selector for the link element inside an item (the item itself if unset)
    #[serde(default, alias = "detail_link_selector")]
    pub detail_link_expression: Option<String>,

    /// Attribute holding the detail link
    #[serde(default = "default_link_attribute")]
    pub detail_link_attribute: String,
}

impl NavigationSpec {
    pub fn new(list_item_expression: impl Into<String>) -> Self {
        Self {
            list_item_expression: list_item_expression.into(),
            detail_link_expression: None,
            detail_link_attribute: default_link_attribute(),
        }
    }
}

/// Next-page pagination
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationSpec {
    #[serde(default)]
    pub enabled: bool,

    /// Selector for the "next page" link; required when enabled
    #[serde(default, alias = "next_page_selector")]
    pub next_page_expression: Option<String>,

    /// Attribute holding the next-page link
    #[serde(default = "default_link_attribute")]
    pub next_page_attribute: String,

    /// Upper bound on listing pages traversed
    #[serde(default)]
    pub max_pages: Option<i64>,
}

impl PaginationSpec {
    /// Enabled pagination following `next_page_expression`
    pub fn follow(next_page_expression: impl Into<String>) -> Self {
        Self {
            enabled: true,
            next_page_expression: Some(next_page_expression.into()),
            next_page_attribute: default_link_attribute(),
            max_pages: None,
        }
    }

    /// Page limit as a count; non-positive limits are treated as unset
    pub fn page_limit(&self) -> Option<usize> {
        self.max_pages
            .filter(|&n| n > 0)
            .map(|n| usize::try_from(n).unwrap_or(usize::MAX))
    }
}

/// Timeouts and politeness delay, all in seconds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimingSpec {
    #[serde(default = "default_page_load_timeout", alias = "page_load_timeout")]
    pub page_load_timeout_seconds: f64,

    #[serde(
        default = "default_element_wait_timeout",
        alias = "element_wait_timeout"
    )]
    pub element_wait_timeout_seconds: f64,

    #[serde(
        default = "default_inter_request_delay",
        alias = "delay_between_requests"
    )]
    pub inter_request_delay_seconds: f64,
}

impl TimingSpec {
    pub fn page_load_timeout(&self) -> Duration {
        seconds(
            self.page_load_timeout_seconds,
            Duration::from_secs_f64(default_page_load_timeout()),
        )
    }

    pub fn element_wait_timeout(&self) -> Duration {
        seconds(self.element_wait_timeout_seconds, Duration::ZERO)
    }

    pub fn inter_request_delay(&self) -> Duration {
        seconds(self.inter_request_delay_seconds, Duration::ZERO)
    }
}

impl Default for TimingSpec {
    fn default() -> Self {
        Self {
            page_load_timeout_seconds: default_page_load_timeout(),
            element_wait_timeout_seconds: default_element_wait_timeout(),
            inter_request_delay_seconds: default_inter_request_delay(),
        }
    }
}

fn seconds(value: f64, fallback: Duration) -> Duration {
    Duration::try_from_secs_f64(value).unwrap_or(fallback)
}

/// A complete crawl job, owned by the caller and read-only during a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrawlJob {
    /// Absolute URL of the first page
    pub start_url: String,

    #[serde(default, alias = "engine")]
    pub fetch_engine: FetchEngine,

    /// Ordered field extractors
    #[serde(default, alias = "extractors")]
    pub fields: Vec<FieldSpec>,

    #[serde(default)]
    pub navigation: Option<NavigationSpec>,

    #[serde(default)]
    pub pagination: Option<PaginationSpec>,

    #[serde(default, alias = "wait_config")]
    pub timing: TimingSpec,

    #[serde(default)]
    pub context: Context,

    /// Chrome/Chromium binary for the RENDERED engine; auto-detected if unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub browser_executable: Option<PathBuf>,
}

impl CrawlJob {
    /// Single-page job with default timing
    pub fn new(start_url: impl Into<String>, fetch_engine: FetchEngine, fields: Vec<FieldSpec>) -> Self {
        Self {
            start_url: start_url.into(),
            fetch_engine,
            fields,
            navigation: None,
            pagination: None,
            timing: TimingSpec::default(),
            context: Context::new(),
            browser_executable: None,
        }
    }

    /// True when pagination is configured and switched on
    pub fn pagination_enabled(&self) -> bool {
        self.pagination.as_ref().is_some_and(|p| p.enabled)
    }
}

/// Value extracted for one field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    List(Vec<String>),
}

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::List(_) => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Self::Text(_) => None,
            Self::List(items) => Some(items),
        }
    }
}

/// Result of one crawl run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrawlOutcome {
    pub success: bool,
    pub records: Vec<CrawlRecord>,
    /// Always equal to `records.len()`
    pub total_items: usize,
    /// Next page that was resolved but not followed
    pub next_page_url: Option<String>,
    pub errors: Vec<String>,
    pub context: Context,
}

impl CrawlOutcome {
    /// Empty, not-yet-successful outcome carrying the job's context
    pub fn new(context: Context) -> Self {
        Self {
            success: false,
            records: Vec::new(),
            total_items: 0,
            next_page_url: None,
            errors: Vec::new(),
            context,
        }
    }

    /// Outcome of a run that never started
    pub fn rejected<I, E>(context: Context, errors: I) -> Self
    where
        I: IntoIterator<Item = E>,
        E: Into<String>,
    {
        let mut outcome = Self::new(context);
        outcome.errors.extend(errors.into_iter().map(Into::into));
        outcome
    }

    pub fn push_record(&mut self, record: CrawlRecord) {
        self.records.push(record);
        self.total_items = self.records.len();
    }

    pub fn push_error(&mut self, error: impl Into<String>) {
        self.errors.push(error.into());
    }
}

fn default_attribute() -> String {
    "text".to_string()
}

fn default_link_attribute() -> String {
    "href".to_string()
}

fn default_page_load_timeout() -> f64 {
    10.0
}

fn default_element_wait_timeout() -> f64 {
    5.0
}

fn default_inter_request_delay() -> f64 {
    1.0
}
