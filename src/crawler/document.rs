//! Parsed page handle shared by both fetch strategies

use crate::ExtractionError;
use scraper::{ElementRef, Html, Selector};

/// One page's structured content, independent of how it was retrieved
///
/// The static fetcher builds it from the response body; the rendered fetcher
/// builds it from the browser's live DOM after the page settled. Extraction
/// and navigation only ever see this type.
pub struct Document {
    url: String,
    html: Html,
}

impl Document {
    /// Parses `markup` as the page found at `url`
    pub fn parse(url: impl Into<String>, markup: &str) -> Self {
        Self {
            url: url.into(),
            html: Html::parse_document(markup),
        }
    }

    /// URL the page was loaded from
    pub fn url(&self) -> &str {
        &self.url
    }

    /// All elements matching `expression`, in document order
    pub fn select_all(&self, expression: &str) -> Result<Vec<ElementRef<'_>>, ExtractionError> {
        let selector = compile_selector(expression)?;
        Ok(self.html.select(&selector).collect())
    }

    /// First element matching `expression`
    pub fn select_first(&self, expression: &str) -> Result<Option<ElementRef<'_>>, ExtractionError> {
        let selector = compile_selector(expression)?;
        Ok(self.html.select(&selector).next())
    }
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document").field("url", &self.url).finish()
    }
}

/// Compiles a CSS selector expression
pub fn compile_selector(expression: &str) -> Result<Selector, ExtractionError> {
    Selector::parse(expression).map_err(|e| ExtractionError::InvalidSelector {
        expression: expression.to_string(),
        message: e.to_string(),
    })
}
