//! Field extraction
//!
//! Evaluates one [`SelectorSpec`] against a [`Document`]:
//!
//! - `multiple = true` → every match, resolved, empty values dropped; always a list
//! - `multiple = false` → the first match resolved, or nothing
//!
//! The attribute decides what is read from each element: `"text"` is the
//! element's text with whitespace collapsed, `"html"` its inner markup, and
//! any other name that attribute's value (empty when missing).

use crate::config::{CrawlRecord, FieldSpec, FieldValue, SelectorSpec};
use crate::crawler::document::Document;
use crate::events::{CrawlEvent, EventKind, EventSink};
use crate::ExtractionError;
use scraper::ElementRef;

/// Extracts a single field value
///
/// Returns `Ok(None)` when a single-valued selector matches nothing. A
/// malformed selector is an error; [`extract_record`] turns it into an
/// absent field.
pub fn extract(document: &Document, spec: &SelectorSpec) -> Result<Option<FieldValue>, ExtractionError> {
    if spec.multiple {
        let values = document
            .select_all(&spec.expression)?
            .into_iter()
            .map(|element| resolve_value(element, &spec.attribute))
            .filter(|value| !value.is_empty())
            .collect();
        return Ok(Some(FieldValue::List(values)));
    }

    Ok(document
        .select_first(&spec.expression)?
        .map(|element| FieldValue::Text(resolve_value(element, &spec.attribute))))
}

/// Builds one record from every configured field
///
/// Each field is evaluated in isolation: a failing selector leaves only that
/// field out of the record and is reported to `sink`.
pub fn extract_record(document: &Document, fields: &[FieldSpec], sink: &dyn EventSink) -> CrawlRecord {
    let mut record = CrawlRecord::new();

    for field in fields {
        match extract(document, &field.selector) {
            Ok(Some(value)) => {
                record.insert(field.name.clone(), value);
            }
            Ok(None) => {}
            Err(e) => sink.emit(
                &CrawlEvent::new(EventKind::FieldFailed, e.to_string())
                    .with_url(document.url())
                    .with_field(&field.name),
            ),
        }
    }

    record
}

/// Reads the requested attribute off an element
pub fn resolve_value(element: ElementRef<'_>, attribute: &str) -> String {
    match attribute {
        "text" | "" => visible_text(element),
        "html" => element.inner_html(),
        name => element.value().attr(name).unwrap_or_default().to_string(),
    }
}

/// Text content with runs of whitespace collapsed and the ends trimmed
fn visible_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}
