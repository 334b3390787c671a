//! List and pagination traversal
//!
//! Both operations read links off a [`Document`] and resolve them against the
//! page's absolute URL. Elements without a usable link are skipped; partial
//! results are normal on heterogeneous markup.

use crate::config::{NavigationSpec, PaginationSpec};
use crate::crawler::document::{compile_selector, Document};
use crate::events::{CrawlEvent, EventKind, EventSink};
use crate::url::resolve_link;
use scraper::ElementRef;

/// Detail-page URLs listed on a listing page
///
/// Each element matching `list_item_expression` contributes at most one URL:
/// the `detail_link_attribute` of its first `detail_link_expression` match,
/// or of the item itself when no link expression is set.
pub fn list_items(
    document: &Document,
    base_url: &str,
    navigation: Option<&NavigationSpec>,
    sink: &dyn EventSink,
) -> Vec<String> {
    let Some(navigation) = navigation else {
        return Vec::new();
    };

    let items = match document.select_all(&navigation.list_item_expression) {
        Ok(items) => items,
        Err(e) => {
            sink.emit(&CrawlEvent::new(EventKind::LinkSkipped, e.to_string()).with_url(base_url));
            return Vec::new();
        }
    };

    let link_selector = match navigation.detail_link_expression.as_deref() {
        Some(expression) => match compile_selector(expression) {
            Ok(selector) => Some(selector),
            Err(e) => {
                sink.emit(&CrawlEvent::new(EventKind::LinkSkipped, e.to_string()).with_url(base_url));
                return Vec::new();
            }
        },
        None => None,
    };

    let mut urls = Vec::new();
    for (index, item) in items.into_iter().enumerate() {
        let link_element = match &link_selector {
            Some(selector) => item.select(selector).next(),
            None => Some(item),
        };

        match link_element.and_then(|el| read_link(el, &navigation.detail_link_attribute, base_url)) {
            Some(url) => urls.push(url),
            None => sink.emit(
                &CrawlEvent::new(
                    EventKind::LinkSkipped,
                    format!("list item {} has no resolvable link", index + 1),
                )
                .with_url(base_url),
            ),
        }
    }

    sink.emit(
        &CrawlEvent::new(EventKind::ItemsFound, format!("found {} items", urls.len())).with_url(base_url),
    );

    urls
}

/// URL of the next listing page, if pagination is enabled and a link exists
pub fn next_page_url(
    document: &Document,
    base_url: &str,
    pagination: Option<&PaginationSpec>,
    sink: &dyn EventSink,
) -> Option<String> {
    let pagination = pagination.filter(|p| p.enabled)?;
    let expression = pagination.next_page_expression.as_deref()?;

    match document.select_first(expression) {
        Ok(element) => element.and_then(|el| read_link(el, &pagination.next_page_attribute, base_url)),
        Err(e) => {
            sink.emit(&CrawlEvent::new(EventKind::LinkSkipped, e.to_string()).with_url(base_url));
            None
        }
    }
}

/// Reads `attribute` off `element` and resolves it; unresolvable links are dropped
fn read_link(element: ElementRef<'_>, attribute: &str, base_url: &str) -> Option<String> {
    let href = element.value().attr(attribute)?;
    match resolve_link(href, base_url) {
        Ok(url) => Some(url),
        Err(e) => {
            tracing::debug!("Skipping link '{}' on {}: {}", href, base_url, e);
            None
        }
    }
}
