use crate::ResolutionError;
use url::Url;

/// Resolves a link found on a page against that page's absolute URL
///
/// Standard relative-reference resolution: `../item/5` on
/// `https://a.example/list/page1` becomes `https://a.example/item/5`.
/// Absolute links are returned as-is (after parsing).
///
/// # Examples
///
/// ```
/// use sumi_harvest::url::resolve_link;
///
/// let url = resolve_link("../item/5", "https://a.example/list/page1").unwrap();
/// assert_eq!(url, "https://a.example/item/5");
/// ```
pub fn resolve_link(href: &str, base_url: &str) -> Result<String, ResolutionError> {
    let href = href.trim();
    if href.is_empty() {
        return Err(ResolutionError::Empty);
    }

    let base = Url::parse(base_url).map_err(|_| ResolutionError::InvalidBase(base_url.to_string()))?;

    base.join(href)
        .map(String::from)
        .map_err(|e| ResolutionError::Join {
            href: href.to_string(),
            message: e.to_string(),
        })
}

/// Returns true if two URLs address the same page
///
/// Both sides are parsed so that equivalent spellings compare equal
/// (`https://a.test` and `https://a.test/`). The fragment is significant:
/// hash-routed sites page through `#/list?page=N`.
/// Unparseable input falls back to plain string comparison.
pub fn same_page(a: &str, b: &str) -> bool {
    match (Url::parse(a), Url::parse(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}
