//! Link extraction
//!
//! Collects navigable links from `<a href>` and `<area href>` and splits them
//! into same-site (internal) and off-site (external) sets.

use crate::url::{is_same_site, normalize_parsed};
use scraper::{Html, Selector};
use std::collections::HashSet;
use url::Url;

/// Links found on a page, in document order without duplicates
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedLinks {
    /// Same-site links, normalized
    pub internal: Vec<String>,

    /// Links to other hosts, as resolved
    pub external: Vec<String>,
}

/// Schemes that never lead to a crawlable page
const SKIPPED_SCHEMES: &[&str] = &["javascript:", "mailto:", "tel:", "data:"];

/// Extracts and classifies the links on a page
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `<a href="...">` and `<area href="...">`, resolved against `base_url`
/// - `rel="nofollow"` links
///
/// **Exclude:**
/// - `javascript:`, `mailto:`, `tel:` and `data:` links
/// - fragment-only links (same page anchors)
/// - anything that is not HTTP(S) after resolution
///
/// A link is internal when its host, ignoring a `www.` prefix, equals the
/// base URL's host.
///
/// # Example
///
/// ```
/// use sumi_harvest::extract::extract_links;
/// use url::Url;
///
/// let html = r#"<a href="/b">B</a><a href="https://other.com/d">D</a>"#;
/// let base = Url::parse("https://example.com/a").unwrap();
/// let links = extract_links(html, &base);
/// assert_eq!(links.internal, vec!["https://example.com/b".to_string()]);
/// assert_eq!(links.external, vec!["https://other.com/d".to_string()]);
/// ```
pub fn extract_links(html: &str, base_url: &Url) -> ExtractedLinks {
    let document = Html::parse_document(html);
    let mut links = ExtractedLinks::default();

    let Ok(selector) = Selector::parse("a[href], area[href]") else {
        return links;
    };

    let mut seen_internal = HashSet::new();
    let mut seen_external = HashSet::new();

    for element in document.select(&selector) {
        let Some(resolved) = element
            .value()
            .attr("href")
            .and_then(|href| resolve_link(href, base_url))
        else {
            continue;
        };

        if is_same_site(&resolved, base_url) {
            let Ok(normalized) = normalize_parsed(resolved) else {
                continue;
            };
            let normalized = normalized.to_string();
            if seen_internal.insert(normalized.clone()) {
                links.internal.push(normalized);
            }
        } else {
            let external = resolved.to_string();
            if seen_external.insert(external.clone()) {
                links.external.push(external);
            }
        }
    }

    links
}

/// Resolves a link href to an absolute URL and validates it
///
/// Returns None if the link should be excluded.
fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lowered = href.to_ascii_lowercase();
    if SKIPPED_SCHEMES
        .iter()
        .any(|scheme| lowered.starts_with(scheme))
    {
        return None;
    }

    let absolute_url = base_url.join(href).ok()?;
    match absolute_url.scheme() {
        "http" | "https" => Some(absolute_url),
        _ => None,
    }
}
