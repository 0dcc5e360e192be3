use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use url::Url;

/// Descriptive metadata pulled from a page's `<head>`
///
/// Every field is optional; a missing or empty tag leaves the field `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMetadata {
    pub title: Option<String>,
    pub description: Option<String>,
    /// Absolute canonical URL
    pub canonical_url: Option<String>,
    /// Absolute social preview image URL
    pub image: Option<String>,
    /// Open Graph object type (`website`, `article`, ...)
    pub content_type: Option<String>,
    pub language: Option<String>,
    pub author: Option<String>,
    pub published_at: Option<String>,
    pub modified_at: Option<String>,
}

/// Extracts metadata from an HTML document
///
/// Open Graph values are preferred over their plain HTML counterparts.
/// Relative canonical and image URLs are resolved against `url`.
///
/// # Examples
///
/// ```
/// use sumi_harvest::extract::extract_metadata;
/// use url::Url;
///
/// let html = r#"<html lang="en"><head>
///     <title>Plain</title>
///     <meta property="og:title" content="Social">
/// </head></html>"#;
/// let url = Url::parse("https://example.com/page").unwrap();
/// let metadata = extract_metadata(html, &url);
/// assert_eq!(metadata.title.as_deref(), Some("Social"));
/// assert_eq!(metadata.language.as_deref(), Some("en"));
/// ```
pub fn extract_metadata(html: &str, url: &Url) -> PageMetadata {
    let document = Html::parse_document(html);

    PageMetadata {
        title: meta_value(&document, "og:title").or_else(|| title_text(&document)),
        description: meta_value(&document, "og:description")
            .or_else(|| meta_value(&document, "description")),
        canonical_url: canonical_href(&document).and_then(|href| resolve(url, &href)),
        image: meta_value(&document, "og:image")
            .or_else(|| meta_value(&document, "twitter:image"))
            .and_then(|src| resolve(url, &src)),
        content_type: meta_value(&document, "og:type"),
        language: first_attr(&document, "html[lang]", "lang"),
        author: meta_value(&document, "author")
            .or_else(|| meta_value(&document, "article:author")),
        published_at: first_meta(
            &document,
            &["article:published_time", "datePublished", "date"],
        ),
        modified_at: first_meta(
            &document,
            &["article:modified_time", "og:updated_time", "dateModified"],
        ),
    }
}

/// Reads a `<meta>` value declared through `property`, `name` or `itemprop`
fn meta_value(document: &Html, key: &str) -> Option<String> {
    let selector = Selector::parse(&format!(
        r#"meta[property="{key}"][content], meta[name="{key}"][content], meta[itemprop="{key}"][content]"#
    ))
    .ok()?;

    document
        .select(&selector)
        .filter_map(|element| element.value().attr("content"))
        .map(clean)
        .find(|value| !value.is_empty())
}

fn first_meta(document: &Html, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| meta_value(document, key))
}

fn title_text(document: &Html) -> Option<String> {
    let selector = Selector::parse("title").ok()?;

    document
        .select(&selector)
        .next()
        .map(|element| clean(&element.text().collect::<String>()))
        .filter(|s| !s.is_empty())
}

/// Finds `<link rel=canonical>` regardless of attribute order or extra rel tokens
fn canonical_href(document: &Html) -> Option<String> {
    let selector = Selector::parse("link[rel][href]").ok()?;

    document
        .select(&selector)
        .filter(|element| {
            element.value().attr("rel").is_some_and(|rel| {
                rel.split_whitespace()
                    .any(|token| token.eq_ignore_ascii_case("canonical"))
            })
        })
        .filter_map(|element| element.value().attr("href"))
        .map(clean)
        .find(|href| !href.is_empty())
}

fn first_attr(document: &Html, selector: &str, attr: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;

    document
        .select(&selector)
        .filter_map(|element| element.value().attr(attr))
        .map(clean)
        .find(|value| !value.is_empty())
}

fn resolve(base: &Url, href: &str) -> Option<String> {
    base.join(href).ok().map(|url| url.to_string())
}

fn clean(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page_url() -> Url {
        Url::parse("https://example.com/blog/post").unwrap()
    }

    #[test]
    fn test_og_title_preferred() {
        let html = r#"<html><head><title>Plain Title</title>
            <meta property="og:title" content="OG Title"></head></html>"#;
        let metadata = extract_metadata(html, &page_url());
        assert_eq!(metadata.title.as_deref(), Some("OG Title"));
    }

    #[test]
    fn test_title_fallback_trimmed() {
        let html = "<html><head><title>\n  Plain   Title \n</title></head></html>";
        let metadata = extract_metadata(html, &page_url());
        assert_eq!(metadata.title.as_deref(), Some("Plain Title"));
    }

    #[test]
    fn test_empty_og_title_falls_back() {
        let html = r#"<html><head><title>Plain</title>
            <meta property="og:title" content="  "></head></html>"#;
        let metadata = extract_metadata(html, &page_url());
        assert_eq!(metadata.title.as_deref(), Some("Plain"));
    }

    #[test]
    fn test_description_preference() {
        let html = r#"<head><meta name="description" content="Plain">
            <meta property="og:description" content="Social"></head>"#;
        assert_eq!(
            extract_metadata(html, &page_url()).description.as_deref(),
            Some("Social")
        );

        let html = r#"<head><meta name="description" content="Plain"></head>"#;
        assert_eq!(
            extract_metadata(html, &page_url()).description.as_deref(),
            Some("Plain")
        );
    }

    #[test]
    fn test_canonical_attribute_order() {
        let rel_first = r#"<head><link rel="canonical" href="https://example.com/a"></head>"#;
        let href_first = r#"<head><link href="https://example.com/a" rel="canonical"></head>"#;
        assert_eq!(
            extract_metadata(rel_first, &page_url()).canonical_url,
            extract_metadata(href_first, &page_url()).canonical_url
        );
        assert_eq!(
            extract_metadata(href_first, &page_url())
                .canonical_url
                .as_deref(),
            Some("https://example.com/a")
        );
    }

    #[test]
    fn test_relative_canonical_and_image_resolved() {
        let html = r#"<head><link rel="Canonical" href="/blog/post">
            <meta property="og:image" content="../img/cover.png"></head>"#;
        let metadata = extract_metadata(html, &page_url());
        assert_eq!(
            metadata.canonical_url.as_deref(),
            Some("https://example.com/blog/post")
        );
        assert_eq!(
            metadata.image.as_deref(),
            Some("https://example.com/img/cover.png")
        );
    }

    #[test]
    fn test_twitter_image_fallback() {
        let html = r#"<head><meta name="twitter:image" content="https://cdn.example.com/t.png"></head>"#;
        assert_eq!(
            extract_metadata(html, &page_url()).image.as_deref(),
            Some("https://cdn.example.com/t.png")
        );
    }

    #[test]
    fn test_language_type_and_author() {
        let html = r#"<html lang="de-DE"><head>
            <meta property="og:type" content="article">
            <meta property="article:author" content="OG Author">
            <meta name="author" content="Jane Doe"></head></html>"#;
        let metadata = extract_metadata(html, &page_url());
        assert_eq!(metadata.language.as_deref(), Some("de-DE"));
        assert_eq!(metadata.content_type.as_deref(), Some("article"));
        assert_eq!(metadata.author.as_deref(), Some("Jane Doe"));
    }

    #[test]
    fn test_date_preference_order() {
        let html = r#"<head>
            <meta name="date" content="2024-01-01">
            <meta itemprop="datePublished" content="2024-02-02">
            <meta property="article:published_time" content="2024-03-03T10:00:00Z">
            <meta itemprop="dateModified" content="2024-04-04">
            <meta property="og:updated_time" content="2024-05-05"></head>"#;
        let metadata = extract_metadata(html, &page_url());
        assert_eq!(metadata.published_at.as_deref(), Some("2024-03-03T10:00:00Z"));
        assert_eq!(metadata.modified_at.as_deref(), Some("2024-05-05"));
    }

    #[test]
    fn test_generic_date_fallbacks() {
        let html = r#"<head><meta name="date" content="2024-01-01">
            <meta name="dateModified" content="2024-06-06"></head>"#;
        let metadata = extract_metadata(html, &page_url());
        assert_eq!(metadata.published_at.as_deref(), Some("2024-01-01"));
        assert_eq!(metadata.modified_at.as_deref(), Some("2024-06-06"));
    }

    #[test]
    fn test_empty_document() {
        assert_eq!(extract_metadata("", &page_url()), PageMetadata::default());
        assert_eq!(
            extract_metadata("<<<not html>>>", &page_url()),
            PageMetadata::default()
        );
    }
}
