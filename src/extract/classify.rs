use crate::extract::PageMetadata;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

/// Fixed vocabulary describing what a page is for
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageType {
    Homepage,
    About,
    Team,
    Product,
    News,
    Contact,
    Legal,
    Other,
}

impl PageType {
    /// Returns the lowercase name used in manifests and logs
    pub fn as_str(&self) -> &'static str {
        match self {
            PageType::Homepage => "homepage",
            PageType::About => "about",
            PageType::Team => "team",
            PageType::Product => "product",
            PageType::News => "news",
            PageType::Contact => "contact",
            PageType::Legal => "legal",
            PageType::Other => "other",
        }
    }
}

impl fmt::Display for PageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classification rule: a path pattern and a title pattern
struct Category {
    page_type: PageType,
    path: Regex,
    title: Regex,
}

impl Category {
    fn new(page_type: PageType, path: &str, title: &str) -> Option<Self> {
        Some(Self {
            page_type,
            path: Regex::new(&format!(r"(?i)/({path})\b")).ok()?,
            title: Regex::new(&format!(r"(?i)\b({title})\b")).ok()?,
        })
    }

    fn matches(&self, path: &str, title: &str) -> bool {
        self.path.is_match(path) || self.title.is_match(title)
    }
}

/// Categories in decision order; the first match wins
static CATEGORIES: Lazy<Vec<Category>> = Lazy::new(|| {
    [
        Category::new(
            PageType::About,
            "about|about-us|company|who-we-are|our-story|mission",
            "about|who we are|our story|our mission",
        ),
        Category::new(
            PageType::Team,
            "team|our-team|people|leadership|staff|management|founders",
            "team|leadership|our people|staff|founders",
        ),
        Category::new(
            PageType::Product,
            "products?|services?|solutions?|features|pricing|platform",
            "products?|services?|solutions|pricing|features|platform",
        ),
        Category::new(
            PageType::News,
            "news|blog|press|articles?|posts?|insights|updates",
            "news|blog|press release|articles|insights|updates",
        ),
        Category::new(
            PageType::Contact,
            "contact|contact-us|get-in-touch|support|locations?",
            "contact|get in touch|support|locations",
        ),
        Category::new(
            PageType::Legal,
            "legal|privacy|privacy-policy|terms|terms-of-service|tos|cookies?|disclaimer|imprint|gdpr",
            "privacy|terms|legal|cookies?|disclaimer|imprint",
        ),
    ]
    .into_iter()
    .flatten()
    .collect()
});

/// Classifies a page by its URL path and title
///
/// A root path is always `homepage`. Otherwise categories are tried in a
/// fixed order (about, team, product, news, contact, legal) and the first
/// one whose path pattern or title keywords match wins; pages matching none
/// are `other`.
///
/// # Examples
///
/// ```
/// use sumi_harvest::extract::{classify_page, PageMetadata};
/// use sumi_harvest::PageType;
/// use url::Url;
///
/// let url = Url::parse("https://example.com/about-us").unwrap();
/// assert_eq!(classify_page(&url, &PageMetadata::default()), PageType::About);
/// ```
pub fn classify_page(url: &Url, metadata: &PageMetadata) -> PageType {
    let path = url.path();
    if path.is_empty() || path == "/" {
        return PageType::Homepage;
    }

    let title = metadata.title.as_deref().unwrap_or_default();
    CATEGORIES
        .iter()
        .find(|category| category.matches(path, title))
        .map_or(PageType::Other, |category| category.page_type)
}
