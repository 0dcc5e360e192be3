//! Content extraction
//!
//! Pure functions that derive text, metadata, a page classification, links
//! and embedded structured data from one HTML document. None of them fail:
//! malformed markup degrades to empty values.

mod classify;
mod links;
mod metadata;
mod structured;
mod text;

pub use classify::{classify_page, PageType};
pub use links::{extract_links, ExtractedLinks};
pub use metadata::{extract_metadata, PageMetadata};
pub use structured::extract_json_ld;
pub use text::extract_text;
