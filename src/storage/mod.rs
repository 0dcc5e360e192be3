//! Storage module for persisting crawl data
//!
//! This module handles everything a crawl writes to disk:
//! - Page artifacts (`pages/<id>.html`, `.txt`, `.json`)
//! - The crawl manifest (`manifest.json`)
//! - The resume checkpoint (`state.json`)

mod fs;
mod traits;

pub use fs::{FsStorage, MANIFEST_FILE, PAGES_DIR, STATE_FILE};
pub use traits::{Storage, StorageError, StorageResult};

use crate::extract::{PageMetadata, PageType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

/// Derives the artifact identifier for a normalized URL
///
/// The first 16 hex digits of the SHA-256 of the URL.
///
/// # Examples
///
/// ```
/// use sumi_harvest::storage::page_id;
///
/// let id = page_id("https://example.com/");
/// assert_eq!(id.len(), 16);
/// assert_eq!(id, page_id("https://example.com/"));
/// ```
pub fn page_id(url: &str) -> String {
    let digest = Sha256::digest(url.as_bytes());
    hex::encode(digest)[..16].to_string()
}

/// Everything known about one fetched (or failed) page
///
/// Raw HTML and clean text are written to their own artifacts and left out
/// of the JSON record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRecord {
    pub id: String,
    /// Normalized URL the page was dequeued under
    pub url: String,
    /// URL the content was finally served from, after redirects
    pub final_url: String,
    pub status: u16,
    pub page_type: PageType,
    pub metadata: PageMetadata,
    #[serde(skip)]
    pub html: String,
    #[serde(skip)]
    pub text: String,
    pub internal_links: Vec<String>,
    pub external_links: Vec<String>,
    pub json_ld: Option<Value>,
    pub fetched_at: DateTime<Utc>,
    pub depth: u32,
    pub response_time_ms: u64,
    pub content_length: u64,
    pub error: Option<String>,
}

impl PageRecord {
    /// Builds the record for a fetch that failed
    pub fn failed(
        url: &str,
        depth: u32,
        status: u16,
        error: String,
        response_time_ms: u64,
    ) -> Self {
        Self {
            id: page_id(url),
            url: url.to_string(),
            final_url: url.to_string(),
            status,
            page_type: PageType::Other,
            metadata: PageMetadata::default(),
            html: String::new(),
            text: String::new(),
            internal_links: Vec::new(),
            external_links: Vec::new(),
            json_ld: None,
            fetched_at: Utc::now(),
            depth,
            response_time_ms,
            content_length: 0,
            error: Some(error),
        }
    }

    /// Returns true if the fetch succeeded
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}
