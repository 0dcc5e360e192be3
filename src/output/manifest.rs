//! Crawl manifest
//!
//! The manifest is the durable record of one crawl: its resolved
//! configuration, aggregate statistics, one summary per fetched page and one
//! entry per failed fetch. It is rewritten at every checkpoint and once more
//! when the crawl finishes.

use crate::config::CrawlConfig;
use crate::extract::PageType;
use crate::output::CrawlStats;
use crate::storage::PageRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Short description of a successfully fetched page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSummary {
    pub url: String,
    pub id: String,
    pub title: Option<String>,
    pub page_type: PageType,
    pub depth: u32,
    pub status: u16,
    pub content_length: u64,
    pub fetched_at: DateTime<Utc>,
}

impl From<&PageRecord> for PageSummary {
    fn from(record: &PageRecord) -> Self {
        Self {
            url: record.url.clone(),
            id: record.id.clone(),
            title: record.metadata.title.clone(),
            page_type: record.page_type,
            depth: record.depth,
            status: record.status,
            content_length: record.content_length,
            fetched_at: record.fetched_at,
        }
    }
}

/// A failed fetch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorEntry {
    pub url: String,
    pub depth: u32,
    /// Real or inferred HTTP status; 0 when unknown
    pub status: u16,
    pub error: String,
    pub timestamp: DateTime<Utc>,
}

/// Durable record of a crawl's configuration, progress and outcomes
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlManifest {
    pub crawl_id: String,
    pub seed_url: String,
    pub domain: String,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub config: CrawlConfig,
    pub stats: CrawlStats,
    pub pages: Vec<PageSummary>,
    pub errors: Vec<ErrorEntry>,
}

impl CrawlManifest {
    /// Creates an empty manifest for a crawl that is about to start
    pub fn new(
        crawl_id: impl Into<String>,
        domain: impl Into<String>,
        config: CrawlConfig,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            crawl_id: crawl_id.into(),
            seed_url: config.seed_url.clone(),
            domain: domain.into(),
            started_at,
            completed_at: None,
            config,
            stats: CrawlStats::default(),
            pages: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Records a fetched page
    pub fn add_page(&mut self, record: &PageRecord) {
        self.pages.push(PageSummary::from(record));
    }

    /// Records a failed fetch
    pub fn add_error(&mut self, record: &PageRecord) {
        self.errors.push(ErrorEntry {
            url: record.url.clone(),
            depth: record.depth,
            status: record.status,
            error: record.error.clone().unwrap_or_default(),
            timestamp: record.fetched_at,
        });
    }

    /// Returns true once the crawl has finished
    pub fn is_complete(&self) -> bool {
        self.completed_at.is_some()
    }
}
