//! Resume checkpoint definitions
//!
//! A checkpoint captures exactly what the fetch loop needs to continue: the
//! remaining frontier in order, the visited set and the running statistics.

use crate::output::CrawlStats;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A URL waiting in the frontier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FrontierItem {
    /// Normalized URL
    pub url: String,

    /// Link distance from the seed (seed is 0)
    pub depth: u32,
}

impl FrontierItem {
    pub fn new(url: impl Into<String>, depth: u32) -> Self {
        Self {
            url: url.into(),
            depth,
        }
    }
}

/// Persisted snapshot of an in-progress crawl
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlState {
    pub crawl_id: String,

    /// Remaining frontier, oldest first
    pub frontier: Vec<FrontierItem>,

    /// Normalized URLs already dequeued
    pub visited: Vec<String>,

    pub stats: CrawlStats,

    pub checkpoint_at: DateTime<Utc>,
}
