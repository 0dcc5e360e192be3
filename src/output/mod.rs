//! Output module for crawl manifests and statistics
//!
//! This module handles:
//! - The crawl manifest written next to the page artifacts
//! - Aggregate crawl statistics and their console report

mod manifest;
pub mod stats;

pub use manifest::{CrawlManifest, ErrorEntry, PageSummary};
pub use stats::{print_statistics, CrawlStats};
