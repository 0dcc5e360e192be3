//! Crawl statistics
//!
//! This module keeps the running aggregate statistics of a crawl and prints
//! them for a finished crawl.

use crate::extract::PageType;
use crate::output::CrawlManifest;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Aggregate statistics for one crawl
///
/// Carried in both the manifest and the resume checkpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlStats {
    /// Fetches attempted
    pub pages_requested: u64,

    /// Fetches that produced a page record
    pub pages_succeeded: u64,

    /// Fetches that failed
    pub pages_failed: u64,

    /// Sum of successful body sizes in bytes
    pub total_bytes: u64,

    /// Running average latency of successful fetches
    pub avg_response_time_ms: f64,

    /// Successful pages per page type
    pub page_types: BTreeMap<PageType, u64>,
}

impl CrawlStats {
    /// Records a successful fetch
    pub fn record_success(&mut self, page_type: PageType, bytes: u64, response_time_ms: u64) {
        self.pages_requested += 1;
        self.pages_succeeded += 1;
        self.total_bytes += bytes;

        let n = self.pages_succeeded as f64;
        self.avg_response_time_ms += (response_time_ms as f64 - self.avg_response_time_ms) / n;

        *self.page_types.entry(page_type).or_insert(0) += 1;
    }

    /// Records a failed fetch
    pub fn record_failure(&mut self) {
        self.pages_requested += 1;
        self.pages_failed += 1;
    }

    /// Share of requested pages that succeeded, in percent
    pub fn success_rate(&self) -> f64 {
        if self.pages_requested == 0 {
            return 0.0;
        }
        (self.pages_succeeded as f64 / self.pages_requested as f64) * 100.0
    }
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `manifest` - The manifest of the crawl to display
pub fn print_statistics(manifest: &CrawlManifest) {
    let stats = &manifest.stats;

    println!("=== Crawl Statistics ===\n");

    println!("Overview:");
    println!("  Crawl: {}", manifest.crawl_id);
    println!("  Seed URL: {}", manifest.seed_url);
    println!("  Started: {}", manifest.started_at.to_rfc3339());
    match manifest.completed_at {
        Some(completed) => {
            let duration = (completed - manifest.started_at).num_seconds();
            println!("  Completed: {} ({}s)", completed.to_rfc3339(), duration);
        }
        None => println!("  Completed: no (resumable)"),
    }
    println!();

    println!("Requests:");
    println!("  Pages requested: {}", stats.pages_requested);
    println!("  Pages succeeded: {}", stats.pages_succeeded);
    println!("  Pages failed: {}", stats.pages_failed);
    println!("  Total bytes: {}", stats.total_bytes);
    println!("  Average response time: {:.0} ms", stats.avg_response_time_ms);
    println!();

    if !stats.page_types.is_empty() {
        println!("Pages by Type:");
        // Sort types by count (descending)
        let mut type_counts: Vec<_> = stats.page_types.iter().collect();
        type_counts.sort_by(|a, b| b.1.cmp(a.1));

        for (page_type, count) in type_counts {
            let percentage = if stats.pages_succeeded > 0 {
                (*count as f64 / stats.pages_succeeded as f64) * 100.0
            } else {
                0.0
            };
            println!("  {}: {} ({:.1}%)", page_type, count, percentage);
        }
        println!();
    }

    if !manifest.errors.is_empty() {
        println!("Errors ({}):", manifest.errors.len());
        for entry in &manifest.errors {
            println!("  [{}] {} - {}", entry.status, entry.url, entry.error);
        }
        println!();
    }

    println!(
        "Success Rate: {:.1}% ({} / {} pages successfully fetched)",
        stats.success_rate(),
        stats.pages_succeeded,
        stats.pages_requested
    );
}
