//! Crawler module for web page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - Page fetching, directly or through a rendering proxy
//! - Frontier scheduling and politeness delays
//! - Overall crawl coordination, checkpointing and resumption

mod coordinator;
mod fetcher;
mod scheduler;

pub use coordinator::{resume_config, Coordinator};
pub use fetcher::{
    build_fetcher, build_http_client, infer_status_code, FetchError, FetchedPage, HttpFetcher,
    PageFetcher, RenderProxyFetcher, VisitedCheck, MAX_REDIRECTS,
};
pub use scheduler::{effective_delay, Scheduler};

use crate::config::CrawlConfig;
use crate::state::CrawlPhase;
use std::path::{Path, PathBuf};
use tracing::error;

/// Outcome of a crawl run
///
/// A crawl that stops because of its page budget is still a success; only
/// errors that abort the run (bad configuration, storage failures) are not.
#[derive(Debug, Clone, PartialEq)]
pub struct CrawlResult {
    pub success: bool,
    pub phase: CrawlPhase,
    pub crawl_id: Option<String>,
    pub crawl_dir: Option<PathBuf>,
    pub manifest_path: Option<PathBuf>,
    pub pages_succeeded: u64,
    pub pages_failed: u64,
    pub frontier_remaining: usize,
    pub error: Option<String>,
}

impl CrawlResult {
    /// Result for a crawl that could not get started
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            phase: CrawlPhase::Failed,
            crawl_id: None,
            crawl_dir: None,
            manifest_path: None,
            pages_succeeded: 0,
            pages_failed: 0,
            frontier_remaining: 0,
            error: Some(error.into()),
        }
    }
}

/// Runs a complete crawl operation
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Validate the configuration and create the crawl directory
/// 2. Fetch and parse robots.txt
/// 3. Fetch pages breadth-first from the seed, extracting each one
/// 4. Checkpoint periodically so the crawl can be resumed
/// 5. Write the final manifest
///
/// Errors are reported in the returned [`CrawlResult`] rather than raised.
///
/// # Arguments
///
/// * `config` - The crawl configuration
pub async fn crawl(config: CrawlConfig) -> CrawlResult {
    let fetcher = match build_fetcher(&config) {
        Ok(fetcher) => fetcher,
        Err(e) => {
            error!("Failed to set up fetcher: {}", e);
            return CrawlResult::failed(e.to_string());
        }
    };

    match Coordinator::start(config, fetcher).await {
        Ok(coordinator) => coordinator.run().await,
        Err(e) => {
            error!("Failed to start crawl: {}", e);
            CrawlResult::failed(e.to_string())
        }
    }
}

/// Continues an interrupted crawl from its checkpoint
///
/// # Arguments
///
/// * `state_path` - The checkpoint file or the crawl directory holding it
/// * `fallback` - Configuration to use when the crawl's manifest is missing
pub async fn resume(state_path: &Path, fallback: Option<CrawlConfig>) -> CrawlResult {
    let config = match resume_config(state_path, fallback) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to resume crawl: {}", e);
            return CrawlResult::failed(e.to_string());
        }
    };

    let fetcher = match build_fetcher(&config) {
        Ok(fetcher) => fetcher,
        Err(e) => {
            error!("Failed to set up fetcher: {}", e);
            return CrawlResult::failed(e.to_string());
        }
    };

    match Coordinator::restore(state_path, Some(config), fetcher).await {
        Ok(coordinator) => coordinator.run().await,
        Err(e) => {
            error!("Failed to resume crawl: {}", e);
            CrawlResult::failed(e.to_string())
        }
    }
}
