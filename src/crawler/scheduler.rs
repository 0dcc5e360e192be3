//! Scheduler for managing the crawl frontier
//!
//! This module handles:
//! - The FIFO frontier queue (breadth-first order)
//! - The visited set that guarantees a URL is fetched at most once
//! - Deduplication of URLs already waiting in the queue
//! - Combining the configured delay with a robots.txt crawl delay

use crate::state::FrontierItem;
use std::collections::{HashSet, VecDeque};
use std::time::Duration;

/// Scheduler owns the frontier queue and the visited set
#[derive(Debug, Default)]
pub struct Scheduler {
    /// URLs waiting to be fetched, oldest first
    frontier: VecDeque<FrontierItem>,

    /// URLs currently in the frontier, for O(1) dedup
    queued: HashSet<String>,

    /// URLs already dequeued
    visited: HashSet<String>,
}

impl Scheduler {
    /// Creates an empty scheduler
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a scheduler from a checkpoint
    ///
    /// # Arguments
    ///
    /// * `frontier` - Remaining frontier, oldest first
    /// * `visited` - URLs already dequeued
    pub fn from_checkpoint(frontier: Vec<FrontierItem>, visited: Vec<String>) -> Self {
        let visited: HashSet<String> = visited.into_iter().collect();
        let mut scheduler = Self {
            visited,
            ..Self::default()
        };
        for item in frontier {
            scheduler.enqueue(item.url, item.depth);
        }
        scheduler
    }

    /// Adds a URL to the back of the frontier
    ///
    /// Returns false (and does nothing) if the URL was already visited or is
    /// already queued.
    pub fn enqueue(&mut self, url: String, depth: u32) -> bool {
        if self.visited.contains(&url) || self.queued.contains(&url) {
            return false;
        }

        self.queued.insert(url.clone());
        self.frontier.push_back(FrontierItem { url, depth });
        true
    }

    /// Removes and returns the oldest frontier item
    pub fn next_item(&mut self) -> Option<FrontierItem> {
        let item = self.frontier.pop_front()?;
        self.queued.remove(&item.url);
        Some(item)
    }

    /// Records a URL as visited; returns false if it already was
    pub fn mark_visited(&mut self, url: &str) -> bool {
        self.visited.insert(url.to_string())
    }

    /// Returns true if the URL has been visited
    pub fn is_visited(&self, url: &str) -> bool {
        self.visited.contains(url)
    }

    /// Number of URLs waiting in the frontier
    pub fn frontier_len(&self) -> usize {
        self.frontier.len()
    }

    /// Returns true if nothing is waiting in the frontier
    pub fn is_empty(&self) -> bool {
        self.frontier.is_empty()
    }

    /// Number of visited URLs
    pub fn visited_len(&self) -> usize {
        self.visited.len()
    }

    /// Copy of the frontier in queue order, for checkpoints
    pub fn frontier_snapshot(&self) -> Vec<FrontierItem> {
        self.frontier.iter().cloned().collect()
    }

    /// Visited URLs in sorted order, for checkpoints
    pub fn visited_snapshot(&self) -> Vec<String> {
        let mut visited: Vec<String> = self.visited.iter().cloned().collect();
        visited.sort();
        visited
    }
}

/// Calculates the effective delay between requests
///
/// Uses the maximum of:
/// - The configured delay
/// - The robots.txt crawl-delay, in seconds (if specified)
///
/// # Returns
///
/// The effective delay duration
pub fn effective_delay(config_delay: Duration, robots_delay_secs: Option<f64>) -> Duration {
    let robots_delay = robots_delay_secs
        .and_then(|seconds| Duration::try_from_secs_f64(seconds).ok())
        .unwrap_or(Duration::ZERO);

    std::cmp::max(config_delay, robots_delay)
}
