//! State module for tracking crawl progress
//!
//! This module provides the crawl phase machine and the resume checkpoint.
//!
//! # Components
//!
//! - `CrawlPhase`: The phase a crawl run is in and its legal transitions
//! - `CrawlState`: Persisted frontier, visited set and statistics for resume
//! - `FrontierItem`: A queued URL with its link depth

mod checkpoint;
mod crawl_phase;

// Re-export main types
pub use checkpoint::{CrawlState, FrontierItem};
pub use crawl_phase::CrawlPhase;
