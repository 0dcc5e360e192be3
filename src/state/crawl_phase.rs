/// Crawl phase definitions
///
/// This module defines the phases a crawl run moves through and which moves
/// between them are legal.
use crate::HarvestError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Represents the current phase of a crawl run
///
/// ```text
/// Init -> FetchingRobots -> Crawling -> Completed
/// Init -> Resuming ------> Crawling
/// (any) -> Failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrawlPhase {
    /// Configuration resolved, nothing fetched yet
    Init,

    /// Fetching and parsing robots.txt for a fresh crawl
    FetchingRobots,

    /// Restoring frontier, visited set and statistics from a checkpoint
    Resuming,

    /// Running the fetch loop
    Crawling,

    // ===== Terminal States =====
    /// Frontier drained or page budget reached
    Completed,

    /// A crawl-level error aborted the run
    Failed,
}

impl CrawlPhase {
    /// Returns true if no further transitions are expected
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Returns true if moving from this phase to `next` is legal
    pub fn can_transition_to(&self, next: CrawlPhase) -> bool {
        matches!(
            (self, next),
            (Self::Init, Self::FetchingRobots)
                | (Self::Init, Self::Resuming)
                | (Self::FetchingRobots, Self::Crawling)
                | (Self::Resuming, Self::Crawling)
                | (Self::Crawling, Self::Completed)
                | (_, Self::Failed)
        )
    }

    /// Moves to `next`, rejecting illegal transitions
    pub fn transition(&mut self, next: CrawlPhase) -> crate::Result<()> {
        if !self.can_transition_to(next) {
            return Err(HarvestError::InvalidTransition {
                from: *self,
                to: next,
            });
        }

        *self = next;
        Ok(())
    }

    /// Returns the lowercase name of the phase
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::FetchingRobots => "fetching_robots",
            Self::Resuming => "resuming",
            Self::Crawling => "crawling",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for CrawlPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
