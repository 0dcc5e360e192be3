//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::output::CrawlManifest;
use crate::state::CrawlState;
use crate::storage::PageRecord;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// One storage value covers one crawl directory.
pub trait Storage {
    /// Location of the crawl this storage writes to
    fn location(&self) -> &Path;

    /// Creates whatever the backend needs before the first write
    fn prepare(&self) -> StorageResult<()>;

    // ===== Pages =====

    /// Persists the artifacts of a fetched page
    fn save_page(&self, record: &PageRecord) -> StorageResult<()>;

    // ===== Manifest =====

    /// Writes the crawl manifest, replacing any previous one
    fn save_manifest(&self, manifest: &CrawlManifest) -> StorageResult<()>;

    /// Reads the crawl manifest, if one has been written
    fn load_manifest(&self) -> StorageResult<Option<CrawlManifest>>;

    // ===== Checkpoint =====

    /// Writes the resume checkpoint, replacing any previous one
    fn save_state(&self, state: &CrawlState) -> StorageResult<()>;

    /// Reads the resume checkpoint, if one exists
    fn load_state(&self) -> StorageResult<Option<CrawlState>>;

    /// Deletes the resume checkpoint; a missing checkpoint is not an error
    fn clear_state(&self) -> StorageResult<()>;
}
