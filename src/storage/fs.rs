//! Filesystem storage implementation
//!
//! Lays out a crawl directory as:
//!
//! ```text
//! <crawl dir>/
//!   manifest.json
//!   state.json          (only while the crawl is resumable)
//!   pages/<id>.html
//!   pages/<id>.txt
//!   pages/<id>.json
//! ```

use crate::output::CrawlManifest;
use crate::state::CrawlState;
use crate::storage::{PageRecord, Storage, StorageResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Manifest file name inside a crawl directory
pub const MANIFEST_FILE: &str = "manifest.json";

/// Checkpoint file name inside a crawl directory
pub const STATE_FILE: &str = "state.json";

/// Page artifact directory inside a crawl directory
pub const PAGES_DIR: &str = "pages";

/// Storage backed by a plain crawl directory
#[derive(Debug, Clone)]
pub struct FsStorage {
    root: PathBuf,
}

impl FsStorage {
    /// Creates a storage rooted at a crawl directory
    ///
    /// Nothing is touched on disk until [`Storage::prepare`] or a write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Path of the manifest file
    pub fn manifest_path(&self) -> PathBuf {
        self.root.join(MANIFEST_FILE)
    }

    /// Path of the checkpoint file
    pub fn state_path(&self) -> PathBuf {
        self.root.join(STATE_FILE)
    }

    /// Path of the page artifact directory
    pub fn pages_dir(&self) -> PathBuf {
        self.root.join(PAGES_DIR)
    }
}

impl Storage for FsStorage {
    fn location(&self) -> &Path {
        &self.root
    }

    fn prepare(&self) -> StorageResult<()> {
        fs::create_dir_all(self.pages_dir())?;
        Ok(())
    }

    fn save_page(&self, record: &PageRecord) -> StorageResult<()> {
        let pages = self.pages_dir();
        fs::create_dir_all(&pages)?;

        fs::write(pages.join(format!("{}.html", record.id)), &record.html)?;
        fs::write(pages.join(format!("{}.txt", record.id)), &record.text)?;
        write_json(&pages.join(format!("{}.json", record.id)), record)?;

        debug!("Saved page artifacts for {} as {}", record.url, record.id);
        Ok(())
    }

    fn save_manifest(&self, manifest: &CrawlManifest) -> StorageResult<()> {
        write_json(&self.manifest_path(), manifest)
    }

    fn load_manifest(&self) -> StorageResult<Option<CrawlManifest>> {
        read_json(&self.manifest_path())
    }

    fn save_state(&self, state: &CrawlState) -> StorageResult<()> {
        write_json(&self.state_path(), state)
    }

    fn load_state(&self) -> StorageResult<Option<CrawlState>> {
        read_json(&self.state_path())
    }

    fn clear_state(&self) -> StorageResult<()> {
        match fs::remove_file(self.state_path()) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Writes pretty JSON through a temporary file so readers never see a
/// half-written document
fn write_json<T: Serialize>(path: &Path, value: &T) -> StorageResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_vec_pretty(value)?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> StorageResult<Option<T>> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    Ok(Some(serde_json::from_slice(&bytes)?))
}
