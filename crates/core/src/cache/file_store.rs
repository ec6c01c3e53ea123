//! Filesystem-backed metadata cache.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::fs;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use uuid::Uuid;

use super::{CacheError, CacheKey, Clock, SystemClock, FRESHNESS_WINDOW};
use crate::metrics::{CACHE_LOOKUPS, CACHE_WRITES};
use crate::normalize::decode_document;

/// Directory created under the configured cache path.
pub const CACHE_NAMESPACE: &str = "omdb";

/// Metadata cache stored as JSON files under `<cache_dir>/omdb`.
///
/// Writes go to a uniquely named temporary file that is renamed over the
/// entry, so readers only ever see complete documents. Concurrent writers to
/// the same key are not coordinated; the last rename wins.
#[derive(Clone)]
pub struct FileCache {
    root: PathBuf,
    clock: Arc<dyn Clock>,
}

impl FileCache {
    /// Create a cache rooted at `<cache_dir>/omdb`.
    pub fn new(cache_dir: impl AsRef<Path>) -> Self {
        Self {
            root: cache_dir.as_ref().join(CACHE_NAMESPACE),
            clock: Arc::new(SystemClock),
        }
    }

    /// Use a different clock for freshness checks.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the entry for a key.
    pub fn path_for(&self, key: &CacheKey) -> PathBuf {
        self.root.join(key.file_name())
    }

    /// Load a fresh entry.
    ///
    /// Returns `Ok(None)` when the entry is absent or older than the freshness
    /// window. An entry that exists but cannot be decoded is an error; it is
    /// removed so that the next call fetches a replacement.
    pub async fn load<T: DeserializeOwned>(
        &self,
        key: &CacheKey,
        cancel: &CancellationToken,
    ) -> Result<Option<T>, CacheError> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(CacheError::Cancelled),
            result = self.load_entry(key) => result,
        }
    }

    async fn load_entry<T: DeserializeOwned>(&self, key: &CacheKey) -> Result<Option<T>, CacheError> {
        let path = self.path_for(key);

        let metadata = match fs::metadata(&path).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                CACHE_LOOKUPS.with_label_values(&[key.kind(), "miss"]).inc();
                return Ok(None);
            }
            Err(e) => return Err(CacheError::Io { path, source: e }),
        };

        let modified = metadata.modified().map_err(|e| CacheError::Io {
            path: path.clone(),
            source: e,
        })?;
        if self.is_stale(modified) {
            debug!("Cache entry stale: {}", key);
            CACHE_LOOKUPS.with_label_values(&[key.kind(), "stale"]).inc();
            return Ok(None);
        }

        let bytes = fs::read(&path).await.map_err(|e| CacheError::Io {
            path: path.clone(),
            source: e,
        })?;

        match decode_document(&bytes) {
            Ok(document) => {
                debug!("Cache hit: {}", key);
                CACHE_LOOKUPS.with_label_values(&[key.kind(), "hit"]).inc();
                Ok(Some(document))
            }
            Err(source) => {
                CACHE_LOOKUPS.with_label_values(&[key.kind(), "corrupt"]).inc();
                warn!("Corrupt cache entry {:?}: {}", path, source);
                if let Err(e) = fs::remove_file(&path).await {
                    warn!("Failed to remove corrupt cache entry {:?}: {}", path, e);
                }
                Err(CacheError::Corrupt { path, source })
            }
        }
    }

    /// Write an entry, replacing any previous one and creating the namespace
    /// directory when missing.
    ///
    /// The write runs as a single blocking task that removes its temporary
    /// file on failure. Cancelling stops waiting for it; the task still runs
    /// to completion or cleans up, so no temporary file is left behind.
    pub async fn put<T: Serialize>(
        &self,
        key: &CacheKey,
        document: &T,
        cancel: &CancellationToken,
    ) -> Result<(), CacheError> {
        if cancel.is_cancelled() {
            return Err(CacheError::Cancelled);
        }

        let bytes = serde_json::to_vec(document).map_err(CacheError::Serialize)?;
        let root = self.root.clone();
        let path = self.path_for(key);
        let tmp = self.root.join(format!(
            ".{}.tmp-{}",
            key.file_name(),
            Uuid::new_v4().simple()
        ));

        let write = tokio::task::spawn_blocking(move || write_entry(&root, &tmp, &path, &bytes));

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(CacheError::Cancelled),
            joined = write => joined.unwrap_or_else(|e| {
                Err(CacheError::Io {
                    path: self.path_for(key),
                    source: std::io::Error::new(std::io::ErrorKind::Other, e),
                })
            }),
        };

        if result.is_ok() {
            debug!("Cache write: {}", key);
            CACHE_WRITES.with_label_values(&[key.kind()]).inc();
        }
        result
    }

    fn is_stale(&self, modified: SystemTime) -> bool {
        match self.clock.now().duration_since(modified) {
            Ok(age) => age > FRESHNESS_WINDOW,
            // Written "in the future" relative to our clock: treat as fresh.
            Err(_) => false,
        }
    }
}

impl std::fmt::Debug for FileCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileCache")
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}

/// Create the namespace, write `tmp` and rename it over `path`.
fn write_entry(root: &Path, tmp: &Path, path: &Path, bytes: &[u8]) -> Result<(), CacheError> {
    std::fs::create_dir_all(root).map_err(|e| CacheError::Io {
        path: root.to_path_buf(),
        source: e,
    })?;

    let written = std::fs::write(tmp, bytes)
        .map_err(|e| CacheError::Io {
            path: tmp.to_path_buf(),
            source: e,
        })
        .and_then(|()| {
            std::fs::rename(tmp, path).map_err(|e| CacheError::Io {
                path: path.to_path_buf(),
                source: e,
            })
        });

    if written.is_err() {
        if let Err(e) = std::fs::remove_file(tmp) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!("Failed to remove temporary cache file {:?}: {}", tmp, e);
            }
        }
    }
    written
}
