//! Metadata cache - one JSON document per title or season on disk.
//!
//! Entries are served without touching the network while they are younger
//! than [`FRESHNESS_WINDOW`]; older entries read as a miss and get replaced.

mod file_store;

pub use file_store::{FileCache, CACHE_NAMESPACE};

use std::fmt;
use std::path::PathBuf;
use std::time::{Duration, SystemTime};

use thiserror::Error;

use crate::ids::ImdbId;

/// Age after which a cached document must be refetched.
pub const FRESHNESS_WINDOW: Duration = Duration::from_secs(24 * 60 * 60);

/// Errors that can occur while reading or writing cache entries.
#[derive(Debug, Error)]
pub enum CacheError {
    /// Filesystem access failed.
    #[error("Cache I/O failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Entry exists but cannot be decoded.
    #[error("Corrupt cache entry {path}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Document could not be serialized for writing.
    #[error("Failed to serialize cache entry: {0}")]
    Serialize(#[source] serde_json::Error),

    /// The caller cancelled the operation.
    #[error("Cache operation cancelled")]
    Cancelled,
}

/// Identity of one cache entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// Detail document for a title.
    Item(ImdbId),
    /// Full season document for a series.
    Season { series_id: ImdbId, season: u32 },
}

impl CacheKey {
    /// File name inside the cache namespace.
    pub fn file_name(&self) -> String {
        match self {
            CacheKey::Item(id) => format!("{}.json", id),
            CacheKey::Season { series_id, season } => {
                format!("{}_season_{}.json", series_id, season)
            }
        }
    }

    /// Label used in logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            CacheKey::Item(_) => "item",
            CacheKey::Season { .. } => "season",
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheKey::Item(id) => write!(f, "{}", id),
            CacheKey::Season { series_id, season } => write!(f, "{} season {}", series_id, season),
        }
    }
}

/// Source of "now" for freshness checks.
pub trait Clock: Send + Sync {
    fn now(&self) -> SystemTime;
}

/// Wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_file_name() {
        let key = CacheKey::Item(ImdbId::new("tt1375666").unwrap());
        assert_eq!(key.file_name(), "tt1375666.json");
        assert_eq!(key.kind(), "item");
    }

    #[test]
    fn test_season_file_name() {
        let key = CacheKey::Season {
            series_id: ImdbId::new("0903747").unwrap(),
            season: 3,
        };
        assert_eq!(key.file_name(), "tt0903747_season_3.json");
        assert_eq!(key.to_string(), "tt0903747 season 3");
    }
}
