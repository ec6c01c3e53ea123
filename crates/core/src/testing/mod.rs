//! Testing utilities and mock implementations.
//!
//! This module provides a mock catalog and a controllable clock so the whole
//! pipeline can be exercised without a network or real time passing.
//!
//! # Example
//!
//! ```rust,ignore
//! use omdb_core::testing::{fixtures, ManualClock, MockCatalog};
//!
//! let catalog = Arc::new(MockCatalog::new());
//! catalog.add_item(fixtures::movie_document("tt1375666", "Inception", "2010")).await;
//!
//! let clock = Arc::new(ManualClock::new(SystemTime::now()));
//! let cache = FileCache::new(dir.path()).with_clock(clock.clone());
//! ```

mod mock_catalog;

pub use mock_catalog::{MockCatalog, RecordedCatalogQuery, MOCK_IMAGE_BASE_URL};

use std::sync::Mutex;
use std::time::{Duration, SystemTime};

use crate::cache::Clock;

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<SystemTime>,
}

impl ManualClock {
    pub fn new(now: SystemTime) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn set(&self, now: SystemTime) {
        *self.now.lock().unwrap_or_else(|e| e.into_inner()) = now;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> SystemTime {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::catalog::{MetadataDocument, OmdbRating, SearchResult, SeasonDocument};
    use crate::ids::IMDB_PROVIDER_KEY;
    use crate::resolver::LookupInfo;

    /// A movie detail document with reasonable defaults.
    pub fn movie_document(imdb_id: &str, title: &str, year: &str) -> MetadataDocument {
        MetadataDocument {
            title: Some(title.to_string()),
            year: Some(year.to_string()),
            rated: Some("PG-13".to_string()),
            released: Some(format!("16 Jul {}", year)),
            genre: Some("Action, Sci-Fi".to_string()),
            director: Some("Jane Director".to_string()),
            writer: Some("John Writer".to_string()),
            actors: Some("First Actor, Second Actor".to_string()),
            plot: Some(format!("The plot of {}.", title)),
            ratings: vec![OmdbRating {
                source: Some("Rotten Tomatoes".to_string()),
                value: Some("87%".to_string()),
            }],
            imdb_rating: Some("8.8".to_string()),
            imdb_votes: Some("1,234".to_string()),
            imdb_id: Some(imdb_id.to_string()),
            kind: Some("movie".to_string()),
            response: Some("True".to_string()),
            ..Default::default()
        }
    }

    /// An episode document as it appears inside a full season.
    pub fn episode_document(imdb_id: &str, episode: u32) -> MetadataDocument {
        MetadataDocument {
            title: Some(format!("Episode {}", episode)),
            year: Some("2008".to_string()),
            imdb_id: Some(imdb_id.to_string()),
            imdb_rating: Some("8.2".to_string()),
            kind: Some("episode".to_string()),
            episode: Some(episode),
            ..Default::default()
        }
    }

    /// A season document holding `(id, episode number)` episodes in order.
    pub fn season_document(series_id: &str, season: u32, episodes: &[(&str, u32)]) -> SeasonDocument {
        SeasonDocument {
            title: Some("Test Series".to_string()),
            series_id: Some(series_id.to_string()),
            season: Some(season),
            total_seasons: Some(5),
            episodes: episodes
                .iter()
                .map(|(id, number)| episode_document(id, *number))
                .collect(),
            response: Some("True".to_string()),
            error: None,
        }
    }

    /// One multi-result search candidate.
    pub fn search_result(title: &str, year: &str, imdb_id: &str) -> SearchResult {
        SearchResult {
            title: Some(title.to_string()),
            year: Some(year.to_string()),
            imdb_id: Some(imdb_id.to_string()),
            kind: Some("movie".to_string()),
            ..Default::default()
        }
    }

    /// Lookup info for an English/US library.
    pub fn lookup_info(name: &str, year: Option<i32>) -> LookupInfo {
        LookupInfo {
            name: Some(name.to_string()),
            year,
            metadata_language: Some("en".to_string()),
            metadata_country_code: Some("US".to_string()),
            ..Default::default()
        }
    }

    /// Lookup info for an episode of a known series.
    pub fn episode_info(series_id: &str, season: u32, episode: u32) -> LookupInfo {
        let mut info = lookup_info(&format!("Episode {}", episode), None);
        info.series_provider_ids
            .insert(IMDB_PROVIDER_KEY.to_string(), series_id.to_string());
        info.parent_index_number = Some(season);
        info.index_number = Some(episode);
        info
    }
}
