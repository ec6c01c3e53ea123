//! Lookup inputs and search projections.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::catalog::{SearchResult, SubjectKind};
use crate::ids::{IdError, ImdbId, IMDB_PROVIDER_KEY};
use crate::normalize::{non_blank, parse_date, parse_name_year, parse_year};

/// Provider name reported on every search projection and image.
pub const PROVIDER_NAME: &str = "The Open Movie Database";

/// Identifying information supplied by the host for one subject.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LookupInfo {
    pub name: Option<String>,
    pub year: Option<i32>,
    /// Host provider ids; the IMDb id lives under `"Imdb"`.
    pub provider_ids: HashMap<String, String>,
    /// Episode number, for episodes.
    pub index_number: Option<u32>,
    pub index_number_end: Option<u32>,
    /// Season number, for episodes.
    pub parent_index_number: Option<u32>,
    pub metadata_language: Option<String>,
    pub metadata_country_code: Option<String>,
    /// Provider ids of the owning series, for episodes.
    pub series_provider_ids: HashMap<String, String>,
    pub is_missing_episode: bool,
}

impl LookupInfo {
    /// The subject's own IMDb id. Blank means absent.
    pub fn imdb_id(&self) -> Result<Option<ImdbId>, IdError> {
        ImdbId::parse_optional(self.provider_ids.get(IMDB_PROVIDER_KEY).map(String::as_str))
    }

    /// The owning series' IMDb id. Blank means absent.
    pub fn series_imdb_id(&self) -> Result<Option<ImdbId>, IdError> {
        ImdbId::parse_optional(
            self.series_provider_ids
                .get(IMDB_PROVIDER_KEY)
                .map(String::as_str),
        )
    }
}

/// A resolver request built from [`LookupInfo`]. Never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct LookupQuery {
    pub name: String,
    pub year: Option<i32>,
    pub kind: SubjectKind,
    pub season: Option<u32>,
    pub episode: Option<u32>,
    pub episode_end: Option<u32>,
    /// The subject's id, or the series id for episodes.
    pub known_id: Option<ImdbId>,
}

impl LookupQuery {
    /// Build a query from host info.
    ///
    /// A year embedded in the name (`"Title (1999)"`) is only used when no
    /// explicit year is given.
    pub fn from_info(info: &LookupInfo, kind: SubjectKind) -> Result<Self, IdError> {
        let (name, embedded_year) = parse_name_year(info.name.as_deref().unwrap_or_default());

        let known_id = match kind {
            SubjectKind::Episode => info.series_imdb_id()?,
            _ => info.imdb_id()?,
        };

        let (season, episode, episode_end) = match kind {
            SubjectKind::Episode => (
                info.parent_index_number,
                info.index_number,
                info.index_number_end,
            ),
            _ => (None, None, None),
        };

        Ok(Self {
            name,
            year: info.year.or(embedded_year),
            kind,
            season,
            episode,
            episode_end,
            known_id,
        })
    }

    /// Query for a title search.
    pub fn title(name: impl Into<String>, year: Option<i32>, kind: SubjectKind) -> Self {
        Self {
            name: name.into(),
            year,
            kind,
            season: None,
            episode: None,
            episode_end: None,
            known_id: None,
        }
    }

    /// Whether the known id can be used without searching. Episodes need the
    /// series id plus both position numbers.
    pub fn is_direct(&self) -> bool {
        match self.kind {
            SubjectKind::Episode => {
                self.known_id.is_some() && self.season.is_some() && self.episode.is_some()
            }
            _ => self.known_id.is_some(),
        }
    }
}

/// One search candidate projected for the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteSearchResult {
    pub name: Option<String>,
    pub imdb_id: Option<ImdbId>,
    pub production_year: Option<i32>,
    pub premiere_date: Option<NaiveDate>,
    pub image_url: Option<String>,
    pub index_number: Option<u32>,
    pub parent_index_number: Option<u32>,
    pub index_number_end: Option<u32>,
    pub search_provider_name: String,
}

impl RemoteSearchResult {
    /// Project a raw candidate, carrying the query's episode position.
    pub(crate) fn project(result: SearchResult, query: &LookupQuery) -> Self {
        Self {
            name: result.title,
            // A malformed id from the catalog just leaves the candidate unkeyed.
            imdb_id: ImdbId::parse_optional(result.imdb_id.as_deref())
                .ok()
                .flatten(),
            production_year: result.year.as_deref().and_then(parse_year),
            premiere_date: non_blank(result.released.as_deref()).and_then(parse_date),
            image_url: non_blank(result.poster.as_deref()).map(str::to_string),
            index_number: query.episode,
            parent_index_number: query.season,
            index_number_end: query.episode_end,
            search_provider_name: PROVIDER_NAME.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info_with_name(name: &str) -> LookupInfo {
        LookupInfo {
            name: Some(name.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_embedded_year_used_without_explicit_year() {
        let query =
            LookupQuery::from_info(&info_with_name("The Matrix (1999)"), SubjectKind::Movie)
                .unwrap();
        assert_eq!(query.name, "The Matrix");
        assert_eq!(query.year, Some(1999));
        assert!(!query.is_direct());
    }

    #[test]
    fn test_explicit_year_wins() {
        let mut info = info_with_name("The Matrix (1999)");
        info.year = Some(2003);
        let query = LookupQuery::from_info(&info, SubjectKind::Movie).unwrap();
        assert_eq!(query.name, "The Matrix");
        assert_eq!(query.year, Some(2003));
    }

    #[test]
    fn test_known_id_is_normalized() {
        let mut info = info_with_name("Inception");
        info.provider_ids
            .insert(IMDB_PROVIDER_KEY.to_string(), "1375666".to_string());
        let query = LookupQuery::from_info(&info, SubjectKind::Movie).unwrap();
        assert_eq!(query.known_id.as_ref().unwrap().as_str(), "tt1375666");
        assert!(query.is_direct());
    }

    #[test]
    fn test_blank_id_is_absent() {
        let mut info = info_with_name("Inception");
        info.provider_ids
            .insert(IMDB_PROVIDER_KEY.to_string(), "  ".to_string());
        let query = LookupQuery::from_info(&info, SubjectKind::Movie).unwrap();
        assert!(query.known_id.is_none());
    }

    #[test]
    fn test_malformed_id_is_an_error() {
        let mut info = info_with_name("Inception");
        info.provider_ids
            .insert(IMDB_PROVIDER_KEY.to_string(), "tt 12/3".to_string());
        let result = LookupQuery::from_info(&info, SubjectKind::Movie);
        assert!(matches!(result, Err(IdError::Malformed(_))));
    }

    #[test]
    fn test_episode_uses_series_id_and_position() {
        let mut info = info_with_name("Pilot");
        info.provider_ids
            .insert(IMDB_PROVIDER_KEY.to_string(), "tt0959621".to_string());
        info.series_provider_ids
            .insert(IMDB_PROVIDER_KEY.to_string(), "tt0903747".to_string());
        info.parent_index_number = Some(1);
        info.index_number = Some(1);

        let query = LookupQuery::from_info(&info, SubjectKind::Episode).unwrap();
        assert_eq!(query.known_id.as_ref().unwrap().as_str(), "tt0903747");
        assert_eq!(query.season, Some(1));
        assert_eq!(query.episode, Some(1));
        assert!(query.is_direct());

        info.index_number = None;
        let partial = LookupQuery::from_info(&info, SubjectKind::Episode).unwrap();
        assert!(!partial.is_direct());
    }

    #[test]
    fn test_project_candidate() {
        let mut query = LookupQuery::title("Pilot", None, SubjectKind::Episode);
        query.season = Some(1);
        query.episode = Some(2);

        let projected = RemoteSearchResult::project(
            SearchResult {
                title: Some("Cat's in the Bag...".to_string()),
                year: Some("2008–2013".to_string()),
                released: Some("27 Jan 2008".to_string()),
                poster: Some("   ".to_string()),
                imdb_id: Some("tt1054724".to_string()),
                ..Default::default()
            },
            &query,
        );

        assert_eq!(projected.production_year, Some(2008));
        assert_eq!(projected.premiere_date, NaiveDate::from_ymd_opt(2008, 1, 27));
        assert!(projected.image_url.is_none());
        assert_eq!(projected.imdb_id.unwrap().as_str(), "tt1054724");
        assert_eq!(projected.parent_index_number, Some(1));
        assert_eq!(projected.index_number, Some(2));
        assert_eq!(projected.search_provider_name, PROVIDER_NAME);
    }
}
