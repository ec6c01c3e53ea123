//! Types for OMDb API responses and requests.

use serde::{Deserialize, Serialize};

use crate::ids::ImdbId;
use crate::normalize::{lenient_u32, non_blank, parse_percent};

/// Rating source whose score becomes the critic rating.
pub const CRITIC_RATING_SOURCE: &str = "Rotten Tomatoes";

// ============================================================================
// Subject kinds
// ============================================================================

/// The kind of subject being enriched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubjectKind {
    Movie,
    Series,
    Episode,
    Trailer,
}

impl SubjectKind {
    /// Value of the catalog's `type` filter. Trailers are catalogued as movies.
    pub fn api_type(&self) -> &'static str {
        match self {
            SubjectKind::Movie | SubjectKind::Trailer => "movie",
            SubjectKind::Series => "series",
            SubjectKind::Episode => "episode",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SubjectKind::Movie => "movie",
            SubjectKind::Series => "series",
            SubjectKind::Episode => "episode",
            SubjectKind::Trailer => "trailer",
        }
    }
}

impl std::str::FromStr for SubjectKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "movie" => Ok(SubjectKind::Movie),
            "series" => Ok(SubjectKind::Series),
            "episode" => Ok(SubjectKind::Episode),
            "trailer" => Ok(SubjectKind::Trailer),
            other => Err(format!("unknown subject kind: {}", other)),
        }
    }
}

// ============================================================================
// Requests
// ============================================================================

/// How the catalog identifies the subject of a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryTarget {
    /// Direct lookup by id (`i=`), single-document response.
    Id(ImdbId),
    /// Best title match (`t=`), single-document response.
    Title(String),
    /// Free search (`s=`), list response.
    Search(String),
}

/// Response shape a request produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseMode {
    Single,
    List,
}

/// Plot length requested from the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlotLength {
    Short,
    Full,
}

impl PlotLength {
    fn as_str(&self) -> &'static str {
        match self {
            PlotLength::Short => "short",
            PlotLength::Full => "full",
        }
    }
}

/// Parameters of one catalog request. The API key is added by the client.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogQuery {
    pub target: QueryTarget,
    pub year: Option<i32>,
    pub kind: Option<SubjectKind>,
    pub season: Option<u32>,
    pub episode: Option<u32>,
    pub plot: Option<PlotLength>,
    pub tomatoes: bool,
    pub full_detail: bool,
}

impl CatalogQuery {
    fn new(target: QueryTarget) -> Self {
        Self {
            target,
            year: None,
            kind: None,
            season: None,
            episode: None,
            plot: None,
            tomatoes: false,
            full_detail: false,
        }
    }

    /// Full item detail: `i=<id>&plot=short&tomatoes=true`.
    pub fn item(id: &ImdbId) -> Self {
        Self {
            plot: Some(PlotLength::Short),
            tomatoes: true,
            ..Self::new(QueryTarget::Id(id.clone()))
        }
    }

    /// Whole season with full episode documents: `i=<id>&season=N&detail=full`.
    pub fn season(series_id: &ImdbId, season: u32) -> Self {
        Self {
            season: Some(season),
            full_detail: true,
            ..Self::new(QueryTarget::Id(series_id.clone()))
        }
    }

    /// Identification request used by the resolver (`plot=full`).
    pub fn lookup(target: QueryTarget) -> Self {
        Self {
            plot: Some(PlotLength::Full),
            ..Self::new(target)
        }
    }

    /// Which response shape to decode.
    pub fn mode(&self) -> ResponseMode {
        match self.target {
            QueryTarget::Search(_) => ResponseMode::List,
            QueryTarget::Id(_) | QueryTarget::Title(_) => ResponseMode::Single,
        }
    }

    /// Query-string pairs in a stable order.
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();

        match &self.target {
            QueryTarget::Id(id) => params.push(("i", id.to_string())),
            QueryTarget::Title(title) => params.push(("t", title.clone())),
            QueryTarget::Search(text) => params.push(("s", text.clone())),
        }
        if let Some(year) = self.year {
            params.push(("y", year.to_string()));
        }
        if let Some(kind) = self.kind {
            params.push(("type", kind.api_type().to_string()));
        }
        if let Some(season) = self.season {
            params.push(("Season", season.to_string()));
        }
        if let Some(episode) = self.episode {
            params.push(("Episode", episode.to_string()));
        }
        if let Some(plot) = self.plot {
            params.push(("plot", plot.as_str().to_string()));
        }
        if self.tomatoes {
            params.push(("tomatoes", "true".to_string()));
        }
        if self.full_detail {
            params.push(("detail", "full".to_string()));
        }
        params.push(("r", "json".to_string()));

        params
    }
}

// ============================================================================
// Documents
// ============================================================================

/// One entry of a document's `Ratings` list.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct OmdbRating {
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
}

/// Full detail for one title, as returned by `i=` or `t=` lookups and as
/// each entry of a full season response.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct MetadataDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rated: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub released: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime: Option<String>,
    /// Comma-joined genre names.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub director: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub writer: Option<String>,
    /// Comma-joined actor names.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actors: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plot: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub awards: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poster: Option<String>,
    #[serde(default, deserialize_with = "deserialize_ratings")]
    pub ratings: Vec<OmdbRating>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metascore: Option<String>,
    #[serde(rename = "imdbRating", default, skip_serializing_if = "Option::is_none")]
    pub imdb_rating: Option<String>,
    #[serde(rename = "imdbVotes", default, skip_serializing_if = "Option::is_none")]
    pub imdb_votes: Option<String>,
    #[serde(rename = "imdbID", default, skip_serializing_if = "Option::is_none")]
    pub imdb_id: Option<String>,
    #[serde(rename = "Type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(rename = "DVD", default, skip_serializing_if = "Option::is_none")]
    pub dvd: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub box_office: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub production: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    /// Success marker, `"True"` or `"False"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Episode number, present on season-scoped documents.
    #[serde(
        default,
        deserialize_with = "lenient_u32",
        skip_serializing_if = "Option::is_none"
    )]
    pub episode: Option<u32>,
}

impl MetadataDocument {
    /// Whether the catalog reported a match. Documents without a marker
    /// (season episodes) count as found.
    pub fn is_found(&self) -> bool {
        !is_false_marker(self.response.as_deref())
    }

    /// Score of the critic rating source, if the document lists one.
    pub fn critic_score(&self) -> Option<f32> {
        self.ratings
            .iter()
            .find(|r| {
                r.source
                    .as_deref()
                    .is_some_and(|s| s.eq_ignore_ascii_case(CRITIC_RATING_SOURCE))
            })
            .and_then(|r| r.value.as_deref())
            .and_then(parse_percent)
    }
}

/// A full season, keyed by (series id, season number).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SeasonDocument {
    #[serde(rename = "Title", default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(rename = "seriesID", default, skip_serializing_if = "Option::is_none")]
    pub series_id: Option<String>,
    #[serde(
        rename = "Season",
        default,
        deserialize_with = "lenient_u32",
        skip_serializing_if = "Option::is_none"
    )]
    pub season: Option<u32>,
    #[serde(
        rename = "totalSeasons",
        default,
        deserialize_with = "lenient_u32",
        skip_serializing_if = "Option::is_none"
    )]
    pub total_seasons: Option<u32>,
    #[serde(rename = "Episodes", default, deserialize_with = "deserialize_episodes")]
    pub episodes: Vec<MetadataDocument>,
    #[serde(rename = "Response", default, skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    #[serde(rename = "Error", default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SeasonDocument {
    pub fn is_found(&self) -> bool {
        !is_false_marker(self.response.as_deref())
    }

    /// Pick an episode: an id match wins, the episode number is the fallback.
    pub fn find_episode(
        &self,
        episode_id: Option<&ImdbId>,
        episode_number: u32,
    ) -> Option<&MetadataDocument> {
        let by_id = episode_id.and_then(|id| {
            self.episodes.iter().find(|e| {
                e.imdb_id
                    .as_deref()
                    .is_some_and(|candidate| candidate.eq_ignore_ascii_case(id.as_str()))
            })
        });

        by_id.or_else(|| {
            self.episodes
                .iter()
                .find(|e| e.episode == Some(episode_number))
        })
    }
}

/// One candidate of a search, or the body of a single-result lookup.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct SearchResult {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub year: Option<String>,
    #[serde(default)]
    pub released: Option<String>,
    #[serde(default)]
    pub season: Option<String>,
    #[serde(default)]
    pub episode: Option<String>,
    #[serde(default)]
    pub poster: Option<String>,
    #[serde(rename = "imdbID", default)]
    pub imdb_id: Option<String>,
    #[serde(rename = "seriesID", default)]
    pub series_id: Option<String>,
    #[serde(rename = "Type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub response: Option<String>,
}

impl SearchResult {
    /// A single-result body only counts when its marker is `"True"`.
    pub fn is_success(&self) -> bool {
        self.response
            .as_deref()
            .is_some_and(|r| r.eq_ignore_ascii_case("true"))
    }
}

/// Body of a multi-result search.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SearchResultList {
    #[serde(rename = "Search", default, deserialize_with = "deserialize_search")]
    pub search: Vec<SearchResult>,
    #[serde(rename = "totalResults", default)]
    pub total_results: Option<String>,
    #[serde(rename = "Response", default)]
    pub response: Option<String>,
}

/// A decoded search response, shaped by the request's [`ResponseMode`].
#[derive(Debug, Clone, PartialEq)]
pub enum SearchResponse {
    Single(SearchResult),
    List(SearchResultList),
}

impl SearchResponse {
    /// Candidates in catalog order. A single result only counts on success.
    pub fn into_results(self) -> Vec<SearchResult> {
        match self {
            SearchResponse::Single(result) if result.is_success() => vec![result],
            SearchResponse::Single(_) => Vec::new(),
            SearchResponse::List(list) => list.search,
        }
    }
}

/// Raw image bytes fetched through the pass-through GET.
#[derive(Debug, Clone)]
pub struct ImageResponse {
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

fn is_false_marker(marker: Option<&str>) -> bool {
    non_blank(marker).is_some_and(|m| m.eq_ignore_ascii_case("false"))
}

// Sentinel stripping can turn list fields into `null`; treat that as empty.

fn deserialize_ratings<'de, D>(deserializer: D) -> Result<Vec<OmdbRating>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Vec<OmdbRating>>::deserialize(deserializer)?.unwrap_or_default())
}

fn deserialize_episodes<'de, D>(deserializer: D) -> Result<Vec<MetadataDocument>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Vec<MetadataDocument>>::deserialize(deserializer)?.unwrap_or_default())
}

fn deserialize_search<'de, D>(deserializer: D) -> Result<Vec<SearchResult>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Vec<SearchResult>>::deserialize(deserializer)?.unwrap_or_default())
}
