//! Mock OMDb catalog for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

use crate::catalog::{
    CatalogApi, CatalogError, CatalogQuery, ImageResponse, MetadataDocument, QueryTarget,
    ResponseMode, SearchResponse, SearchResult, SearchResultList, SeasonDocument,
};
use crate::ids::ImdbId;

/// Image host the mock builds poster URLs on.
pub const MOCK_IMAGE_BASE_URL: &str = "https://img.mock.test";

/// A recorded catalog call for test assertions.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedCatalogQuery {
    Search(CatalogQuery),
    GetItem { id: ImdbId },
    GetSeason { series_id: ImdbId, season: u32 },
    GetImage { url: String },
}

/// Mock implementation of the CatalogApi trait.
///
/// Behaves like the real service for unknown ids: detail and season
/// requests answer with a `"Response": "False"` document instead of an
/// error. Multi-result searches return the configured list as-is.
///
/// # Example
///
/// ```rust,ignore
/// use omdb_core::testing::{fixtures, MockCatalog};
///
/// let catalog = MockCatalog::new();
/// catalog.add_item(fixtures::movie_document("tt1375666", "Inception", "2010")).await;
/// catalog.set_search_results(vec![fixtures::search_result("Inception", "2010", "tt1375666")]).await;
/// ```
#[derive(Debug)]
pub struct MockCatalog {
    /// Detail documents by canonical id.
    items: Arc<RwLock<HashMap<String, MetadataDocument>>>,
    /// Season documents by (series id, season number).
    seasons: Arc<RwLock<HashMap<(String, u32), SeasonDocument>>>,
    /// Candidates returned by every multi-result search.
    search_results: Arc<RwLock<Vec<SearchResult>>>,
    /// Image bodies by URL.
    images: Arc<RwLock<HashMap<String, ImageResponse>>>,
    /// Recorded calls.
    queries: Arc<RwLock<Vec<RecordedCatalogQuery>>>,
    /// If set, the next operation will fail with this error.
    next_error: Arc<RwLock<Option<CatalogError>>>,
}

impl Default for MockCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl MockCatalog {
    /// Create a new empty mock catalog.
    pub fn new() -> Self {
        Self {
            items: Arc::new(RwLock::new(HashMap::new())),
            seasons: Arc::new(RwLock::new(HashMap::new())),
            search_results: Arc::new(RwLock::new(Vec::new())),
            images: Arc::new(RwLock::new(HashMap::new())),
            queries: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
        }
    }

    // =========================================================================
    // Configuration
    // =========================================================================

    /// Add a detail document, keyed by its `imdbID`.
    pub async fn add_item(&self, document: MetadataDocument) {
        let key = canonical(document.imdb_id.as_deref());
        self.items.write().await.insert(key, document);
    }

    /// Add a season document, keyed by its `seriesID` and `Season`.
    pub async fn add_season(&self, document: SeasonDocument) {
        let key = (
            canonical(document.series_id.as_deref()),
            document.season.unwrap_or_default(),
        );
        self.seasons.write().await.insert(key, document);
    }

    /// Replace the candidates returned by multi-result searches.
    pub async fn set_search_results(&self, results: Vec<SearchResult>) {
        *self.search_results.write().await = results;
    }

    /// Serve an image body at a URL.
    pub async fn add_image(&self, url: &str, content_type: &str, bytes: Vec<u8>) {
        self.images.write().await.insert(
            url.to_string(),
            ImageResponse {
                content_type: Some(content_type.to_string()),
                bytes,
            },
        );
    }

    // =========================================================================
    // Query Recording
    // =========================================================================

    /// Get all recorded calls.
    pub async fn recorded_queries(&self) -> Vec<RecordedCatalogQuery> {
        self.queries.read().await.clone()
    }

    /// Clear recorded calls.
    pub async fn clear_recorded(&self) {
        self.queries.write().await.clear();
    }

    /// Get the number of calls performed.
    pub async fn query_count(&self) -> usize {
        self.queries.read().await.len()
    }

    // =========================================================================
    // Error Injection
    // =========================================================================

    /// Configure the next operation to fail with the given error.
    pub async fn set_next_error(&self, error: CatalogError) {
        *self.next_error.write().await = Some(error);
    }

    /// Clear any pending error.
    pub async fn clear_next_error(&self) {
        *self.next_error.write().await = None;
    }

    /// Record a call, then fail it if an error is pending or the token is
    /// cancelled.
    async fn begin(
        &self,
        query: RecordedCatalogQuery,
        cancel: &CancellationToken,
    ) -> Result<(), CatalogError> {
        if cancel.is_cancelled() {
            return Err(CatalogError::Cancelled);
        }
        self.queries.write().await.push(query);
        match self.next_error.write().await.take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    async fn single_result(&self, query: &CatalogQuery) -> SearchResult {
        let found = match &query.target {
            QueryTarget::Id(id) => match (query.season, query.episode) {
                (Some(season), Some(episode)) => self
                    .seasons
                    .read()
                    .await
                    .get(&(id.to_string(), season))
                    .and_then(|s| s.find_episode(None, episode))
                    .cloned(),
                _ => self.items.read().await.get(id.as_str()).cloned(),
            },
            QueryTarget::Title(title) => self
                .items
                .read()
                .await
                .values()
                .find(|d| {
                    d.title
                        .as_deref()
                        .is_some_and(|t| t.eq_ignore_ascii_case(title))
                })
                .cloned(),
            QueryTarget::Search(_) => None,
        };

        match found {
            Some(document) => to_search_result(&document),
            None => SearchResult {
                response: Some("False".to_string()),
                ..Default::default()
            },
        }
    }
}

fn canonical(raw: Option<&str>) -> String {
    raw.and_then(|id| ImdbId::new(id).ok())
        .map(String::from)
        .unwrap_or_default()
}

fn to_search_result(document: &MetadataDocument) -> SearchResult {
    SearchResult {
        title: document.title.clone(),
        year: document.year.clone(),
        released: document.released.clone(),
        episode: document.episode.map(|e| e.to_string()),
        poster: document.poster.clone(),
        imdb_id: document.imdb_id.clone(),
        kind: document.kind.clone(),
        response: Some("True".to_string()),
        ..Default::default()
    }
}

fn not_found<T: Default>(apply: impl FnOnce(&mut T)) -> T {
    let mut document = T::default();
    apply(&mut document);
    document
}

#[async_trait]
impl CatalogApi for MockCatalog {
    async fn search(
        &self,
        query: &CatalogQuery,
        cancel: &CancellationToken,
    ) -> Result<SearchResponse, CatalogError> {
        self.begin(RecordedCatalogQuery::Search(query.clone()), cancel)
            .await?;

        match query.mode() {
            ResponseMode::List => {
                let search = self.search_results.read().await.clone();
                let response = if search.is_empty() { "False" } else { "True" };
                Ok(SearchResponse::List(SearchResultList {
                    total_results: Some(search.len().to_string()),
                    search,
                    response: Some(response.to_string()),
                }))
            }
            ResponseMode::Single => Ok(SearchResponse::Single(self.single_result(query).await)),
        }
    }

    async fn get_item(
        &self,
        id: &ImdbId,
        cancel: &CancellationToken,
    ) -> Result<MetadataDocument, CatalogError> {
        self.begin(RecordedCatalogQuery::GetItem { id: id.clone() }, cancel)
            .await?;

        Ok(match self.items.read().await.get(id.as_str()) {
            Some(document) => document.clone(),
            None => not_found(|d: &mut MetadataDocument| {
                d.response = Some("False".to_string());
                d.error = Some("Incorrect IMDb ID.".to_string());
            }),
        })
    }

    async fn get_season(
        &self,
        series_id: &ImdbId,
        season: u32,
        cancel: &CancellationToken,
    ) -> Result<SeasonDocument, CatalogError> {
        self.begin(
            RecordedCatalogQuery::GetSeason {
                series_id: series_id.clone(),
                season,
            },
            cancel,
        )
        .await?;

        Ok(
            match self
                .seasons
                .read()
                .await
                .get(&(series_id.to_string(), season))
            {
                Some(document) => document.clone(),
                None => not_found(|d: &mut SeasonDocument| {
                    d.response = Some("False".to_string());
                    d.error = Some("Series or season not found!".to_string());
                }),
            },
        )
    }

    async fn get_image(
        &self,
        url: &str,
        cancel: &CancellationToken,
    ) -> Result<ImageResponse, CatalogError> {
        self.begin(
            RecordedCatalogQuery::GetImage {
                url: url.to_string(),
            },
            cancel,
        )
        .await?;

        self.images
            .read()
            .await
            .get(url)
            .cloned()
            .ok_or_else(|| CatalogError::ApiError {
                status: 404,
                message: format!("No image at {}", url),
            })
    }

    fn image_url(&self, id: &ImdbId) -> String {
        format!("{}/?i={}", MOCK_IMAGE_BASE_URL, id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures;

    #[tokio::test]
    async fn test_unknown_item_answers_false_marker() {
        let catalog = MockCatalog::new();
        let document = catalog
            .get_item(&ImdbId::new("tt1").unwrap(), &CancellationToken::new())
            .await
            .unwrap();
        assert!(!document.is_found());
        assert_eq!(catalog.query_count().await, 1);
    }

    #[tokio::test]
    async fn test_direct_episode_lookup() {
        let catalog = MockCatalog::new();
        catalog
            .add_season(fixtures::season_document(
                "tt0903747",
                1,
                &[("tt0959621", 1), ("tt1054724", 2)],
            ))
            .await;

        let mut query = CatalogQuery::lookup(QueryTarget::Id(ImdbId::new("tt0903747").unwrap()));
        query.season = Some(1);
        query.episode = Some(2);

        let results = catalog
            .search(&query, &CancellationToken::new())
            .await
            .unwrap()
            .into_results();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].imdb_id.as_deref(), Some("tt1054724"));
    }

    #[tokio::test]
    async fn test_next_error_is_consumed() {
        let catalog = MockCatalog::new();
        catalog
            .set_next_error(CatalogError::ParseError("bad".to_string()))
            .await;
        let id = ImdbId::new("tt1").unwrap();
        let cancel = CancellationToken::new();

        assert!(catalog.get_item(&id, &cancel).await.is_err());
        assert!(catalog.get_item(&id, &cancel).await.is_ok());
    }
}
