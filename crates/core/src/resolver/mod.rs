//! Identifier resolution.
//!
//! Turns a name/year/type/episode-position query into a canonical IMDb id,
//! either directly from a known id or by searching the catalog and taking
//! the first candidate in catalog order.

mod types;

pub use types::{LookupInfo, LookupQuery, RemoteSearchResult, PROVIDER_NAME};

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::catalog::{CatalogApi, CatalogError, CatalogQuery, QueryTarget, SearchResult, SubjectKind};
use crate::ids::ImdbId;
use crate::metrics::RESOLUTIONS;

/// Candidates of one search, projected lazily in catalog order.
///
/// Finite and single-pass; iterate again by searching again.
#[derive(Debug)]
pub struct SearchResults {
    results: std::vec::IntoIter<SearchResult>,
    query: LookupQuery,
}

impl SearchResults {
    fn new(results: Vec<SearchResult>, query: LookupQuery) -> Self {
        Self {
            results: results.into_iter(),
            query,
        }
    }

    fn empty(query: LookupQuery) -> Self {
        Self::new(Vec::new(), query)
    }
}

impl Iterator for SearchResults {
    type Item = RemoteSearchResult;

    fn next(&mut self) -> Option<Self::Item> {
        self.results
            .next()
            .map(|result| RemoteSearchResult::project(result, &self.query))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.results.size_hint()
    }
}

impl ExactSizeIterator for SearchResults {}

/// Resolves lookup queries against the catalog.
pub struct IdentifierResolver {
    catalog: Arc<dyn CatalogApi>,
}

impl IdentifierResolver {
    pub fn new(catalog: Arc<dyn CatalogApi>) -> Self {
        Self { catalog }
    }

    /// Search the catalog for candidates.
    ///
    /// A direct query issues one single-result lookup by id; anything else
    /// issues one multi-result search. A query with neither a usable id nor a
    /// name yields no candidates without touching the network.
    pub async fn search(
        &self,
        query: &LookupQuery,
        cancel: &CancellationToken,
    ) -> Result<SearchResults, CatalogError> {
        let Some(request) = build_request(query) else {
            debug!("Nothing to search for: {:?}", query);
            return Ok(SearchResults::empty(query.clone()));
        };

        let response = self.catalog.search(&request, cancel).await?;
        let results = response.into_results();
        debug!("Search returned {} candidate(s) for {:?}", results.len(), query.name);

        Ok(SearchResults::new(results, query.clone()))
    }

    /// Resolve a query to a canonical id, or `None` when unresolved.
    ///
    /// A known id for a non-episode subject is returned as-is with no network
    /// call. Otherwise the first candidate's id wins.
    pub async fn resolve(
        &self,
        query: &LookupQuery,
        cancel: &CancellationToken,
    ) -> Result<Option<ImdbId>, CatalogError> {
        if query.kind != SubjectKind::Episode {
            if let Some(id) = &query.known_id {
                RESOLUTIONS.with_label_values(&["direct"]).inc();
                return Ok(Some(id.clone()));
            }
        }

        // Only the top candidate counts; one without an id leaves the query unresolved.
        let resolved = self
            .search(query, cancel)
            .await?
            .next()
            .and_then(|candidate| candidate.imdb_id);

        match &resolved {
            Some(id) => {
                let label = if query.is_direct() { "direct" } else { "searched" };
                RESOLUTIONS.with_label_values(&[label]).inc();
                info!("Resolved {:?} ({:?}) to {}", query.name, query.year, id);
            }
            None => {
                RESOLUTIONS.with_label_values(&["unresolved"]).inc();
                info!("No match for {:?} ({:?})", query.name, query.year);
            }
        }

        Ok(resolved)
    }
}

fn build_request(query: &LookupQuery) -> Option<CatalogQuery> {
    let is_episode = query.kind == SubjectKind::Episode;

    let mut request = match (&query.known_id, query.is_direct()) {
        (Some(id), true) => CatalogQuery::lookup(QueryTarget::Id(id.clone())),
        _ => {
            let name = query.name.trim();
            if name.is_empty() {
                return None;
            }
            // The type filter only narrows searches; an id already names the subject.
            let mut request = CatalogQuery::lookup(QueryTarget::Search(name.to_string()));
            request.year = query.year;
            request.kind = Some(query.kind);
            request
        }
    };

    if is_episode {
        request.season = query.season;
        request.episode = query.episode;
    }

    Some(request)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fixtures, MockCatalog, RecordedCatalogQuery};

    fn resolver(catalog: &Arc<MockCatalog>) -> IdentifierResolver {
        IdentifierResolver::new(catalog.clone())
    }

    #[test]
    fn test_build_search_request() {
        let query = LookupQuery::title("Inception", Some(2010), SubjectKind::Movie);
        let request = build_request(&query).unwrap();
        assert_eq!(request.target, QueryTarget::Search("Inception".to_string()));
        assert_eq!(request.year, Some(2010));
        assert_eq!(request.kind, Some(SubjectKind::Movie));
        assert!(request.season.is_none());
    }

    #[test]
    fn test_build_direct_episode_request() {
        let mut query = LookupQuery::title("Pilot", Some(2008), SubjectKind::Episode);
        query.known_id = Some(ImdbId::new("tt0903747").unwrap());
        query.season = Some(1);
        query.episode = Some(1);

        let request = build_request(&query).unwrap();
        assert_eq!(
            request.target,
            QueryTarget::Id(ImdbId::new("tt0903747").unwrap())
        );
        assert!(request.year.is_none());
        assert!(request.kind.is_none());
        assert_eq!(request.season, Some(1));
        assert_eq!(request.episode, Some(1));
        assert!(!request.to_params().iter().any(|(key, _)| *key == "type"));
    }

    #[test]
    fn test_build_direct_request_has_no_type_filter() {
        for kind in [SubjectKind::Movie, SubjectKind::Series, SubjectKind::Trailer] {
            let mut query = LookupQuery::title("Inception", Some(2010), kind);
            query.known_id = Some(ImdbId::new("tt1375666").unwrap());

            let params = build_request(&query).unwrap().to_params();
            assert!(params.contains(&("i", "tt1375666".to_string())));
            assert!(
                !params.iter().any(|(key, _)| *key == "type" || *key == "y"),
                "unexpected filter for {:?}: {:?}",
                kind,
                params
            );
        }
    }

    #[test]
    fn test_build_request_blank_name() {
        let query = LookupQuery::title("  ", None, SubjectKind::Series);
        assert!(build_request(&query).is_none());
    }

    #[tokio::test]
    async fn test_resolve_known_id_skips_network() {
        let catalog = Arc::new(MockCatalog::new());
        let mut query = LookupQuery::title("Inception", None, SubjectKind::Movie);
        query.known_id = Some(ImdbId::new("tt1375666").unwrap());

        let resolved = resolver(&catalog)
            .resolve(&query, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(resolved.unwrap().as_str(), "tt1375666");
        assert_eq!(catalog.query_count().await, 0);
    }

    #[tokio::test]
    async fn test_resolve_first_candidate_wins() {
        let catalog = Arc::new(MockCatalog::new());
        catalog
            .set_search_results(vec![
                fixtures::search_result("Inception", "2010", "tt1375666"),
                fixtures::search_result("Inception: The Cobol Job", "2010", "tt5295894"),
            ])
            .await;

        let query = LookupQuery::title("Inception", Some(2010), SubjectKind::Movie);
        let resolved = resolver(&catalog)
            .resolve(&query, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(resolved.unwrap().as_str(), "tt1375666");
        let queries = catalog.recorded_queries().await;
        assert_eq!(queries.len(), 1);
        assert!(matches!(
            &queries[0],
            RecordedCatalogQuery::Search(q) if q.target == QueryTarget::Search("Inception".to_string())
        ));
    }

    #[tokio::test]
    async fn test_resolve_first_candidate_without_id_is_unresolved() {
        let catalog = Arc::new(MockCatalog::new());
        catalog
            .set_search_results(vec![
                SearchResult {
                    title: Some("Inception".to_string()),
                    year: Some("2010".to_string()),
                    ..Default::default()
                },
                fixtures::search_result("Inception: The Cobol Job", "2010", "tt5295894"),
            ])
            .await;

        let query = LookupQuery::title("Inception", Some(2010), SubjectKind::Movie);
        let resolved = resolver(&catalog)
            .resolve(&query, &CancellationToken::new())
            .await
            .unwrap();

        assert!(resolved.is_none());
    }

    #[tokio::test]
    async fn test_resolve_no_candidates_is_unresolved() {
        let catalog = Arc::new(MockCatalog::new());
        let query = LookupQuery::title("Nothing Like This", None, SubjectKind::Movie);

        let resolved = resolver(&catalog)
            .resolve(&query, &CancellationToken::new())
            .await
            .unwrap();
        assert!(resolved.is_none());
    }

    #[tokio::test]
    async fn test_search_is_lazy_projection() {
        let catalog = Arc::new(MockCatalog::new());
        catalog
            .set_search_results(vec![
                fixtures::search_result("Heat", "1995", "tt0113277"),
                fixtures::search_result("Heat", "1986", "tt0091183"),
            ])
            .await;

        let query = LookupQuery::title("Heat", None, SubjectKind::Movie);
        let mut results = resolver(&catalog)
            .search(&query, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(results.len(), 2);
        let first = results.next().unwrap();
        assert_eq!(first.production_year, Some(1995));
        assert_eq!(results.len(), 1);
        assert_eq!(results.next().unwrap().production_year, Some(1986));
        assert!(results.next().is_none());
    }

    #[tokio::test]
    async fn test_search_error_propagates() {
        let catalog = Arc::new(MockCatalog::new());
        catalog
            .set_next_error(CatalogError::ApiError {
                status: 503,
                message: "unavailable".to_string(),
            })
            .await;

        let query = LookupQuery::title("Inception", None, SubjectKind::Movie);
        let result = resolver(&catalog)
            .search(&query, &CancellationToken::new())
            .await;
        assert!(matches!(result, Err(CatalogError::ApiError { status: 503, .. })));
    }
}
