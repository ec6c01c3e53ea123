//! Cached document retrieval.
//!
//! Every read goes through the [`FileCache`] first; the catalog is only hit
//! on a miss or a stale entry, and only found documents are written back.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::cache::{CacheKey, FileCache};
use crate::catalog::{CatalogApi, MetadataDocument, SeasonDocument};
use crate::ids::ImdbId;
use crate::provider::ProviderError;

/// Produces metadata documents from cache or catalog.
pub struct MetadataFetcher {
    catalog: Arc<dyn CatalogApi>,
    cache: FileCache,
}

impl MetadataFetcher {
    pub fn new(catalog: Arc<dyn CatalogApi>, cache: FileCache) -> Self {
        Self { catalog, cache }
    }

    pub fn cache(&self) -> &FileCache {
        &self.cache
    }

    /// Detail document for one title, or `None` when the catalog has no
    /// such id.
    pub async fn get_item(
        &self,
        id: &ImdbId,
        cancel: &CancellationToken,
    ) -> Result<Option<MetadataDocument>, ProviderError> {
        let key = CacheKey::Item(id.clone());
        if let Some(document) = self.cache.load::<MetadataDocument>(&key, cancel).await? {
            return Ok(Some(document));
        }

        let document = self.catalog.get_item(id, cancel).await?;
        if !document.is_found() {
            debug!("Catalog has no item {}: {:?}", id, document.error);
            return Ok(None);
        }

        self.cache.put(&key, &document, cancel).await?;
        Ok(Some(document))
    }

    /// Full season document, or `None` when the catalog has no such season.
    pub async fn get_season(
        &self,
        series_id: &ImdbId,
        season: u32,
        cancel: &CancellationToken,
    ) -> Result<Option<SeasonDocument>, ProviderError> {
        let key = CacheKey::Season {
            series_id: series_id.clone(),
            season,
        };
        if let Some(document) = self.cache.load::<SeasonDocument>(&key, cancel).await? {
            return Ok(Some(document));
        }

        let document = self.catalog.get_season(series_id, season, cancel).await?;
        if !document.is_found() {
            debug!(
                "Catalog has no season {} of {}: {:?}",
                season, series_id, document.error
            );
            return Ok(None);
        }

        self.cache.put(&key, &document, cancel).await?;
        Ok(Some(document))
    }

    /// One episode out of its season document.
    ///
    /// An id match wins over the episode number. `None` means no such
    /// episode, which is not an error.
    pub async fn get_episode(
        &self,
        series_id: &ImdbId,
        season: u32,
        episode_id: Option<&ImdbId>,
        episode_number: u32,
        cancel: &CancellationToken,
    ) -> Result<Option<MetadataDocument>, ProviderError> {
        let Some(season_document) = self.get_season(series_id, season, cancel).await? else {
            return Ok(None);
        };

        let episode = season_document
            .find_episode(episode_id, episode_number)
            .cloned();
        if episode.is_none() {
            debug!(
                "No episode {} ({:?}) in season {} of {}",
                episode_number, episode_id, season, series_id
            );
        }

        Ok(episode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogError;
    use crate::testing::{fixtures, MockCatalog, RecordedCatalogQuery};
    use tempfile::TempDir;

    fn setup(dir: &TempDir) -> (Arc<MockCatalog>, MetadataFetcher) {
        let catalog = Arc::new(MockCatalog::new());
        let fetcher = MetadataFetcher::new(catalog.clone(), FileCache::new(dir.path()));
        (catalog, fetcher)
    }

    fn id(raw: &str) -> ImdbId {
        ImdbId::new(raw).unwrap()
    }

    #[tokio::test]
    async fn test_get_item_caches_network_result() {
        let dir = TempDir::new().unwrap();
        let (catalog, fetcher) = setup(&dir);
        catalog
            .add_item(fixtures::movie_document("tt1375666", "Inception", "2010"))
            .await;
        let cancel = CancellationToken::new();

        let first = fetcher.get_item(&id("tt1375666"), &cancel).await.unwrap();
        let second = fetcher.get_item(&id("1375666"), &cancel).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first.unwrap().title.as_deref(), Some("Inception"));
        assert_eq!(catalog.query_count().await, 1);
        assert!(dir.path().join("omdb").join("tt1375666.json").exists());
    }

    #[tokio::test]
    async fn test_get_item_not_found_is_not_cached() {
        let dir = TempDir::new().unwrap();
        let (catalog, fetcher) = setup(&dir);
        let cancel = CancellationToken::new();

        let result = fetcher.get_item(&id("tt0000001"), &cancel).await.unwrap();
        assert!(result.is_none());
        assert!(!dir.path().join("omdb").join("tt0000001.json").exists());

        fetcher.get_item(&id("tt0000001"), &cancel).await.unwrap();
        assert_eq!(catalog.query_count().await, 2);
    }

    #[tokio::test]
    async fn test_get_item_transport_failure_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let (catalog, fetcher) = setup(&dir);
        catalog
            .set_next_error(CatalogError::ApiError {
                status: 500,
                message: "boom".to_string(),
            })
            .await;

        let result = fetcher
            .get_item(&id("tt1375666"), &CancellationToken::new())
            .await;
        assert!(matches!(result, Err(ProviderError::Catalog(_))));
        assert!(!dir.path().join("omdb").join("tt1375666.json").exists());
    }

    #[tokio::test]
    async fn test_corrupt_cache_surfaces_then_refetches() {
        let dir = TempDir::new().unwrap();
        let (catalog, fetcher) = setup(&dir);
        catalog
            .add_item(fixtures::movie_document("tt1375666", "Inception", "2010"))
            .await;
        let cancel = CancellationToken::new();

        let path = fetcher.cache().path_for(&CacheKey::Item(id("tt1375666")));
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, b"[truncated").unwrap();

        let failed = fetcher.get_item(&id("tt1375666"), &cancel).await;
        assert!(matches!(failed, Err(ProviderError::Cache(_))));
        assert_eq!(catalog.query_count().await, 0);

        let next = fetcher.get_item(&id("tt1375666"), &cancel).await.unwrap();
        assert!(next.is_some());
        assert_eq!(catalog.query_count().await, 1);
    }

    #[tokio::test]
    async fn test_get_episode_from_cached_season() {
        let dir = TempDir::new().unwrap();
        let (catalog, fetcher) = setup(&dir);
        catalog
            .add_season(fixtures::season_document(
                "tt0903747",
                1,
                &[("tt0959621", 1), ("tt1054724", 2)],
            ))
            .await;
        let cancel = CancellationToken::new();
        let series = id("tt0903747");

        let by_id = fetcher
            .get_episode(&series, 1, Some(&id("tt1054724")), 1, &cancel)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_id.episode, Some(2));

        let by_number = fetcher
            .get_episode(&series, 1, None, 2, &cancel)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_number.imdb_id.as_deref(), Some("tt1054724"));

        let missing = fetcher.get_episode(&series, 1, None, 5, &cancel).await.unwrap();
        assert!(missing.is_none());

        // One season fetch served all three lookups.
        let queries = catalog.recorded_queries().await;
        assert_eq!(queries.len(), 1);
        assert!(matches!(
            &queries[0],
            RecordedCatalogQuery::GetSeason { season: 1, .. }
        ));
        assert!(dir
            .path()
            .join("omdb")
            .join("tt0903747_season_1.json")
            .exists());
    }

    #[tokio::test]
    async fn test_get_episode_unknown_season() {
        let dir = TempDir::new().unwrap();
        let (_catalog, fetcher) = setup(&dir);

        let result = fetcher
            .get_episode(&id("tt0903747"), 9, None, 1, &CancellationToken::new())
            .await
            .unwrap();
        assert!(result.is_none());
    }
}
