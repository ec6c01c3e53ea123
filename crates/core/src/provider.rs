//! Metadata provider entry point.
//!
//! One provider serves every subject kind. Movies, series and trailers are
//! resolved to an id and fetched as items; episodes are picked out of their
//! season document.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::cache::{CacheError, FileCache};
use crate::catalog::{CatalogApi, CatalogError, ImageHostPolicy, ImageResponse, SubjectKind};
use crate::fetcher::MetadataFetcher;
use crate::ids::{IdError, ImdbId};
use crate::merge::{merge_document, MergeOptions, MetadataResult};
use crate::normalize::non_blank;
use crate::resolver::{IdentifierResolver, LookupInfo, LookupQuery, SearchResults, PROVIDER_NAME};

/// Errors surfaced by provider operations.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// A required input was missing; no network call was made.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Id(#[from] IdError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Cache(#[from] CacheError),
}

impl ProviderError {
    /// Whether the error came from the caller's cancellation.
    pub fn is_cancelled(&self) -> bool {
        matches!(
            self,
            ProviderError::Catalog(CatalogError::Cancelled) | ProviderError::Cache(CacheError::Cancelled)
        )
    }
}

/// A remote image offered for a subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteImageInfo {
    pub provider_name: String,
    pub url: String,
}

/// Resolves, fetches and merges metadata for any subject kind.
pub struct OmdbProvider {
    catalog: Arc<dyn CatalogApi>,
    resolver: IdentifierResolver,
    fetcher: MetadataFetcher,
    options: MergeOptions,
    image_hosts: ImageHostPolicy,
}

impl OmdbProvider {
    pub fn new(catalog: Arc<dyn CatalogApi>, cache: FileCache, options: MergeOptions) -> Self {
        Self {
            resolver: IdentifierResolver::new(catalog.clone()),
            fetcher: MetadataFetcher::new(catalog.clone(), cache),
            catalog,
            options,
            image_hosts: ImageHostPolicy::default(),
        }
    }

    /// Restrict the image pass-through to these hosts.
    pub fn with_image_hosts(mut self, image_hosts: ImageHostPolicy) -> Self {
        self.image_hosts = image_hosts;
        self
    }

    pub fn options(&self) -> &MergeOptions {
        &self.options
    }

    pub fn fetcher(&self) -> &MetadataFetcher {
        &self.fetcher
    }

    /// Search candidates for a lookup, in catalog order.
    pub async fn search_results(
        &self,
        info: &LookupInfo,
        kind: SubjectKind,
        cancel: &CancellationToken,
    ) -> Result<SearchResults, ProviderError> {
        let query = LookupQuery::from_info(info, kind)?;
        Ok(self.resolver.search(&query, cancel).await?)
    }

    /// Resolve and merge metadata for one subject.
    ///
    /// An unresolved subject or a catalog "not found" yields a result with
    /// `has_metadata == false`, not an error.
    pub async fn get_metadata(
        &self,
        info: &LookupInfo,
        kind: SubjectKind,
        cancel: &CancellationToken,
    ) -> Result<MetadataResult, ProviderError> {
        match kind {
            SubjectKind::Episode => self.episode_metadata(info, cancel).await,
            _ => self.item_metadata(info, kind, cancel).await,
        }
    }

    /// Like [`get_metadata`](Self::get_metadata), but a failure is logged
    /// and turned into an empty result so a batch can carry on.
    pub async fn enrich(
        &self,
        info: &LookupInfo,
        kind: SubjectKind,
        cancel: &CancellationToken,
    ) -> MetadataResult {
        match self.get_metadata(info, kind, cancel).await {
            Ok(result) => result,
            Err(e) => {
                warn!(
                    "Failed to enrich {} {:?}: {}",
                    kind.as_str(),
                    info.name,
                    e
                );
                MetadataResult::new(info.metadata_language.as_deref(), false)
            }
        }
    }

    async fn item_metadata(
        &self,
        info: &LookupInfo,
        kind: SubjectKind,
        cancel: &CancellationToken,
    ) -> Result<MetadataResult, ProviderError> {
        let query = LookupQuery::from_info(info, kind)?;
        let mut result =
            MetadataResult::new(info.metadata_language.as_deref(), query.known_id.is_some());

        let Some(id) = self.resolver.resolve(&query, cancel).await? else {
            return Ok(result);
        };

        let Some(document) = self.fetcher.get_item(&id, cancel).await? else {
            return Ok(result);
        };

        merge_document(
            &mut result,
            &document,
            info.metadata_language.as_deref(),
            info.metadata_country_code.as_deref(),
            &self.options,
        );
        result.has_metadata = true;

        Ok(result)
    }

    async fn episode_metadata(
        &self,
        info: &LookupInfo,
        cancel: &CancellationToken,
    ) -> Result<MetadataResult, ProviderError> {
        let mut result = MetadataResult::new(info.metadata_language.as_deref(), true);

        // Placeholders for episodes the library does not have.
        if info.is_missing_episode {
            return Ok(result);
        }

        let series_id = info.series_imdb_id()?;
        let episode_id = info.imdb_id()?;
        let (Some(series_id), Some(season), Some(episode)) =
            (series_id, info.parent_index_number, info.index_number)
        else {
            debug!("Episode {:?} lacks series id or position", info.name);
            return Ok(result);
        };

        let document = self
            .fetcher
            .get_episode(&series_id, season, episode_id.as_ref(), episode, cancel)
            .await?;

        if let Some(document) = document {
            merge_document(
                &mut result,
                &document,
                info.metadata_language.as_deref(),
                info.metadata_country_code.as_deref(),
                &self.options,
            );
            result.has_metadata = true;
        }

        Ok(result)
    }

    /// Poster for a subject, at most one.
    ///
    /// Episodes use the document's poster URL verbatim; everything else uses
    /// the catalog's image service keyed by id.
    pub async fn get_images(
        &self,
        kind: SubjectKind,
        id: &ImdbId,
        cancel: &CancellationToken,
    ) -> Result<Vec<RemoteImageInfo>, ProviderError> {
        let Some(document) = self.fetcher.get_item(id, cancel).await? else {
            return Ok(Vec::new());
        };

        let Some(poster) = non_blank(document.poster.as_deref()) else {
            return Ok(Vec::new());
        };

        let url = match kind {
            SubjectKind::Episode => poster.to_string(),
            _ => self.catalog.image_url(id),
        };

        Ok(vec![RemoteImageInfo {
            provider_name: PROVIDER_NAME.to_string(),
            url,
        }])
    }

    /// Plain GET of an image URL on an allowed host.
    pub async fn get_image_response(
        &self,
        url: &str,
        cancel: &CancellationToken,
    ) -> Result<ImageResponse, ProviderError> {
        let url = url.trim();
        if url.is_empty() {
            return Err(ProviderError::InvalidInput("image url is required".to_string()));
        }
        let url = self
            .image_hosts
            .check(url)
            .map_err(ProviderError::InvalidInput)?;

        Ok(self.catalog.get_image(url.as_str(), cancel).await?)
    }
}
