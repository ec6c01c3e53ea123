//! OMDb (The Open Movie Database) API client.
//!
//! OMDb requires an API key on every request. All endpoints live on a single
//! path and are selected by query parameters; posters come from a separate
//! image host.

use std::time::{Duration, Instant};

use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::types::{
    CatalogQuery, ImageResponse, MetadataDocument, ResponseMode, SearchResponse, SearchResult,
    SearchResultList, SeasonDocument,
};
use super::image_hosts::DEFAULT_POSTER_HOSTS;
use super::{CatalogApi, CatalogError};
use crate::ids::ImdbId;
use crate::metrics::{CATALOG_REQUESTS, CATALOG_REQUEST_DURATION};
use crate::normalize::decode_document;

/// Default OMDb API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://www.omdbapi.com";

/// Default OMDb poster service.
pub const DEFAULT_IMAGE_BASE_URL: &str = "https://img.omdbapi.com";

/// OMDb API client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OmdbConfig {
    /// OMDb API key (required).
    pub api_key: String,
    /// Base URL (default: https://www.omdbapi.com).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Poster service base URL (default: https://img.omdbapi.com).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_base_url: Option<String>,
    /// Request timeout in seconds (default: 30).
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// Extra hosts the image pass-through may fetch posters from.
    #[serde(default = "default_poster_hosts")]
    pub poster_hosts: Vec<String>,
}

fn default_poster_hosts() -> Vec<String> {
    DEFAULT_POSTER_HOSTS.iter().map(|h| h.to_string()).collect()
}

fn default_timeout() -> u64 {
    30
}

impl OmdbConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: None,
            image_base_url: None,
            timeout_secs: default_timeout(),
            poster_hosts: default_poster_hosts(),
        }
    }
}

/// OMDb API client.
pub struct OmdbClient {
    client: Client,
    base_url: String,
    image_base_url: String,
    api_key: String,
}

impl OmdbClient {
    /// Create a new OMDb client.
    pub fn new(config: OmdbConfig) -> Result<Self, CatalogError> {
        if config.api_key.trim().is_empty() {
            return Err(CatalogError::NotConfigured(
                "OMDb API key is required".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        let base_url = config
            .base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let image_base_url = config
            .image_base_url
            .unwrap_or_else(|| DEFAULT_IMAGE_BASE_URL.to_string());

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            image_base_url: image_base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key,
        })
    }

    /// Issue one API request and return the raw body.
    async fn fetch(
        &self,
        operation: &'static str,
        query: &CatalogQuery,
        cancel: &CancellationToken,
    ) -> Result<Vec<u8>, CatalogError> {
        let url = format!("{}/", self.base_url);
        let request = self
            .client
            .get(&url)
            .query(&[("apikey", self.api_key.as_str())])
            .query(&query.to_params());

        self.execute(operation, request, cancel)
            .await
            .map(|(_, bytes)| bytes)
    }

    async fn execute(
        &self,
        operation: &'static str,
        request: RequestBuilder,
        cancel: &CancellationToken,
    ) -> Result<(Option<String>, Vec<u8>), CatalogError> {
        let start = Instant::now();

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(CatalogError::Cancelled),
            result = send(request) => result,
        };

        let status = if result.is_ok() { "success" } else { "error" };
        CATALOG_REQUESTS
            .with_label_values(&[operation, status])
            .inc();
        CATALOG_REQUEST_DURATION
            .with_label_values(&[operation])
            .observe(start.elapsed().as_secs_f64());

        result
    }
}

async fn send(request: RequestBuilder) -> Result<(Option<String>, Vec<u8>), CatalogError> {
    let response = request.send().await?;

    let status = response.status();
    if status == 401 {
        return Err(CatalogError::NotConfigured(
            "Invalid OMDb API key".to_string(),
        ));
    }
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(CatalogError::ApiError {
            status: status.as_u16(),
            message: body,
        });
    }

    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let bytes = response.bytes().await?;

    Ok((content_type, bytes.to_vec()))
}

/// Decode a search body according to the request mode.
pub(crate) fn decode_search(
    mode: ResponseMode,
    bytes: &[u8],
) -> Result<SearchResponse, CatalogError> {
    let decoded = match mode {
        ResponseMode::Single => decode_document::<SearchResult>(bytes).map(SearchResponse::Single),
        ResponseMode::List => decode_document::<SearchResultList>(bytes).map(SearchResponse::List),
    };

    decoded.map_err(|e| {
        CatalogError::ParseError(format!("Failed to parse search response: {}", e))
    })
}

#[async_trait::async_trait]
impl CatalogApi for OmdbClient {
    async fn search(
        &self,
        query: &CatalogQuery,
        cancel: &CancellationToken,
    ) -> Result<SearchResponse, CatalogError> {
        debug!("OMDb search: target={:?}, year={:?}", query.target, query.year);

        let body = self.fetch("search", query, cancel).await?;
        decode_search(query.mode(), &body)
    }

    async fn get_item(
        &self,
        id: &ImdbId,
        cancel: &CancellationToken,
    ) -> Result<MetadataDocument, CatalogError> {
        debug!("OMDb get item: id={}", id);

        let body = self.fetch("get_item", &CatalogQuery::item(id), cancel).await?;
        decode_document(&body).map_err(|e| {
            CatalogError::ParseError(format!("Failed to parse item response: {}", e))
        })
    }

    async fn get_season(
        &self,
        series_id: &ImdbId,
        season: u32,
        cancel: &CancellationToken,
    ) -> Result<SeasonDocument, CatalogError> {
        debug!("OMDb get season: series={}, season={}", series_id, season);

        let query = CatalogQuery::season(series_id, season);
        let body = self.fetch("get_season", &query, cancel).await?;
        decode_document(&body).map_err(|e| {
            CatalogError::ParseError(format!("Failed to parse season response: {}", e))
        })
    }

    async fn get_image(
        &self,
        url: &str,
        cancel: &CancellationToken,
    ) -> Result<ImageResponse, CatalogError> {
        debug!("OMDb get image: url={}", url);

        let request = self.client.get(url);
        let (content_type, bytes) = self.execute("get_image", request, cancel).await?;

        Ok(ImageResponse {
            content_type,
            bytes,
        })
    }

    fn image_url(&self, id: &ImdbId) -> String {
        format!(
            "{}/?i={}&apikey={}",
            self.image_base_url,
            urlencoding::encode(id.as_str()),
            urlencoding::encode(&self.api_key)
        )
    }
}
