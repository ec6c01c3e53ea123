//! OMDb catalog access.
//!
//! This module provides the HTTP client for the Open Movie Database and the
//! `CatalogApi` trait the rest of the pipeline talks to, so tests can swap in
//! a mock without a network.

mod image_hosts;
mod omdb;
mod types;

pub use image_hosts::{ImageHostPolicy, DEFAULT_POSTER_HOSTS};
pub use omdb::{OmdbClient, OmdbConfig, DEFAULT_BASE_URL, DEFAULT_IMAGE_BASE_URL};
pub use types::*;

use async_trait::async_trait;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::ids::ImdbId;

/// Errors that can occur when talking to the catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// HTTP request failed (connect, timeout, body read).
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// API answered with a non-success status.
    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    /// Failed to parse response.
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Client not configured (missing API key, etc.).
    #[error("Client not configured: {0}")]
    NotConfigured(String),

    /// The caller cancelled the request.
    #[error("Catalog request cancelled")]
    Cancelled,
}

/// Operations the pipeline needs from the remote catalog.
///
/// Implementations never retry and never cache; both are the caller's call.
#[async_trait]
pub trait CatalogApi: Send + Sync {
    /// Run an identification request, decoding the shape given by
    /// [`CatalogQuery::mode`].
    async fn search(
        &self,
        query: &CatalogQuery,
        cancel: &CancellationToken,
    ) -> Result<SearchResponse, CatalogError>;

    /// Full detail document for one title.
    async fn get_item(
        &self,
        id: &ImdbId,
        cancel: &CancellationToken,
    ) -> Result<MetadataDocument, CatalogError>;

    /// Full season document with every episode's detail.
    async fn get_season(
        &self,
        series_id: &ImdbId,
        season: u32,
        cancel: &CancellationToken,
    ) -> Result<SeasonDocument, CatalogError>;

    /// Plain GET of an image URL.
    async fn get_image(
        &self,
        url: &str,
        cancel: &CancellationToken,
    ) -> Result<ImageResponse, CatalogError>;

    /// Poster URL on the catalog's image service for an id.
    fn image_url(&self, id: &ImdbId) -> String;
}
