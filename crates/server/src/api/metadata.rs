//! Metadata API handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use omdb_core::{
    ImdbId, LookupInfo, MetadataResult, ProviderError, RemoteImageInfo,
    RemoteSearchResult, SubjectKind,
};

use crate::metrics::API_ERRORS_TOTAL;
use crate::state::AppState;

// ============================================================================
// Request/Response types
// ============================================================================

/// Body of `/search` and `/metadata`.
#[derive(Debug, Deserialize)]
pub struct LookupRequest {
    pub kind: SubjectKind,
    #[serde(default)]
    pub info: LookupInfo,
}

#[derive(Debug, Deserialize)]
pub struct ImageParams {
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn bad_request(message: impl Into<String>) -> ApiError {
    API_ERRORS_TOTAL.with_label_values(&["invalid_input"]).inc();
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

fn provider_error(error: ProviderError) -> ApiError {
    let (status, kind) = match &error {
        ProviderError::InvalidInput(_) | ProviderError::Id(_) => {
            (StatusCode::BAD_REQUEST, "invalid_input")
        }
        _ if error.is_cancelled() => (StatusCode::SERVICE_UNAVAILABLE, "cancelled"),
        ProviderError::Catalog(_) => (StatusCode::BAD_GATEWAY, "catalog"),
        ProviderError::Cache(_) => (StatusCode::INTERNAL_SERVER_ERROR, "cache"),
    };

    if status.is_server_error() {
        warn!("Request failed: {}", error);
    } else {
        debug!("Rejected request: {}", error);
    }
    API_ERRORS_TOTAL.with_label_values(&[kind]).inc();

    (
        status,
        Json(ErrorResponse {
            error: error.to_string(),
        }),
    )
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/v1/search
///
/// Search candidates for a lookup, in catalog order.
pub async fn search(
    State(state): State<Arc<AppState>>,
    Extension(cancel): Extension<CancellationToken>,
    Json(request): Json<LookupRequest>,
) -> Result<Json<Vec<RemoteSearchResult>>, ApiError> {
    let results = state
        .provider()
        .search_results(&request.info, request.kind, &cancel)
        .await
        .map_err(provider_error)?;

    Ok(Json(results.collect()))
}

/// POST /api/v1/metadata
///
/// Resolve, fetch and merge metadata for one subject.
pub async fn get_metadata(
    State(state): State<Arc<AppState>>,
    Extension(cancel): Extension<CancellationToken>,
    Json(request): Json<LookupRequest>,
) -> Result<Json<MetadataResult>, ApiError> {
    state
        .provider()
        .get_metadata(&request.info, request.kind, &cancel)
        .await
        .map(Json)
        .map_err(provider_error)
}

/// GET /api/v1/images/{kind}/{imdb_id}
///
/// Poster offered for a subject, at most one.
pub async fn get_images(
    State(state): State<Arc<AppState>>,
    Extension(cancel): Extension<CancellationToken>,
    Path((kind, imdb_id)): Path<(String, String)>,
) -> Result<Json<Vec<RemoteImageInfo>>, ApiError> {
    let kind: SubjectKind = kind.parse().map_err(bad_request)?;
    let id = ImdbId::new(&imdb_id).map_err(|e| bad_request(e.to_string()))?;

    state
        .provider()
        .get_images(kind, &id, &cancel)
        .await
        .map(Json)
        .map_err(provider_error)
}

/// GET /api/v1/image?url=
///
/// Pass-through fetch of an image URL.
pub async fn get_image(
    State(state): State<Arc<AppState>>,
    Extension(cancel): Extension<CancellationToken>,
    Query(params): Query<ImageParams>,
) -> Result<Response, ApiError> {
    let image = state
        .provider()
        .get_image_response(&params.url, &cancel)
        .await
        .map_err(provider_error)?;

    let content_type = image
        .content_type
        .unwrap_or_else(|| "application/octet-stream".to_string());

    Ok(([(header::CONTENT_TYPE, content_type)], image.bytes).into_response())
}
