use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::middleware::{cancellation_middleware, metrics_middleware};
use super::{handlers, metadata};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // API routes
    let api_routes = Router::new()
        // Health and config
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        // Lookups
        .route("/search", post(metadata::search))
        .route("/metadata", post(metadata::get_metadata))
        // Images
        .route("/images/{kind}/{imdb_id}", get(metadata::get_images))
        .route("/image", get(metadata::get_image))
        .layer(middleware::from_fn(cancellation_middleware))
        .with_state(state);

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/metrics", get(handlers::metrics))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
}
