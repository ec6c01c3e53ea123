//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Catalog requests (count and latency per operation)
//! - Cache lookups (hit, miss, stale, corrupt)
//! - Identifier resolution outcomes

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, Opts};

// =============================================================================
// Catalog Metrics
// =============================================================================

/// Catalog requests total by operation and outcome.
pub static CATALOG_REQUESTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("omdb_catalog_requests_total", "Total OMDb API requests"),
        &["operation", "status"], // status: "success", "error"
    )
    .unwrap()
});

/// Catalog request duration in seconds.
pub static CATALOG_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "omdb_catalog_request_duration_seconds",
            "Duration of OMDb API requests",
        )
        .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
        &["operation"],
    )
    .unwrap()
});

// =============================================================================
// Cache Metrics
// =============================================================================

/// Cache lookups by document kind and result.
pub static CACHE_LOOKUPS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("omdb_cache_lookups_total", "Total metadata cache lookups"),
        &["kind", "result"], // kind: "item", "season"; result: "hit", "miss", "stale", "corrupt"
    )
    .unwrap()
});

/// Cache writes by document kind.
pub static CACHE_WRITES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("omdb_cache_writes_total", "Total metadata cache writes"),
        &["kind"],
    )
    .unwrap()
});

// =============================================================================
// Resolution Metrics
// =============================================================================

/// Identifier resolutions by outcome.
pub static RESOLUTIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("omdb_resolutions_total", "Total identifier resolutions"),
        &["result"], // "direct", "searched", "unresolved"
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(CATALOG_REQUESTS.clone()),
        Box::new(CATALOG_REQUEST_DURATION.clone()),
        Box::new(CACHE_LOOKUPS.clone()),
        Box::new(CACHE_WRITES.clone()),
        Box::new(RESOLUTIONS.clone()),
    ]
}
