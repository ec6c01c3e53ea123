//! Common test utilities for API testing with mocks.
//!
//! This module provides a test fixture that creates an in-process server
//! with a mock catalog and a temporary cache directory, so every route can
//! be exercised without network access.

use std::sync::Arc;

use axum::body::{Body, Bytes};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use omdb_core::{
    config::{CacheConfig, MetadataConfig, ServerConfig},
    testing::{MockCatalog, MOCK_IMAGE_BASE_URL},
    Config, FileCache, ImageHostPolicy, MergeOptions, OmdbConfig, OmdbProvider,
};

/// Re-export fixtures for test convenience
#[allow(unused_imports)]
pub use omdb_core::testing::fixtures;

/// Poster host the image pass-through accepts in tests
#[allow(dead_code)]
pub const POSTER_HOST: &str = "posters.test";

/// Test fixture for API testing with a mock catalog.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_health() {
///     let fixture = TestFixture::new();
///     let response = fixture.get("/api/v1/health").await;
///     assert_eq!(response.status, 200);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Mock catalog - configure documents, searches and images
    pub catalog: Arc<MockCatalog>,
    /// Temporary directory backing the metadata cache
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

/// Raw response, for non-JSON bodies
#[derive(Debug)]
#[allow(dead_code)]
pub struct RawResponse {
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

#[allow(dead_code)]
impl TestFixture {
    /// Create a new test fixture with default merge options.
    pub fn new() -> Self {
        Self::with_options(MergeOptions::default())
    }

    /// Create a test fixture with custom merge options.
    pub fn with_options(options: MergeOptions) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let catalog = Arc::new(MockCatalog::new());

        let mut catalog_config = OmdbConfig::new("secret-test-key");
        catalog_config.image_base_url = Some(MOCK_IMAGE_BASE_URL.to_string());
        catalog_config.poster_hosts = vec![POSTER_HOST.to_string()];

        let config = Config {
            server: ServerConfig {
                host: std::net::IpAddr::V4(std::net::Ipv4Addr::LOCALHOST),
                port: 0, // Not used for in-process testing
            },
            catalog: catalog_config,
            cache: CacheConfig {
                path: temp_dir.path().to_path_buf(),
            },
            metadata: MetadataConfig {
                extended_support: options.extended_support,
                cast_and_crew: options.cast_and_crew,
            },
        };

        let cache = FileCache::new(&config.cache.path);
        let provider = Arc::new(
            OmdbProvider::new(catalog.clone(), cache, options)
                .with_image_hosts(ImageHostPolicy::from_config(&config.catalog)),
        );

        let state = Arc::new(omdb_server::state::AppState::new(config, provider));
        let router = omdb_server::api::create_router(state);

        Self {
            router,
            catalog,
            temp_dir,
        }
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None).await
    }

    /// Send a POST request with JSON body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(body)).await
    }

    /// Send a GET request and keep the body as bytes.
    pub async fn get_raw(&self, path: &str) -> RawResponse {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        RawResponse {
            status,
            content_type,
            bytes,
        }
    }

    /// Send a request to the test server.
    async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);

        let body = if let Some(json_body) = body {
            request_builder = request_builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&json_body).unwrap())
        } else {
            Body::empty()
        };

        let request = request_builder.body(body).unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body }
    }
}

/// Helper to assert a response has expected status.
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $status:expr) => {
        assert_eq!(
            $response.status, $status,
            "Expected status {:?}, got {:?}. Body: {}",
            $status,
            $response.status,
            serde_json::to_string_pretty(&$response.body).unwrap_or_default()
        );
    };
}

/// Helper to assert a JSON path equals expected value.
#[macro_export]
macro_rules! assert_json_path {
    ($json:expr, $path:expr, $expected:expr) => {
        let actual = &$json[$path];
        assert_eq!(
            actual, &$expected,
            "Path '{}' expected {:?}, got {:?}",
            $path, $expected, actual
        );
    };
}
