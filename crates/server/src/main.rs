use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use omdb_core::{
    config::DEFAULT_CONFIG_PATH, load_config, validate_config, CatalogApi, FileCache,
    ImageHostPolicy, OmdbClient, OmdbProvider, SanitizedConfig,
};
use omdb_server::api::create_router;
use omdb_server::state::AppState;

/// Environment variable naming the config file
const CONFIG_PATH_ENV: &str = "OMDB_CONFIG";

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine config path
    let config_path = std::env::var(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    let sanitized = SanitizedConfig::from(&config);
    let config_json = serde_json::to_string(&sanitized).unwrap_or_default();
    let config_hash = format!("{:x}", Sha256::digest(config_json.as_bytes()));
    info!("Configuration loaded successfully (hash {})", &config_hash[..16]);
    info!("Cache path: {:?}", config.cache.path);
    info!(
        "Metadata options: extended_support={}, cast_and_crew={}",
        config.metadata.extended_support, config.metadata.cast_and_crew
    );

    // Create catalog client
    let catalog: Arc<dyn CatalogApi> = Arc::new(
        OmdbClient::new(config.catalog.clone()).context("Failed to create OMDb client")?,
    );
    info!("OMDb client initialized");

    // Create cache and provider
    let cache = FileCache::new(&config.cache.path);
    info!("Metadata cache rooted at {:?}", cache.root());
    let image_hosts = ImageHostPolicy::from_config(&config.catalog);
    info!("Image pass-through hosts: {:?}", image_hosts.hosts());
    let provider = Arc::new(
        OmdbProvider::new(catalog, cache, config.metadata.merge_options())
            .with_image_hosts(image_hosts),
    );

    let addr = SocketAddr::new(config.server.host, config.server.port);

    // Create app state and router
    let state = Arc::new(AppState::new(config, provider));
    let app = create_router(state);

    // Start server
    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server stopped");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
