use std::sync::Arc;
use omdb_core::{Config, OmdbProvider, SanitizedConfig};

/// Shared application state
pub struct AppState {
    config: Config,
    provider: Arc<OmdbProvider>,
}

impl AppState {
    pub fn new(config: Config, provider: Arc<OmdbProvider>) -> Self {
        Self { config, provider }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn provider(&self) -> &OmdbProvider {
        self.provider.as_ref()
    }
}
