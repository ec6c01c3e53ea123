use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Catalog API key is not blank
/// - Catalog timeout is not 0
/// - Poster hosts are not blank
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if config.catalog.api_key.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "catalog.api_key is required".to_string(),
        ));
    }

    if config.catalog.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "catalog.timeout_secs cannot be 0".to_string(),
        ));
    }

    if config.catalog.poster_hosts.iter().any(|h| h.trim().is_empty()) {
        return Err(ConfigError::ValidationError(
            "catalog.poster_hosts cannot contain blank entries".to_string(),
        ));
    }

    Ok(())
}
