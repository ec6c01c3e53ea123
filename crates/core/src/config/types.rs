use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;

use crate::catalog::{OmdbConfig, DEFAULT_BASE_URL, DEFAULT_IMAGE_BASE_URL};
use crate::merge::MergeOptions;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    pub catalog: OmdbConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub metadata: MetadataConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    8080
}

/// Metadata cache configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
    /// Cache root; documents live in its `omdb` subdirectory.
    #[serde(default = "default_cache_path")]
    pub path: PathBuf,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            path: default_cache_path(),
        }
    }
}

fn default_cache_path() -> PathBuf {
    PathBuf::from("cache")
}

/// Merge behavior toggles
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct MetadataConfig {
    /// Use English-only fields regardless of the requested language.
    #[serde(default)]
    pub extended_support: bool,
    /// Include director, writer and actors.
    #[serde(default)]
    pub cast_and_crew: bool,
}

impl MetadataConfig {
    pub fn merge_options(&self) -> MergeOptions {
        MergeOptions {
            extended_support: self.extended_support,
            cast_and_crew: self.cast_and_crew,
        }
    }
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub catalog: SanitizedCatalogConfig,
    pub cache: CacheConfig,
    pub metadata: MetadataConfig,
}

/// Sanitized catalog config (API key hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedCatalogConfig {
    pub base_url: String,
    pub image_base_url: String,
    pub api_key_configured: bool,
    pub timeout_secs: u64,
    pub poster_hosts: Vec<String>,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        let catalog = &config.catalog;
        Self {
            server: config.server.clone(),
            catalog: SanitizedCatalogConfig {
                base_url: catalog
                    .base_url
                    .clone()
                    .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
                image_base_url: catalog
                    .image_base_url
                    .clone()
                    .unwrap_or_else(|| DEFAULT_IMAGE_BASE_URL.to_string()),
                api_key_configured: !catalog.api_key.trim().is_empty(),
                timeout_secs: catalog.timeout_secs,
                poster_hosts: catalog.poster_hosts.clone(),
            },
            cache: config.cache.clone(),
            metadata: config.metadata.clone(),
        }
    }
}
