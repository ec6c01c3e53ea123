//! Hosts the image pass-through may fetch from.

use reqwest::Url;

use super::omdb::{OmdbConfig, DEFAULT_IMAGE_BASE_URL};

/// Poster CDN used by OMDb documents.
pub const DEFAULT_POSTER_HOSTS: &[&str] = &["m.media-amazon.com"];

/// Allow-list of image hosts.
///
/// Only `http`/`https` URLs whose host matches an entry exactly (case
/// insensitive) pass. Credentials in the URL are rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageHostPolicy {
    hosts: Vec<String>,
}

impl ImageHostPolicy {
    pub fn new<I, S>(hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut hosts: Vec<String> = hosts
            .into_iter()
            .map(|h| h.as_ref().trim().to_ascii_lowercase())
            .filter(|h| !h.is_empty())
            .collect();
        hosts.sort();
        hosts.dedup();
        Self { hosts }
    }

    /// The image service host plus the configured poster hosts.
    pub fn from_config(config: &OmdbConfig) -> Self {
        let base = config
            .image_base_url
            .as_deref()
            .unwrap_or(DEFAULT_IMAGE_BASE_URL);
        let base_host = Url::parse(base)
            .ok()
            .and_then(|url| url.host_str().map(str::to_string));

        Self::new(base_host.into_iter().chain(config.poster_hosts.iter().cloned()))
    }

    pub fn hosts(&self) -> &[String] {
        &self.hosts
    }

    /// Parse `raw` and check it against the allow-list.
    pub fn check(&self, raw: &str) -> Result<Url, String> {
        let url = Url::parse(raw.trim()).map_err(|e| format!("Invalid image url: {}", e))?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(format!("Unsupported image url scheme: {}", url.scheme()));
        }
        if !url.username().is_empty() || url.password().is_some() {
            return Err("Image url must not carry credentials".to_string());
        }

        let host = url
            .host_str()
            .map(str::to_ascii_lowercase)
            .ok_or_else(|| "Image url has no host".to_string())?;
        if !self.hosts.iter().any(|allowed| *allowed == host) {
            return Err(format!("Image host not allowed: {}", host));
        }

        Ok(url)
    }
}

impl Default for ImageHostPolicy {
    fn default() -> Self {
        Self::from_config(&OmdbConfig::new(""))
    }
}
