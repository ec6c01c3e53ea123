//! IMDb identifiers as used by the OMDb catalog.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Prefix carried by every canonical title identifier.
pub const IMDB_PREFIX: &str = "tt";

/// Key under which hosts store the IMDb id in their provider-id maps.
pub const IMDB_PROVIDER_KEY: &str = "Imdb";

/// Errors produced when parsing an identifier.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum IdError {
    /// The identifier was empty or whitespace.
    #[error("IMDb id is required")]
    Blank,

    /// The identifier contains characters outside `tt` + alphanumerics.
    #[error("Malformed IMDb id: {0}")]
    Malformed(String),
}

/// A canonical IMDb id (`tt` followed by alphanumerics).
///
/// Inputs without the prefix are normalized by prepending it, so `"0111161"`
/// and `"tt0111161"` resolve to the same id and the same cache entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ImdbId(String);

impl ImdbId {
    /// Parse and canonicalize a raw identifier.
    pub fn new(raw: &str) -> Result<Self, IdError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(IdError::Blank);
        }

        let body = match trimmed.get(..IMDB_PREFIX.len()) {
            Some(prefix) if prefix.eq_ignore_ascii_case(IMDB_PREFIX) => {
                &trimmed[IMDB_PREFIX.len()..]
            }
            _ => trimmed,
        };

        if body.is_empty() || !body.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(IdError::Malformed(raw.to_string()));
        }

        Ok(Self(format!("{}{}", IMDB_PREFIX, body)))
    }

    /// Parse an optional identifier where blank means "absent".
    ///
    /// Malformed ids are still reported so that a bad host value fails fast
    /// instead of silently falling back to a title search.
    pub fn parse_optional(raw: Option<&str>) -> Result<Option<Self>, IdError> {
        match raw {
            Some(value) if !value.trim().is_empty() => Self::new(value).map(Some),
            _ => Ok(None),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ImdbId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ImdbId {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<ImdbId> for String {
    fn from(id: ImdbId) -> Self {
        id.0
    }
}

impl AsRef<str> for ImdbId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
