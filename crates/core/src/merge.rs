//! Field merge from catalog documents into the host's item model.
//!
//! The catalog is English-only, so text fields are gated on the requested
//! language unless extended support is enabled. Numeric fields are always
//! copied when they parse.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::catalog::MetadataDocument;
use crate::ids::{ImdbId, IMDB_PROVIDER_KEY};
use crate::normalize::{non_blank, parse_count, parse_float, parse_year, split_list};

const ENGLISH: &str = "en";
const UNITED_STATES: &str = "us";

/// Configuration consumed by the merge step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeOptions {
    /// Relaxes the English-only gating on name, rating, genre and overview.
    #[serde(default)]
    pub extended_support: bool,
    /// Append director, writer and actors as people.
    #[serde(default)]
    pub cast_and_crew: bool,
}

/// Item fields the merge writes into.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MediaItem {
    pub name: Option<String>,
    pub official_rating: Option<String>,
    pub production_year: Option<i32>,
    pub critic_rating: Option<f32>,
    pub community_rating: Option<f32>,
    pub home_page_url: Option<String>,
    pub provider_ids: HashMap<String, String>,
    pub genres: Vec<String>,
    pub overview: Option<String>,
    /// Language the item is configured for; drives genre and overview gating.
    pub preferred_metadata_language: Option<String>,
}

impl MediaItem {
    pub fn imdb_id(&self) -> Option<&str> {
        self.provider_ids.get(IMDB_PROVIDER_KEY).map(String::as_str)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PersonKind {
    Actor,
    Director,
    Writer,
}

/// One cast or crew contribution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonInfo {
    pub name: String,
    pub kind: PersonKind,
}

/// Result handed back to the host for one subject.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetadataResult {
    pub item: MediaItem,
    pub people: Vec<PersonInfo>,
    pub has_metadata: bool,
    pub queried_by_id: bool,
}

impl MetadataResult {
    /// Empty result for an item configured for `preferred_language`.
    pub fn new(preferred_language: Option<&str>, queried_by_id: bool) -> Self {
        Self {
            item: MediaItem {
                preferred_metadata_language: preferred_language.map(str::to_string),
                ..Default::default()
            },
            people: Vec::new(),
            has_metadata: false,
            queried_by_id,
        }
    }
}

fn is_english(language: Option<&str>) -> bool {
    language.is_some_and(|l| l.trim().eq_ignore_ascii_case(ENGLISH))
}

/// Copy a document's fields into `result`.
///
/// `language` and `country` are the per-request metadata locale; the item's
/// own preferred language gates genre and overview.
pub fn merge_document(
    result: &mut MetadataResult,
    document: &MetadataDocument,
    language: Option<&str>,
    country: Option<&str>,
    options: &MergeOptions,
) {
    let item = &mut result.item;

    if is_english(language) || options.extended_support {
        if let Some(title) = non_blank(document.title.as_deref()) {
            item.name = Some(title.to_string());
        }

        let is_us = country.is_some_and(|c| c.trim().eq_ignore_ascii_case(UNITED_STATES));
        if is_us {
            if let Some(rated) = non_blank(document.rated.as_deref()) {
                item.official_rating = Some(rated.to_string());
            }
        }
    }

    if let Some(year) = document.year.as_deref().and_then(parse_year) {
        item.production_year = Some(year);
    }

    if let Some(score) = document.critic_score() {
        item.critic_rating = Some(score);
    }

    // Parsed for validation only; the item model has no vote count.
    if let Some(votes) = document.imdb_votes.as_deref().and_then(parse_count) {
        trace!("Ignoring vote count {} for {:?}", votes, document.imdb_id);
    }

    if let Some(rating) = document.imdb_rating.as_deref().and_then(parse_float) {
        item.community_rating = Some(rating);
    }

    if let Some(website) = non_blank(document.website.as_deref()) {
        item.home_page_url = Some(website.to_string());
    }

    if let Some(Ok(id)) = non_blank(document.imdb_id.as_deref()).map(ImdbId::new) {
        item.provider_ids
            .insert(IMDB_PROVIDER_KEY.to_string(), id.to_string());
    }

    merge_additional(result, document, options);
}

fn merge_additional(result: &mut MetadataResult, document: &MetadataDocument, options: &MergeOptions) {
    let item = &mut result.item;
    let configured_for_english =
        is_english(item.preferred_metadata_language.as_deref()) || options.extended_support;

    if configured_for_english {
        if let Some(genre) = non_blank(document.genre.as_deref()) {
            item.genres = split_list(genre);
        }
        if let Some(plot) = non_blank(document.plot.as_deref()) {
            item.overview = Some(plot.to_string());
        }
    }

    if !options.cast_and_crew {
        return;
    }

    if let Some(director) = non_blank(document.director.as_deref()) {
        result.people.push(PersonInfo {
            name: director.to_string(),
            kind: PersonKind::Director,
        });
    }

    if let Some(writer) = non_blank(document.writer.as_deref()) {
        result.people.push(PersonInfo {
            name: writer.to_string(),
            kind: PersonKind::Writer,
        });
    }

    if let Some(actors) = non_blank(document.actors.as_deref()) {
        result
            .people
            .extend(split_list(actors).into_iter().map(|name| PersonInfo {
                name,
                kind: PersonKind::Actor,
            }));
    }
}
