pub mod cache;
pub mod catalog;
pub mod config;
pub mod fetcher;
pub mod ids;
pub mod merge;
pub mod metrics;
pub mod normalize;
pub mod provider;
pub mod resolver;
pub mod testing;

pub use cache::{CacheError, CacheKey, Clock, FileCache, SystemClock, FRESHNESS_WINDOW};
pub use catalog::{
    CatalogApi, CatalogError, CatalogQuery, ImageHostPolicy, ImageResponse, MetadataDocument,
    OmdbClient, OmdbConfig, SeasonDocument, SubjectKind,
};
pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, SanitizedConfig,
};
pub use fetcher::MetadataFetcher;
pub use ids::{IdError, ImdbId};
pub use merge::{MediaItem, MergeOptions, MetadataResult, PersonInfo, PersonKind};
pub use provider::{OmdbProvider, ProviderError, RemoteImageInfo};
pub use resolver::{IdentifierResolver, LookupInfo, LookupQuery, RemoteSearchResult, SearchResults};
