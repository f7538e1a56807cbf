//! Mediacrawl: a recursive, rate-limited broadcaster catalog crawler
//!
//! This crate turns seed pages from broadcaster web properties and APIs into a
//! deduplicated set of media records. The core is a fork/join crawl engine
//! running on a fixed worker pool, a per-upstream rate-limited fetcher and an
//! HLS manifest quality resolver. Site-specific logic plugs in through the
//! [`adapter::Adapter`] trait.

pub mod adapter;
pub mod config;
pub mod engine;
pub mod fetch;
pub mod manifest;
pub mod model;
pub mod url;

use thiserror::Error;

/// Run-level error: the crawl could not be attempted at all
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid engine settings: {0}")]
    InvalidSettings(String),

    #[error("Failed to build worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid CSS selector: {0}")]
    InvalidSelector(String),
}

/// Failure to retrieve a single URL
///
/// Always item-scoped: the engine records it against the failing work item
/// and carries on with the rest of the batch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("request timed out")]
    Timeout,

    #[error("HTTP status {0}")]
    HttpStatus(u16),

    #[error("network error: {0}")]
    Network(String),
}

impl FetchError {
    /// Returns true if the failure may go away on retry
    ///
    /// HTTP status errors are answers from the upstream and are never retried.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Timeout | Self::Network(_))
    }
}

/// Failure to make sense of a fetched document
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("malformed document: {0}")]
    MalformedDocument(String),

    #[error("missing expected structure: {0}")]
    MissingExpectedStructure(String),
}

/// Failure to read a single manifest entry
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ManifestError {
    #[error("unparsable manifest entry: {0}")]
    UnparsableEntry(String),
}

/// Everything that can go wrong while processing one work item
#[derive(Debug, Clone, Error)]
pub enum ItemError {
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("parse failed: {0}")]
    Parse(#[from] ParseError),

    #[error("adapter panicked: {0}")]
    Panicked(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,
}

/// Result type alias for run-level operations
pub type Result<T> = std::result::Result<T, CrawlError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use adapter::{Adapter, Processed, SiteAdapter};
pub use config::Config;
pub use engine::{CancelHandle, CrawlEngine, CrawlOutcome, CrawlSummary, EngineSettings};
pub use fetch::{Fetch, Fetcher};
pub use manifest::{classify, ManifestEntry, QualityTier};
pub use model::{DedupKey, Document, GeoLocation, MediaRecord, PageKind, WorkItem};
