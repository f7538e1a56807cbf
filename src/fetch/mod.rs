//! Rate-limited document retrieval
//!
//! This module contains:
//! - The `Fetch` trait the engine and adapters retrieve documents through
//! - `RateLimiter`, the per-upstream-key request gate
//! - `Fetcher`, the blocking HTTP implementation with bounded retries

mod fetcher;
mod rate_limiter;

pub use fetcher::{build_http_client, Fetcher, FetcherSettings};
pub use rate_limiter::RateLimiter;

use crate::model::Document;
use crate::FetchError;
use std::time::Duration;

/// Source of documents for the crawl engine
///
/// Implementations are shared by every worker thread of a run. A call blocks
/// the calling worker until the document is available or the fetch failed;
/// failures are always returned as values.
pub trait Fetch: Send + Sync {
    /// Retrieves `url`, accounting the request against `upstream_key`
    fn fetch(&self, url: &str, upstream_key: &str, timeout: Duration)
        -> Result<Document, FetchError>;
}
