//! Recursive fork/join crawl engine
//!
//! This module contains:
//! - `CrawlEngine`: splits work batches across a worker pool, fetches,
//!   hands documents to the adapter and recurses on discovered items
//! - `ResultSet`: the deduplicating, deterministic result merge
//! - `CrawlSummary` and `CrawlOutcome`: what a run reports back
//! - `CancelHandle`: cooperative cancellation of a running crawl

mod aggregate;
mod cancel;
mod summary;
mod task;

pub use aggregate::ResultSet;
pub use cancel::CancelHandle;
pub use summary::{print_summary, CrawlOutcome, CrawlSummary, ItemFailure};
pub use task::{CrawlEngine, EngineSettings};
