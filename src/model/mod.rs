//! Data model shared by the engine, the fetcher and the adapters
//!
//! # Components
//!
//! - `WorkItem`: one unit of crawl work (URL plus adapter-defined context)
//! - `Document`: a fetched payload handed to adapters
//! - `MediaRecord`: the terminal result shipped adapters produce
//! - `DedupKey`: how terminal results are deduplicated

mod document;
mod record;
mod work_item;

// Re-export main types
pub use document::Document;
pub use record::{DedupKey, GeoLocation, MediaRecord};
pub use work_item::{ItemContext, ItemKey, PageKind, WorkItem};
