//! Site adapters
//!
//! An adapter is the site-specific half of a crawl: given a fetched
//! document it extracts terminal results and further work items. The
//! engine knows nothing about markup or APIs; everything it needs from a
//! site goes through the [`Adapter`] trait.
//!
//! Shipped adapters:
//! - `OverviewAdapter`: selector-driven HTML listing pages, paginated
//! - `FilmDetailAdapter`: JSON detail documents with stream variants
//! - `SiteAdapter`: routes items of one configured site to the two above

mod days;
mod film_detail;
mod overview;
mod site;

pub use days::{day_urls, site_seeds};
pub use film_detail::FilmDetailAdapter;
pub use overview::OverviewAdapter;
pub use site::SiteAdapter;

use crate::model::{DedupKey, Document, WorkItem};
use crate::url::extract_domain;
use crate::ParseError;

/// Output of processing one document
#[derive(Debug, Clone, PartialEq)]
pub struct Processed<R> {
    /// Work items discovered in the document
    pub new_items: Vec<WorkItem>,

    /// Terminal results extracted from the document
    pub results: Vec<R>,
}

impl<R> Processed<R> {
    pub fn new(new_items: Vec<WorkItem>, results: Vec<R>) -> Self {
        Self { new_items, results }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new(), Vec::new())
    }

    pub fn items(new_items: Vec<WorkItem>) -> Self {
        Self::new(new_items, Vec::new())
    }

    pub fn results(results: Vec<R>) -> Self {
        Self::new(Vec::new(), results)
    }
}

impl<R> Default for Processed<R> {
    fn default() -> Self {
        Self::empty()
    }
}

/// Site-specific processing plugged into the crawl engine
///
/// Implementations are shared by all worker threads of a run and must not
/// keep per-item mutable state.
pub trait Adapter: Send + Sync {
    type Output: DedupKey + Send;

    /// Extracts results and follow-up items from a fetched document
    fn process(
        &self,
        item: &WorkItem,
        document: &Document,
    ) -> Result<Processed<Self::Output>, ParseError>;

    /// The follow-up page of a paginated listing, if any
    ///
    /// Implementations are responsible for bounding the chain, usually by
    /// comparing `item.page()` against a configured maximum.
    fn next_page(&self, _item: &WorkItem, _document: &Document) -> Option<WorkItem> {
        None
    }

    /// Rate limiting key the item's request is accounted against
    fn upstream_key(&self, item: &WorkItem) -> String {
        extract_domain(&item.url).unwrap_or_default()
    }
}
