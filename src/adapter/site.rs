use crate::adapter::{Adapter, FilmDetailAdapter, OverviewAdapter, Processed};
use crate::config::{CrawlerConfig, SiteConfig};
use crate::fetch::Fetch;
use crate::model::{Document, MediaRecord, PageKind, WorkItem};
use crate::{ConfigError, ParseError};
use std::sync::Arc;
use std::time::Duration;

/// Adapter for one configured site
///
/// Overview items go to the selector-driven listing adapter, detail items
/// to the JSON film adapter. All requests of the site share one upstream
/// key, the site name.
pub struct SiteAdapter {
    name: String,
    overview: OverviewAdapter,
    detail: FilmDetailAdapter,
}

impl SiteAdapter {
    pub fn new(name: impl Into<String>, overview: OverviewAdapter, detail: FilmDetailAdapter) -> Self {
        Self {
            name: name.into(),
            overview,
            detail,
        }
    }

    /// Builds the adapter for `site`; manifests are fetched through `fetcher`
    pub fn from_config(
        site: &SiteConfig,
        crawler: &CrawlerConfig,
        fetcher: Arc<dyn Fetch>,
    ) -> Result<Self, ConfigError> {
        let overview = OverviewAdapter::from_site(site, crawler.max_subpages)?;
        let detail = FilmDetailAdapter::new(&site.name)
            .with_manifest_fetcher(fetcher, Duration::from_millis(crawler.fetch_timeout_ms));

        Ok(Self::new(&site.name, overview, detail))
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Adapter for SiteAdapter {
    type Output = MediaRecord;

    fn process(&self, item: &WorkItem, document: &Document) -> Result<Processed<MediaRecord>, ParseError> {
        match item.kind() {
            PageKind::Overview => self.overview.process(item, document),
            PageKind::Detail => self.detail.process(item, document),
        }
    }

    fn next_page(&self, item: &WorkItem, document: &Document) -> Option<WorkItem> {
        match item.kind() {
            PageKind::Overview => self.overview.next_page(item, document),
            PageKind::Detail => None,
        }
    }

    fn upstream_key(&self, _item: &WorkItem) -> String {
        self.name.clone()
    }
}
