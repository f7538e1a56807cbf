//! Selector-driven listing pages
//!
//! An overview page lists teasers linking to detail documents and may link
//! to a single follow-up page. Everything site-specific is a CSS selector
//! taken from the site's configuration.

use crate::adapter::{Adapter, Processed};
use crate::config::SiteConfig;
use crate::model::{Document, MediaRecord, WorkItem};
use crate::url::{normalize_url, resolve_href};
use crate::{ConfigError, ParseError};
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Marker inside an entry that excludes it (e.g. audio-only teasers)
#[derive(Debug, Clone)]
struct SkipMarker {
    selector: Selector,
    text: Option<String>,
}

#[derive(Debug, Clone)]
pub struct OverviewAdapter {
    name: String,
    entry: Selector,
    link: Selector,
    next_page: Option<Selector>,
    topic: Option<Selector>,
    skip_marker: Option<SkipMarker>,
    max_subpages: u32,
}

impl OverviewAdapter {
    /// Creates an adapter following every link matched by `entry_selector`
    pub fn new(
        name: impl Into<String>,
        entry_selector: &str,
        max_subpages: u32,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            name: name.into(),
            entry: parse_selector(entry_selector)?,
            link: parse_selector("a[href]")?,
            next_page: None,
            topic: None,
            skip_marker: None,
            max_subpages,
        })
    }

    pub fn with_next_page_selector(mut self, selector: &str) -> Result<Self, ConfigError> {
        self.next_page = Some(parse_selector(selector)?);
        Ok(self)
    }

    pub fn with_topic_selector(mut self, selector: &str) -> Result<Self, ConfigError> {
        self.topic = Some(parse_selector(selector)?);
        Ok(self)
    }

    /// Excludes entries containing `selector`, or only those whose marker
    /// text contains `text` when one is given
    pub fn with_skip_marker(mut self, selector: &str, text: Option<String>) -> Result<Self, ConfigError> {
        self.skip_marker = Some(SkipMarker {
            selector: parse_selector(selector)?,
            text,
        });
        Ok(self)
    }

    pub fn from_site(site: &SiteConfig, max_subpages: u32) -> Result<Self, ConfigError> {
        let mut adapter = Self::new(&site.name, &site.entry_selector, max_subpages)?;

        if let Some(selector) = &site.next_page_selector {
            adapter = adapter.with_next_page_selector(selector)?;
        }
        if let Some(selector) = &site.topic_selector {
            adapter = adapter.with_topic_selector(selector)?;
        }
        if let Some(selector) = &site.skip_marker_selector {
            adapter = adapter.with_skip_marker(selector, site.skip_marker_text.clone())?;
        }

        Ok(adapter)
    }

    /// Detail items linked from an overview page
    pub fn extract_entries(&self, item: &WorkItem, document: &Document) -> Result<Vec<WorkItem>, ParseError> {
        let base = document.base_url()?;
        let html = document.html();

        let topic = self
            .page_topic(&html)
            .or_else(|| item.topic().map(str::to_string));

        let mut entries = Vec::new();
        for element in html.select(&self.entry) {
            if self.is_skipped(&element) {
                tracing::trace!("Skipping marked entry on {}", item.url);
                continue;
            }

            if let Some(url) = self.entry_link(&element, &base) {
                entries.push(WorkItem::detail(url).with_topic(topic.clone()));
            }
        }

        Ok(entries)
    }

    /// URL of the follow-up page, if exactly one next-page link exists
    pub fn find_next_page(&self, document: &Document) -> Option<String> {
        let selector = self.next_page.as_ref()?;
        let base = document.base_url().ok()?;
        let html = document.html();

        let mut links = html.select(selector);
        let first = links.next()?;
        if links.next().is_some() {
            return None;
        }

        first
            .value()
            .attr("href")
            .and_then(|href| discovered_url(href, &base))
    }

    fn page_topic(&self, html: &Html) -> Option<String> {
        let selector = self.topic.as_ref()?;
        html.select(selector)
            .next()
            .map(|element| element.text().collect::<String>().trim().to_string())
            .filter(|topic| !topic.is_empty())
    }

    fn is_skipped(&self, entry: &ElementRef<'_>) -> bool {
        let Some(marker) = &self.skip_marker else {
            return false;
        };

        match entry.select(&marker.selector).next() {
            None => false,
            Some(found) => match &marker.text {
                None => true,
                Some(text) => found.text().collect::<String>().contains(text.as_str()),
            },
        }
    }

    fn entry_link(&self, entry: &ElementRef<'_>, base: &Url) -> Option<String> {
        let href = match entry.value().attr("href") {
            Some(href) => href,
            None => entry.select(&self.link).next()?.value().attr("href")?,
        };
        discovered_url(href, base)
    }
}

/// Resolves a link found on a page into the canonical form work items use
fn discovered_url(href: &str, base: &Url) -> Option<String> {
    let resolved = resolve_href(href, base)?;
    normalize_url(&resolved).ok().map(String::from)
}

impl Adapter for OverviewAdapter {
    type Output = MediaRecord;

    fn process(&self, item: &WorkItem, document: &Document) -> Result<Processed<MediaRecord>, ParseError> {
        Ok(Processed::items(self.extract_entries(item, document)?))
    }

    fn next_page(&self, item: &WorkItem, document: &Document) -> Option<WorkItem> {
        if item.page() >= self.max_subpages {
            return None;
        }
        self.find_next_page(document).map(|url| item.next_page(url))
    }

    fn upstream_key(&self, _item: &WorkItem) -> String {
        self.name.clone()
    }
}

fn parse_selector(selector: &str) -> Result<Selector, ConfigError> {
    Selector::parse(selector)
        .map_err(|e| ConfigError::InvalidSelector(format!("'{}': {:?}", selector, e)))
}
