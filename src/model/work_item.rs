use crate::url::normalize_url;
use crate::UrlResult;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Routing label an adapter attaches to a work item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PageKind {
    /// A listing page (topic archive, letter page, day page)
    Overview,

    /// A page or API document describing one broadcast
    Detail,
}

/// Adapter-defined context carried alongside a URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemContext {
    /// How the adapter should treat the fetched document
    pub kind: PageKind,

    /// Topic label inherited from the page that discovered this item
    pub topic: Option<String>,

    /// Pagination depth, 1 for seeds
    pub page: u32,
}

/// One unit of crawl work
///
/// Two items are the same unit of work when their URL, kind and topic match.
/// The page counter is carried for pagination limits only and does not take
/// part in identity, so a page reached again through a different chain is
/// not fetched twice.
#[derive(Debug, Clone)]
pub struct WorkItem {
    pub url: String,
    pub context: ItemContext,
}

/// Identity of a work item in the run-scoped processed set
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemKey {
    pub url: String,
    pub kind: PageKind,
    pub topic: Option<String>,
}

impl WorkItem {
    /// Creates a first-page item of the given kind
    pub fn new(url: impl Into<String>, kind: PageKind) -> Self {
        Self {
            url: url.into(),
            context: ItemContext {
                kind,
                topic: None,
                page: 1,
            },
        }
    }

    /// Creates an item after normalizing its URL
    pub fn parse(url: &str, kind: PageKind) -> UrlResult<Self> {
        let normalized = normalize_url(url)?;
        Ok(Self::new(normalized.as_str(), kind))
    }

    /// Creates an overview item
    pub fn overview(url: impl Into<String>) -> Self {
        Self::new(url, PageKind::Overview)
    }

    /// Creates a detail item
    pub fn detail(url: impl Into<String>) -> Self {
        Self::new(url, PageKind::Detail)
    }

    pub fn with_topic(mut self, topic: Option<String>) -> Self {
        self.context.topic = topic;
        self
    }

    pub fn with_page(mut self, page: u32) -> Self {
        self.context.page = page;
        self
    }

    /// The follow-up page of this item: same kind and topic, one page deeper
    pub fn next_page(&self, url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            context: ItemContext {
                kind: self.context.kind,
                topic: self.context.topic.clone(),
                page: self.context.page.saturating_add(1),
            },
        }
    }

    pub fn kind(&self) -> PageKind {
        self.context.kind
    }

    pub fn page(&self) -> u32 {
        self.context.page
    }

    pub fn topic(&self) -> Option<&str> {
        self.context.topic.as_deref()
    }

    pub fn key(&self) -> ItemKey {
        ItemKey {
            url: self.url.clone(),
            kind: self.context.kind,
            topic: self.context.topic.clone(),
        }
    }
}

impl PartialEq for WorkItem {
    fn eq(&self, other: &Self) -> bool {
        self.url == other.url
            && self.context.kind == other.context.kind
            && self.context.topic == other.context.topic
    }
}

impl Eq for WorkItem {}

impl Hash for WorkItem {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.url.hash(state);
        self.context.kind.hash(state);
        self.context.topic.hash(state);
    }
}

impl fmt::Display for WorkItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} {} (page {}", self.context.kind, self.url, self.context.page)?;
        if let Some(topic) = &self.context.topic {
            write!(f, ", topic '{}'", topic)?;
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_new_item_starts_at_first_page() {
        let item = WorkItem::overview("https://www.sr.de/archiv");
        assert_eq!(item.page(), 1);
        assert_eq!(item.kind(), PageKind::Overview);
        assert!(item.topic().is_none());
    }

    #[test]
    fn test_next_page_increments_depth_and_keeps_topic() {
        let item = WorkItem::overview("https://www.sr.de/archiv")
            .with_topic(Some("Tatort".to_string()));
        let next = item.next_page("https://www.sr.de/archiv?p=2");

        assert_eq!(next.page(), 2);
        assert_eq!(next.topic(), Some("Tatort"));
        assert_eq!(next.kind(), PageKind::Overview);
    }

    #[test]
    fn test_identity_ignores_page_depth() {
        let a = WorkItem::detail("https://x.de/1").with_page(1);
        let b = WorkItem::detail("https://x.de/1").with_page(4);

        assert_eq!(a, b);
        assert_eq!(a.key(), b.key());

        let mut set = HashSet::new();
        set.insert(a);
        assert!(!set.insert(b));
    }

    #[test]
    fn test_identity_includes_kind_and_topic() {
        let base = WorkItem::detail("https://x.de/1");
        assert_ne!(base, WorkItem::overview("https://x.de/1"));
        assert_ne!(base, base.clone().with_topic(Some("Doku".to_string())));
    }

    #[test]
    fn test_parse_normalizes_url() {
        let item = WorkItem::parse("https://X.DE/a?utm_source=feed#frag", PageKind::Detail).unwrap();
        assert_eq!(item.url, "https://x.de/a");
    }

    #[test]
    fn test_display_names_item() {
        let item = WorkItem::overview("https://x.de/a").with_topic(Some("Doku".to_string()));
        assert_eq!(item.to_string(), "Overview https://x.de/a (page 1, topic 'Doku')");
    }
}
