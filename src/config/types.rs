use serde::Deserialize;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    #[serde(default, rename = "site")]
    pub sites: Vec<SiteConfig>,
}

impl Config {
    /// Looks up a site by name
    pub fn site(&self, name: &str) -> Option<&SiteConfig> {
        self.sites.iter().find(|s| s.name == name)
    }
}

/// Engine and fetcher behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Maximum number of chained overview pages per seed
    #[serde(rename = "max-subpages")]
    pub max_subpages: u32,

    /// Worker thread count (defaults to the number of cores)
    #[serde(default)]
    pub parallelism: Option<usize>,

    /// Minimum time between requests to the same upstream (milliseconds)
    #[serde(rename = "per-upstream-min-interval-ms")]
    pub per_upstream_min_interval_ms: u64,

    /// Per-request timeout (milliseconds)
    #[serde(rename = "fetch-timeout-ms")]
    pub fetch_timeout_ms: u64,

    /// Extra attempts after a timeout or network error
    #[serde(rename = "retry-budget")]
    pub retry_budget: u32,

    /// Backoff unit between retries (milliseconds)
    #[serde(rename = "retry-backoff-ms", default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Batches at or below this size are processed inline instead of split
    #[serde(rename = "split-threshold", default = "default_split_threshold")]
    pub split_threshold: usize,
}

fn default_retry_backoff_ms() -> u64 {
    500
}

fn default_split_threshold() -> usize {
    4
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

/// One broadcaster property to crawl
///
/// Sites are data: the shipped overview and detail adapters are driven
/// entirely by these selectors and URL templates.
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// Sender name; also the upstream key for rate limiting
    pub name: String,

    /// Overview pages to start from
    #[serde(default)]
    pub seeds: Vec<String>,

    /// Topic label given to items discovered from the seeds
    #[serde(default)]
    pub topic: Option<String>,

    /// Day page URL with a `{date}` placeholder
    #[serde(rename = "day-url-template", default)]
    pub day_url_template: Option<String>,

    /// chrono format string used to fill `{date}`
    #[serde(rename = "date-format", default = "default_date_format")]
    pub date_format: String,

    /// Number of past days to generate day pages for
    #[serde(rename = "max-days-past", default)]
    pub max_days_past: u32,

    /// Number of future days to generate day pages for
    #[serde(rename = "max-days-future", default)]
    pub max_days_future: u32,

    /// Selector for links to detail documents on overview pages
    #[serde(rename = "entry-selector")]
    pub entry_selector: String,

    /// Selector for the single "next page" link
    #[serde(rename = "next-page-selector", default)]
    pub next_page_selector: Option<String>,

    /// Selector for a topic heading on overview pages
    #[serde(rename = "topic-selector", default)]
    pub topic_selector: Option<String>,

    /// Selector, inside an entry, of a marker that excludes the entry
    #[serde(rename = "skip-marker-selector", default)]
    pub skip_marker_selector: Option<String>,

    /// Text the skip marker must contain for the entry to be excluded
    #[serde(rename = "skip-marker-text", default)]
    pub skip_marker_text: Option<String>,
}

fn default_date_format() -> String {
    "%Y-%m-%d".to_string()
}
