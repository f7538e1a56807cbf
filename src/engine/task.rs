//! Recursive crawl task
//!
//! A batch of work items is split in half until it is small enough to be
//! processed inline; the halves run through `rayon::join` on the engine's
//! pool and their results are merged left to right. Processing an item
//! fetches it, hands the document to the adapter and crawls the discovered
//! items as a new batch, so the recursion follows the site's link structure.
//!
//! Every item is claimed in a run-wide processed set before it is fetched.
//! Whichever branch claims an item first does the work; every other branch
//! that discovers it skips it. Results carry the identity of the item that
//! produced them, so a claim race never changes which result survives.

use crate::adapter::{Adapter, Processed};
use crate::config::Config;
use crate::engine::aggregate::ResultSet;
use crate::engine::cancel::CancelHandle;
use crate::engine::summary::{CrawlOutcome, ItemFailure, SummaryCounters};
use crate::fetch::Fetch;
use crate::model::{ItemKey, WorkItem};
use crate::{CrawlError, ItemError, ParseError};
use dashmap::DashSet;
use parking_lot::Mutex;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Engine tuning
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSettings {
    /// Number of worker threads
    pub parallelism: usize,

    /// Batches at or below this size are processed inline
    pub split_threshold: usize,

    /// Per-request timeout handed to the fetcher
    pub fetch_timeout: Duration,
}

impl EngineSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            parallelism: config
                .crawler
                .parallelism
                .unwrap_or_else(default_parallelism),
            split_threshold: config.crawler.split_threshold,
            fetch_timeout: Duration::from_millis(config.crawler.fetch_timeout_ms),
        }
    }

    fn validate(&self) -> Result<(), CrawlError> {
        if self.parallelism == 0 {
            return Err(CrawlError::InvalidSettings(
                "parallelism must be at least 1".to_string(),
            ));
        }
        if self.split_threshold == 0 {
            return Err(CrawlError::InvalidSettings(
                "split threshold must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            parallelism: default_parallelism(),
            split_threshold: 4,
            fetch_timeout: Duration::from_secs(30),
        }
    }
}

fn default_parallelism() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

/// Fork/join crawl engine over a fixed worker pool
///
/// One engine can run any number of crawls, one after another or
/// concurrently; each run has its own processed set and counters. The
/// fetcher (and with it the rate limiter state) is shared by all runs.
pub struct CrawlEngine {
    fetcher: Arc<dyn Fetch>,
    pool: ThreadPool,
    settings: EngineSettings,
}

impl CrawlEngine {
    /// Creates an engine, building its worker pool
    ///
    /// # Errors
    ///
    /// * `CrawlError::InvalidSettings` - zero parallelism or split threshold
    /// * `CrawlError::Pool` - the worker threads could not be spawned
    pub fn new(fetcher: Arc<dyn Fetch>, settings: EngineSettings) -> crate::Result<Self> {
        settings.validate()?;

        let pool = ThreadPoolBuilder::new()
            .num_threads(settings.parallelism)
            .thread_name(|i| format!("crawl-worker-{}", i))
            .build()?;

        Ok(Self {
            fetcher,
            pool,
            settings,
        })
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Crawls from `seeds` until no new work is discovered
    pub fn crawl<A: Adapter>(&self, seeds: Vec<WorkItem>, adapter: &A) -> CrawlOutcome<A::Output> {
        self.crawl_with_cancel(seeds, adapter, &CancelHandle::new())
    }

    /// Crawls from `seeds`, stopping early once `cancel` is triggered
    ///
    /// A cancelled run still returns everything collected up to that point,
    /// with `cancelled` set on the outcome.
    pub fn crawl_with_cancel<A: Adapter>(
        &self,
        seeds: Vec<WorkItem>,
        adapter: &A,
        cancel: &CancelHandle,
    ) -> CrawlOutcome<A::Output> {
        let started = Instant::now();
        info!(
            seeds = seeds.len(),
            parallelism = self.settings.parallelism,
            split_threshold = self.settings.split_threshold,
            "Starting crawl"
        );

        let run = CrawlRun {
            adapter,
            fetcher: self.fetcher.as_ref(),
            settings: &self.settings,
            cancel,
            processed: DashSet::new(),
            counters: SummaryCounters::default(),
            failures: Mutex::new(Vec::new()),
        };

        run.counters.add_discovered(seeds.len());
        let results = self.pool.install(|| run.crawl_batch(seeds));

        let cancelled = cancel.is_cancelled();
        let collisions = results.collisions();
        let results = results.into_vec();
        let summary = run.counters.snapshot(results.len(), started.elapsed());

        let mut failures = run.failures.into_inner();
        failures.sort_by(|a, b| a.item.url.cmp(&b.item.url));

        info!(
            results = summary.results,
            fetched = summary.fetched,
            failed = summary.failed,
            deduplicated = summary.deduplicated,
            collisions,
            cancelled,
            "Crawl finished in {:.1}s",
            summary.elapsed.as_secs_f64()
        );

        CrawlOutcome {
            results,
            summary,
            failures,
            cancelled,
        }
    }
}

/// State shared by every branch of one crawl run
struct CrawlRun<'a, A: Adapter> {
    adapter: &'a A,
    fetcher: &'a dyn Fetch,
    settings: &'a EngineSettings,
    cancel: &'a CancelHandle,
    processed: DashSet<ItemKey>,
    counters: SummaryCounters,
    failures: Mutex<Vec<ItemFailure>>,
}

impl<'a, A: Adapter> CrawlRun<'a, A> {
    fn crawl_batch(&self, mut items: Vec<WorkItem>) -> ResultSet<A::Output> {
        if items.is_empty() || self.cancel.is_cancelled() {
            return ResultSet::new();
        }

        if items.len() <= self.settings.split_threshold {
            return self.process_inline(items);
        }

        let right = items.split_off(items.len() / 2);
        let (mut left, right) = rayon::join(
            || self.crawl_batch(items),
            || self.crawl_batch(right),
        );
        left.merge(right);
        left
    }

    fn process_inline(&self, items: Vec<WorkItem>) -> ResultSet<A::Output> {
        let mut results = ResultSet::new();

        for item in items {
            if self.cancel.is_cancelled() {
                debug!("Cancelled, not starting {}", item);
                break;
            }
            results.merge(self.process_item(&item));
        }

        results
    }

    fn process_item(&self, item: &WorkItem) -> ResultSet<A::Output> {
        let key = item.key();
        if !self.processed.insert(key.clone()) {
            debug!("Already claimed: {}", item);
            self.counters.record_deduplicated();
            return ResultSet::new();
        }

        let upstream = self.adapter.upstream_key(item);
        let document = match self
            .fetcher
            .fetch(&item.url, &upstream, self.settings.fetch_timeout)
        {
            Ok(document) => {
                self.counters.record_fetched();
                document
            }
            Err(e) => {
                self.record_failure(item, ItemError::Fetch(e));
                return ResultSet::new();
            }
        };

        let outcome = catch_unwind(AssertUnwindSafe(|| -> Result<_, ParseError> {
            let processed = self.adapter.process(item, &document)?;
            let next = self.adapter.next_page(item, &document);
            Ok((processed, next))
        }));

        let (processed, next) = match outcome {
            Ok(Ok(parts)) => parts,
            Ok(Err(e)) => {
                self.record_failure(item, ItemError::Parse(e));
                return ResultSet::new();
            }
            Err(payload) => {
                self.record_failure(item, ItemError::Panicked(panic_message(&*payload)));
                return ResultSet::new();
            }
        };

        let Processed {
            mut new_items,
            results: found,
        } = processed;
        new_items.extend(next);

        debug!(
            discovered = new_items.len(),
            results = found.len(),
            "Processed {}",
            item
        );

        let mut results = ResultSet::from_item(&key, found);
        if !new_items.is_empty() {
            self.counters.add_discovered(new_items.len());
            results.merge(self.crawl_batch(new_items));
        }
        results
    }

    fn record_failure(&self, item: &WorkItem, error: ItemError) {
        warn!(url = %item.url, "Work item failed: {}", error);
        self.counters.record_failed();
        self.failures.lock().push(ItemFailure {
            item: item.clone(),
            error,
        });
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
