//! Run counters and reporting
//!
//! Counters are updated lock-free from every worker thread and turned into a
//! `CrawlSummary` snapshot once the run has finished.

use crate::model::WorkItem;
use crate::ItemError;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Per-run counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CrawlSummary {
    /// Work items handed to the engine (seeds and discovered items)
    pub discovered: u64,

    /// Documents successfully fetched
    pub fetched: u64,

    /// Items that failed to fetch or process
    pub failed: u64,

    /// Items skipped because they were already claimed in this run
    pub deduplicated: u64,

    /// Distinct results in the final set
    pub results: u64,

    /// Wall clock time of the run
    pub elapsed: Duration,
}

/// A work item that produced no results, and why
#[derive(Debug, Clone)]
pub struct ItemFailure {
    pub item: WorkItem,
    pub error: ItemError,
}

/// Everything a crawl run hands back
#[derive(Debug)]
pub struct CrawlOutcome<R> {
    /// Deduplicated results in dedup-key order
    pub results: Vec<R>,

    pub summary: CrawlSummary,

    /// Failed items ordered by URL
    pub failures: Vec<ItemFailure>,

    /// True if the run was cut short by a `CancelHandle`
    pub cancelled: bool,
}

impl<R> CrawlOutcome<R> {
    pub fn is_complete(&self) -> bool {
        !self.cancelled && self.failures.is_empty()
    }
}

#[derive(Debug, Default)]
pub(crate) struct SummaryCounters {
    discovered: AtomicU64,
    fetched: AtomicU64,
    failed: AtomicU64,
    deduplicated: AtomicU64,
}

impl SummaryCounters {
    pub(crate) fn add_discovered(&self, count: usize) {
        self.discovered.fetch_add(count as u64, Ordering::Relaxed);
    }

    pub(crate) fn record_fetched(&self) {
        self.fetched.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_deduplicated(&self) {
        self.deduplicated.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self, results: usize, elapsed: Duration) -> CrawlSummary {
        CrawlSummary {
            discovered: self.discovered.load(Ordering::Relaxed),
            fetched: self.fetched.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            deduplicated: self.deduplicated.load(Ordering::Relaxed),
            results: results as u64,
            elapsed,
        }
    }
}

/// Prints a run summary to stdout in a formatted manner
pub fn print_summary(label: &str, summary: &CrawlSummary, failures: &[ItemFailure]) {
    println!("=== Crawl Summary: {} ===\n", label);

    println!("Overview:");
    println!("  Work items discovered: {}", summary.discovered);
    println!("  Documents fetched: {}", summary.fetched);
    println!("  Duplicates skipped: {}", summary.deduplicated);
    println!("  Failed items: {}", summary.failed);
    println!("  Results: {}", summary.results);
    println!("  Elapsed: {:.1}s", summary.elapsed.as_secs_f64());
    println!();

    if !failures.is_empty() {
        println!("Failures ({}):", failures.len());
        for failure in failures {
            println!("  - {}: {}", failure.item.url, failure.error);
        }
        println!();
    }

    let attempted = summary.fetched + summary.failed;
    let success_rate = if attempted > 0 {
        (summary.fetched as f64 / attempted as f64) * 100.0
    } else {
        0.0
    };

    println!(
        "Success Rate: {:.1}% ({} / {} items fetched)",
        success_rate, summary.fetched, attempted
    );
}
