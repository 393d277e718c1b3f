//! Crawl statistics
//!
//! Counters are shared by every page task of a run and read once at the end
//! to build the run summary.

use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicU64, Ordering};

/// Live counters of one crawl run
#[derive(Debug, Default)]
pub struct CrawlStats {
    requests_issued: AtomicU64,
    pages_fetched: AtomicU64,
    fetch_errors: AtomicU64,
    pages_skipped: AtomicU64,
    parse_errors: AtomicU64,
    records_exported: AtomicU64,
    export_errors: AtomicU64,
    branches_exhausted: AtomicU64,
}

macro_rules! counter {
    ($record:ident, $field:ident) => {
        pub fn $record(&self) {
            self.$field.fetch_add(1, Ordering::Relaxed);
        }
    };
}

impl CrawlStats {
    pub fn new() -> Self {
        Self::default()
    }

    counter!(record_request, requests_issued);
    counter!(record_page, pages_fetched);
    counter!(record_fetch_error, fetch_errors);
    counter!(record_skip, pages_skipped);
    counter!(record_parse_error, parse_errors);
    counter!(record_export, records_exported);
    counter!(record_export_error, export_errors);
    counter!(record_exhausted, branches_exhausted);

    /// Point-in-time copy of every counter
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            requests_issued: self.requests_issued.load(Ordering::Relaxed),
            pages_fetched: self.pages_fetched.load(Ordering::Relaxed),
            fetch_errors: self.fetch_errors.load(Ordering::Relaxed),
            pages_skipped: self.pages_skipped.load(Ordering::Relaxed),
            parse_errors: self.parse_errors.load(Ordering::Relaxed),
            records_exported: self.records_exported.load(Ordering::Relaxed),
            export_errors: self.export_errors.load(Ordering::Relaxed),
            branches_exhausted: self.branches_exhausted.load(Ordering::Relaxed),
        }
    }
}

/// Counter values at one point in time
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub requests_issued: u64,
    pub pages_fetched: u64,
    pub fetch_errors: u64,
    pub pages_skipped: u64,
    pub parse_errors: u64,
    pub records_exported: u64,
    pub export_errors: u64,
    pub branches_exhausted: u64,
}

impl StatsSnapshot {
    /// Total of page- and write-scoped failures
    pub fn total_errors(&self) -> u64 {
        self.fetch_errors + self.parse_errors + self.export_errors
    }
}

/// Outcome of one site's crawl run
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub site: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// True when the run was stopped before its frontier was exhausted
    pub interrupted: bool,
    /// Requests still queued when the run stopped
    pub requests_dropped: usize,
    pub stats: StatsSnapshot,
}

impl RunSummary {
    pub fn duration_seconds(&self) -> i64 {
        (self.finished_at - self.started_at).num_seconds()
    }

    /// Returns the share of fetched pages that produced no error, as a percentage
    pub fn success_rate(&self) -> f64 {
        let attempted = self.stats.pages_fetched + self.stats.fetch_errors;
        if attempted == 0 {
            return 0.0;
        }
        let failed = self.stats.total_errors().min(attempted);
        ((attempted - failed) as f64 / attempted as f64) * 100.0
    }
}

/// Prints a run summary to stdout in a formatted manner
pub fn print_statistics(summary: &RunSummary) {
    let stats = &summary.stats;

    println!("=== Crawl Statistics: {} ===\n", summary.site);

    println!("Run:");
    println!("  Started:  {}", summary.started_at.to_rfc3339());
    println!("  Finished: {}", summary.finished_at.to_rfc3339());
    println!("  Duration: {}s", summary.duration_seconds());
    if summary.interrupted {
        println!(
            "  Interrupted with {} request(s) still queued",
            summary.requests_dropped
        );
    }
    println!();

    println!("Requests:");
    println!("  Issued: {}", stats.requests_issued);
    println!("  Pages fetched: {}", stats.pages_fetched);
    println!("  Listing branches exhausted: {}", stats.branches_exhausted);
    println!();

    println!("Records:");
    println!("  Exported: {}", stats.records_exported);
    println!("  Pages skipped: {}", stats.pages_skipped);
    println!();

    if stats.total_errors() > 0 {
        println!("Error Summary:");
        println!("  Fetch errors: {}", stats.fetch_errors);
        println!("  Parse errors: {}", stats.parse_errors);
        println!("  Export errors: {}", stats.export_errors);
        println!();
    }

    println!("Success Rate: {:.1}%", summary.success_rate());
}
