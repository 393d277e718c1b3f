//! Scheduler for managing the crawl frontier and rate limiting
//!
//! This module handles:
//! - FIFO frontier of pending fetch requests
//! - Global concurrency limiting via semaphores
//! - Minimum delay between two dispatched requests
//! - Optional duplicate-request filtering

use crate::config::CrawlerConfig;
use crate::crawler::FetchRequest;
use crate::url::request_fingerprint;
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// A scheduled fetch with a semaphore permit
///
/// The permit is held for as long as the fetch and its page handling run.
pub struct ScheduledFetch {
    pub request: FetchRequest,
    pub permit: OwnedSemaphorePermit,
}

/// Scheduler manages the frontier queue and rate limiting
pub struct Scheduler {
    /// Global semaphore for limiting concurrent fetches
    global_semaphore: Arc<Semaphore>,

    /// Pending requests, oldest first
    frontier: VecDeque<FetchRequest>,

    /// Fingerprints of every request accepted so far, when deduplicating
    seen: Option<HashSet<String>>,

    download_delay: Duration,

    last_dispatch: Option<Instant>,
}

impl Scheduler {
    /// Creates a new scheduler
    ///
    /// # Arguments
    ///
    /// * `config` - The crawler configuration
    /// * `initial_frontier` - Requests to start from
    pub fn new(config: &CrawlerConfig, initial_frontier: Vec<FetchRequest>) -> Self {
        let mut scheduler = Self {
            global_semaphore: Arc::new(Semaphore::new(config.max_concurrent_requests as usize)),
            frontier: VecDeque::new(),
            seen: config.dedupe_requests.then(HashSet::new),
            download_delay: Duration::from_millis(config.download_delay),
            last_dispatch: None,
        };

        for request in initial_frontier {
            scheduler.add_to_frontier(request);
        }

        scheduler
    }

    /// Adds a request to the back of the frontier
    ///
    /// Returns `false` if the request was dropped as a duplicate.
    pub fn add_to_frontier(&mut self, request: FetchRequest) -> bool {
        if let Some(seen) = &mut self.seen {
            if !seen.insert(request_fingerprint(&request.url)) {
                tracing::trace!("Dropping duplicate request for {}", request.url);
                return false;
            }
        }

        self.frontier.push_back(request);
        true
    }

    /// Gets the next request to fetch
    ///
    /// Waits for a concurrency permit and for the download delay to pass
    /// since the previous dispatch. The request is only removed from the
    /// frontier once both are available, so dropping the returned future
    /// loses nothing.
    ///
    /// # Returns
    ///
    /// * `Some(ScheduledFetch)` - A request that's ready to fetch
    /// * `None` - The frontier is empty
    pub async fn next_request(&mut self) -> Option<ScheduledFetch> {
        if self.frontier.is_empty() {
            return None;
        }

        let permit = self.global_semaphore.clone().acquire_owned().await.ok()?;

        if let Some(wait) = self.time_until_next_dispatch(Instant::now()) {
            tracing::trace!("Waiting {:?} before next dispatch", wait);
            tokio::time::sleep(wait).await;
        }

        let request = self.frontier.pop_front()?;
        self.last_dispatch = Some(Instant::now());

        Some(ScheduledFetch { request, permit })
    }

    /// Time left before the download delay allows another dispatch
    fn time_until_next_dispatch(&self, now: Instant) -> Option<Duration> {
        let last = self.last_dispatch?;
        let ready_at = last + self.download_delay;
        (ready_at > now).then(|| ready_at - now)
    }

    /// Removes every pending request, returning how many were dropped
    pub fn clear(&mut self) -> usize {
        let dropped = self.frontier.len();
        self.frontier.clear();
        dropped
    }

    /// Returns the number of requests in the frontier
    pub fn frontier_size(&self) -> usize {
        self.frontier.len()
    }

    /// Returns whether the frontier is empty
    pub fn is_empty(&self) -> bool {
        self.frontier.is_empty()
    }
}
