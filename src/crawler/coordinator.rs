//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the main crawl loop of one site run:
//! - Calling the sink's start hook before the first request
//! - Dispatching scheduled requests as concurrent page tasks
//! - Feeding follow-up requests back into the frontier
//! - Handling interrupts by draining in-flight pages
//! - Calling the sink's end hook whatever the outcome

use crate::config::{Config, CrawlerConfig};
use crate::crawler::scheduler::{ScheduledFetch, Scheduler};
use crate::crawler::{FetchRequest, HttpFetcher, PageFetcher, SiteProfile};
use crate::extract::HtmlDocument;
use crate::output::{CrawlStats, PartitionPipeline, RecordSink, RunSummary};
use crate::Result;
use chrono::Utc;
use std::future::Future;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, error, info, info_span, warn, Instrument};

/// Main crawler coordinator structure
pub struct Coordinator {
    site: Arc<SiteProfile>,
    fetcher: Arc<dyn PageFetcher>,
    sink: Arc<dyn RecordSink>,
    stats: Arc<CrawlStats>,
    scheduler: Scheduler,
}

impl Coordinator {
    /// Creates a coordinator for one site run
    ///
    /// # Arguments
    ///
    /// * `config` - Concurrency, delay and dedupe settings
    /// * `site` - The compiled site to crawl
    /// * `fetcher` - Where pages come from
    /// * `sink` - Where records go
    pub fn new(
        config: &CrawlerConfig,
        site: SiteProfile,
        fetcher: Arc<dyn PageFetcher>,
        sink: Arc<dyn RecordSink>,
    ) -> Self {
        let scheduler = Scheduler::new(config, site.start_requests());

        Self {
            site: Arc::new(site),
            fetcher,
            sink,
            stats: Arc::new(CrawlStats::new()),
            scheduler,
        }
    }

    /// Live counters of this run
    pub fn stats(&self) -> &CrawlStats {
        &self.stats
    }

    /// Runs the crawl until the frontier is exhausted or Ctrl-C is pressed
    pub async fn run(self) -> Result<RunSummary> {
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Failed to listen for Ctrl-C: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await
    }

    /// Runs the crawl until the frontier is exhausted or `shutdown` resolves
    ///
    /// On shutdown no new request is dispatched, queued requests are dropped
    /// and pages already in flight are processed to completion. The sink's
    /// end hook runs in both cases.
    pub async fn run_until<F>(self, shutdown: F) -> Result<RunSummary>
    where
        F: Future<Output = ()>,
    {
        let span = info_span!("site", name = %self.site.name());
        self.crawl(shutdown).instrument(span).await
    }

    async fn crawl<F>(mut self, shutdown: F) -> Result<RunSummary>
    where
        F: Future<Output = ()>,
    {
        let started_at = Utc::now();
        self.sink.on_run_start(self.site.name()).await?;

        info!(
            "Starting crawl with {} start request(s)",
            self.scheduler.frontier_size()
        );

        tokio::pin!(shutdown);
        let mut tasks: JoinSet<Vec<FetchRequest>> = JoinSet::new();
        let mut stopping = false;
        let mut requests_dropped = 0;

        loop {
            if tasks.is_empty() && self.scheduler.is_empty() {
                break;
            }

            tokio::select! {
                biased;

                _ = &mut shutdown, if !stopping => {
                    stopping = true;
                    requests_dropped += self.scheduler.clear();
                    warn!(
                        "Shutdown requested, draining {} in-flight page(s)",
                        tasks.len()
                    );
                }

                Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                    match joined {
                        Ok(requests) if stopping => requests_dropped += requests.len(),
                        Ok(requests) => {
                            for request in requests {
                                self.scheduler.add_to_frontier(request);
                            }
                        }
                        Err(e) => error!("Page task failed: {}", e),
                    }
                }

                Some(scheduled) = self.scheduler.next_request(), if !stopping && !self.scheduler.is_empty() => {
                    self.dispatch(&mut tasks, scheduled);
                }

                else => break,
            }
        }

        if let Err(e) = self.sink.on_run_end().await {
            self.stats.record_export_error();
            error!("Failed to close export partitions: {}", e);
        }

        let summary = RunSummary {
            site: self.site.name().to_string(),
            started_at,
            finished_at: Utc::now(),
            interrupted: stopping,
            requests_dropped,
            stats: self.stats.snapshot(),
        };

        info!(
            "Crawl finished: {} page(s) fetched, {} record(s) exported, {} error(s) in {}s",
            summary.stats.pages_fetched,
            summary.stats.records_exported,
            summary.stats.total_errors(),
            summary.duration_seconds()
        );

        Ok(summary)
    }

    fn dispatch(&self, tasks: &mut JoinSet<Vec<FetchRequest>>, scheduled: ScheduledFetch) {
        self.stats.record_request();
        debug!(
            "Dispatching {:?} request for {}",
            scheduled.request.callback, scheduled.request.url
        );

        let task = PageTask {
            site: Arc::clone(&self.site),
            fetcher: Arc::clone(&self.fetcher),
            sink: Arc::clone(&self.sink),
            stats: Arc::clone(&self.stats),
        };
        tasks.spawn(task.run(scheduled).in_current_span());
    }
}

/// Everything one page task needs, shared with its siblings
struct PageTask {
    site: Arc<SiteProfile>,
    fetcher: Arc<dyn PageFetcher>,
    sink: Arc<dyn RecordSink>,
    stats: Arc<CrawlStats>,
}

impl PageTask {
    /// Fetches, handles and exports one page
    ///
    /// Every failure is counted and logged here and ends only this branch.
    ///
    /// # Returns
    ///
    /// The follow-up requests discovered on the page
    async fn run(self, scheduled: ScheduledFetch) -> Vec<FetchRequest> {
        let ScheduledFetch {
            request,
            permit: _permit,
        } = scheduled;

        let page = match self.fetcher.fetch(&request.url).await {
            Ok(page) => page,
            Err(e) => {
                self.stats.record_fetch_error();
                warn!("{}", e);
                return Vec::new();
            }
        };
        self.stats.record_page();

        let handled = {
            let document = HtmlDocument::parse(&page.body);
            self.site.handle(&document, &page.url, &request)
        };

        let outcome = match handled {
            Ok(outcome) => outcome,
            Err(e) if e.is_skip() => {
                self.stats.record_skip();
                debug!("Skipped {}: {}", page.url, e);
                return Vec::new();
            }
            Err(e) => {
                self.stats.record_parse_error();
                warn!("Failed to parse {}: {}", page.url, e);
                return Vec::new();
            }
        };

        if outcome.exhausted {
            self.stats.record_exhausted();
        }

        if let Some(record) = outcome.record {
            match self.sink.process_record(record).await {
                Ok(()) => self.stats.record_export(),
                Err(e) => {
                    self.stats.record_export_error();
                    warn!("Failed to export record from {}: {}", page.url, e);
                }
            }
        }

        outcome.requests
    }
}

/// Crawls one compiled site with the HTTP fetcher and partition pipeline
///
/// # Arguments
///
/// * `config` - The full crawler configuration
/// * `profile` - The site to crawl
///
/// # Returns
///
/// * `Ok(RunSummary)` - The run finished or was interrupted
/// * `Err(CrawlerError)` - The HTTP client or the export pipeline could not
///   be set up, or the run could not start
pub async fn run_site(config: &Config, profile: SiteProfile) -> Result<RunSummary> {
    let fetcher = Arc::new(HttpFetcher::from_config(config)?);
    let sink = Arc::new(PartitionPipeline::from_config(&config.output)?);

    Coordinator::new(&config.crawler, profile, fetcher, sink)
        .run()
        .await
}
