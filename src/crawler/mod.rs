//! Crawler module for catalog traversal
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching behind the `PageFetcher` seam
//! - Tree descent and paginated grid traversal
//! - Request scheduling and rate limiting
//! - Per-site run coordination

mod coordinator;
mod fetcher;
mod request;
mod scheduler;
mod traversal;

pub use coordinator::{run_site, Coordinator};
pub use fetcher::{build_http_client, FetchError, HttpFetcher, Page, PageFetcher};
pub use request::{Callback, FetchRequest};
pub use scheduler::{ScheduledFetch, Scheduler};
pub use traversal::{PageOutcome, PaginatedGrid, SiteProfile, Traversal, TreeDescent};

use crate::config::{Config, SiteConfig};
use crate::output::RunSummary;
use crate::{CrawlerError, Result};

/// Crawls the selected sites one after another
///
/// Every selected site is compiled before the first run starts. Each site is
/// one run with its own start and end hooks. An interrupted run stops the
/// remaining sites from starting.
///
/// # Arguments
///
/// * `config` - The crawler configuration
/// * `site_names` - Sites to crawl; empty means every configured site
///
/// # Returns
///
/// * `Ok(Vec<RunSummary>)` - One summary per site that was run
/// * `Err(CrawlerError)` - A named site is unknown, a site has an invalid
///   locator or pattern, or a run failed to start
pub async fn crawl(config: &Config, site_names: &[String]) -> Result<Vec<RunSummary>> {
    let profiles = compile_sites(config, site_names)?;
    let mut summaries = Vec::with_capacity(profiles.len());

    for profile in profiles {
        let summary = run_site(config, profile).await?;
        let interrupted = summary.interrupted;
        summaries.push(summary);

        if interrupted {
            tracing::warn!("Crawl interrupted, skipping remaining sites");
            break;
        }
    }

    Ok(summaries)
}

/// Resolves site names against the configuration, keeping config order
pub fn select_sites<'a>(config: &'a Config, site_names: &[String]) -> Result<Vec<&'a SiteConfig>> {
    if let Some(unknown) = site_names.iter().find(|name| config.site(name).is_none()) {
        return Err(CrawlerError::UnknownSite(unknown.clone()));
    }

    Ok(config
        .sites
        .iter()
        .filter(|site| site_names.is_empty() || site_names.contains(&site.name))
        .collect())
}

/// Selects and compiles sites, failing on the first invalid one
pub fn compile_sites(config: &Config, site_names: &[String]) -> Result<Vec<SiteProfile>> {
    select_sites(config, site_names)?
        .into_iter()
        .map(SiteProfile::compile)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;

    const CONFIG: &str = r#"
[crawler]
max-concurrent-requests = 2

[user-agent]
crawler-name = "TestCrawler"
crawler-version = "1.0"
contact-url = "https://example.com/about"
contact-email = "admin@example.com"

[[site]]
name = "first"
start-urls = ["https://first.test/"]
[site.traversal]
variant = "tree"
category-links = "nav a::attr(href)"
product-links = "article a::attr(href)"
[site.product]
article-type = "ol li::text"

[[site]]
name = "second"
start-urls = ["https://second.test/"]
[site.traversal]
variant = "tree"
category-links = "nav a::attr(href)"
product-links = "article a::attr(href)"
[site.product]
article-type = "ol li::text"
"#;

    fn names(sites: Vec<&SiteConfig>) -> Vec<&str> {
        sites.iter().map(|site| site.name.as_str()).collect()
    }

    #[test]
    fn test_select_all_sites() {
        let config = parse_config(CONFIG).unwrap();
        assert_eq!(names(select_sites(&config, &[]).unwrap()), ["first", "second"]);
    }

    #[test]
    fn test_select_named_sites_in_config_order() {
        let config = parse_config(CONFIG).unwrap();
        let selected = select_sites(&config, &["second".to_string(), "first".to_string()]);
        assert_eq!(names(selected.unwrap()), ["first", "second"]);
    }

    #[test]
    fn test_compile_sites_rejects_bad_locator() {
        let config = parse_config(&CONFIG.replacen("ol li::text", "ol li::before", 1)).unwrap();

        assert_eq!(compile_sites(&config, &["second".to_string()]).unwrap().len(), 1);
        assert!(matches!(
            compile_sites(&config, &[]),
            Err(CrawlerError::Config(crate::ConfigError::InvalidLocator { .. }))
        ));
    }

    #[tokio::test]
    async fn test_crawl_fails_before_any_run() {
        let config = parse_config(&CONFIG.replacen("ol li::text", "ol li::before", 1)).unwrap();
        assert!(crawl(&config, &[]).await.is_err());
    }

    #[test]
    fn test_select_unknown_site() {
        let config = parse_config(CONFIG).unwrap();
        let result = select_sites(&config, &["third".to_string()]);
        assert!(matches!(result, Err(CrawlerError::UnknownSite(name)) if name == "third"));
    }
}
