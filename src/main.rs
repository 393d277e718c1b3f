//! Catalog-Crawler main entry point
//!
//! This is the command-line interface for the category-partitioned catalog
//! crawler.

use anyhow::Context;
use catalog_crawler::config::{load_config_with_hash, Config, TraversalConfig};
use catalog_crawler::crawler::{compile_sites, crawl, select_sites};
use catalog_crawler::output::print_statistics;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Catalog-Crawler: a category-partitioned product catalog crawler
///
/// Catalog-Crawler walks e-commerce sites through their category tree or
/// paginated listing grids and appends every product it finds, as one JSON
/// line, to a file partitioned by the product's category path.
#[derive(Parser, Debug)]
#[command(name = "catalog-crawler")]
#[command(version = "1.0.0")]
#[command(about = "A category-partitioned product catalog crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Crawl only the named site (repeatable; default: all sites)
    #[arg(long = "site", value_name = "NAME")]
    sites: Vec<String>,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.dry_run {
        handle_dry_run(&config, &cli.sites)
    } else {
        handle_crawl(&config, &cli.sites).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("catalog_crawler=info,warn"),
            1 => EnvFilter::new("catalog_crawler=debug,info"),
            2 => EnvFilter::new("catalog_crawler=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: validates config and shows what would be crawled
fn handle_dry_run(config: &Config, site_names: &[String]) -> anyhow::Result<()> {
    let sites = select_sites(config, site_names)?;
    compile_sites(config, site_names)?;

    println!("=== Catalog-Crawler Dry Run ===\n");

    println!("Crawler Configuration:");
    println!(
        "  Max concurrent requests: {}",
        config.crawler.max_concurrent_requests
    );
    println!("  Download delay: {}ms", config.crawler.download_delay);
    println!("  Request timeout: {}s", config.crawler.request_timeout);
    println!("  Dedupe requests: {}", config.crawler.dedupe_requests);

    println!("\nUser Agent:");
    println!("  {}", config.user_agent.header_value());

    println!("\nOutput:");
    println!("  Root directory: {}", config.output.root_dir);
    println!(
        "  Encoding: {}",
        config.output.encoding.as_deref().unwrap_or("ascii (escaped)")
    );

    println!("\nSites ({}):", sites.len());
    for site in &sites {
        let variant = match &site.traversal {
            TraversalConfig::Tree(_) => "tree descent",
            TraversalConfig::Grid(_) => "paginated grid",
        };
        println!("  - {} ({})", site.name, variant);
        for url in &site.start_urls {
            println!("    * {}", url);
        }
        if site.product.embedded.is_some() {
            println!("    embedded data blob: yes");
        }
    }

    println!("\n✓ Configuration is valid");
    println!(
        "✓ Would start crawling with {} start URLs",
        sites.iter().map(|site| site.start_urls.len()).sum::<usize>()
    );

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: &Config, site_names: &[String]) -> anyhow::Result<()> {
    tracing::info!(
        "Output root: {}, sites configured: {}",
        config.output.root_dir,
        config.sites.len()
    );

    let summaries = crawl(config, site_names).await.context("Crawl failed")?;

    for summary in &summaries {
        print_statistics(summary);
        println!();
    }

    tracing::info!("Crawl completed: {} site run(s)", summaries.len());
    Ok(())
}
