//! Catalog-Crawler: a category-partitioned product catalog crawler
//!
//! This crate walks e-commerce catalog sites through their category tree or
//! paginated listing grids, assembles canonical product records from product
//! pages, and appends them as JSON lines into files partitioned by category.

pub mod config;
pub mod crawler;
pub mod extract;
pub mod model;
pub mod output;
pub mod url;

use thiserror::Error;

/// Main error type for catalog crawler operations
#[derive(Debug, Error)]
pub enum CrawlerError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Export error: {0}")]
    Export(#[from] output::ExportError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Unknown site: {0}")]
    UnknownSite(String),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid locator '{locator}': {message}")]
    InvalidLocator { locator: String, message: String },

    #[error("Invalid pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },
}

/// Result type alias for catalog crawler operations
pub type Result<T> = std::result::Result<T, CrawlerError>;

// Re-export commonly used types
pub use config::Config;
pub use model::{CategoryPath, CrawlContext, ProductRecord};
