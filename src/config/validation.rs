//! Structural checks of a loaded configuration
//!
//! Locators and blob patterns are compiled, and rejected, when a site is
//! compiled for crawling.

use crate::config::types::{
    Config, CrawlerConfig, OutputConfig, SiteConfig, TraversalConfig, UserAgentConfig,
};
use crate::output::LineEncoding;
use crate::ConfigError;
use std::collections::HashSet;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_output_config(&config.output)?;
    validate_sites(&config.sites)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.max_concurrent_requests < 1 || config.max_concurrent_requests > 100 {
        return Err(ConfigError::Validation(format!(
            "max_concurrent_requests must be between 1 and 100, got {}",
            config.max_concurrent_requests
        )));
    }

    if config.request_timeout < 1 {
        return Err(ConfigError::Validation(format!(
            "request_timeout must be >= 1s, got {}s",
            config.request_timeout
        )));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;

    validate_email(&config.contact_email)?;

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.root_dir.trim().is_empty() {
        return Err(ConfigError::Validation(
            "root_dir cannot be empty".to_string(),
        ));
    }

    LineEncoding::from_config(config.encoding.as_deref())
        .map_err(|e| ConfigError::Validation(e.to_string()))?;

    Ok(())
}

/// Validates site entries
fn validate_sites(sites: &[SiteConfig]) -> Result<(), ConfigError> {
    let mut names = HashSet::new();

    for site in sites {
        validate_site_name(&site.name)?;

        if !names.insert(site.name.as_str()) {
            return Err(ConfigError::Validation(format!(
                "Site '{}' is defined more than once",
                site.name
            )));
        }

        if site.start_urls.is_empty() {
            return Err(ConfigError::Validation(format!(
                "Site '{}' must have at least one start URL",
                site.name
            )));
        }

        for start in &site.start_urls {
            let url = Url::parse(start).map_err(|e| {
                ConfigError::InvalidUrl(format!("Invalid start URL '{}': {}", start, e))
            })?;

            if url.scheme() != "http" && url.scheme() != "https" {
                return Err(ConfigError::Validation(format!(
                    "Start URL '{}' must use HTTP or HTTPS",
                    start
                )));
            }
        }

        match &site.traversal {
            TraversalConfig::Tree(_) => {
                // Tree descent carries no category through the context, so the
                // product page itself has to provide one.
                if site.product.article_type.is_none() {
                    return Err(ConfigError::Validation(format!(
                        "Site '{}' uses tree traversal and needs a product article-type locator",
                        site.name
                    )));
                }
            }
            TraversalConfig::Grid(grid) => {
                if grid.page_param.trim().is_empty() {
                    return Err(ConfigError::Validation(format!(
                        "Site '{}' has an empty page-param",
                        site.name
                    )));
                }

                if grid.fixed_params.contains_key(&grid.page_param) {
                    return Err(ConfigError::Validation(format!(
                        "Site '{}' sets the page parameter '{}' in fixed-params",
                        site.name, grid.page_param
                    )));
                }
            }
        }
    }

    Ok(())
}

/// Validates a site name, which becomes a directory name
fn validate_site_name(name: &str) -> Result<(), ConfigError> {
    if name.is_empty() {
        return Err(ConfigError::Validation(
            "Site name cannot be empty".to_string(),
        ));
    }

    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ConfigError::Validation(format!(
            "Site name must contain only ASCII alphanumerics, '-' and '_', got '{}'",
            name
        )));
    }

    Ok(())
}

/// Basic email validation
fn validate_email(email: &str) -> Result<(), ConfigError> {
    if email.is_empty() {
        return Err(ConfigError::Validation(
            "contact_email cannot be empty".to_string(),
        ));
    }

    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    let local = parts[0];
    let domain = parts[1];

    if local.is_empty() || domain.is_empty() {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    if !domain.contains('.') {
        return Err(ConfigError::Validation(format!(
            "Invalid email domain: '{}'",
            email
        )));
    }

    Ok(())
}
