//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building HTTP clients with the configured user agent and timeout
//! - GET requests with redirects followed by the client
//! - Error classification
//!
//! There are no retries: a failed fetch ends that branch of the crawl.

use crate::config::Config;
use async_trait::async_trait;
use reqwest::{redirect::Policy, Client};
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// A fetched page
#[derive(Debug, Clone)]
pub struct Page {
    /// Final URL after redirects
    pub url: Url,
    /// HTTP status code
    pub status: u16,
    /// Page body content
    pub body: String,
}

/// Errors that end a single request
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("Request to {url} timed out")]
    Timeout { url: String },

    #[error("Network error for {url}: {message}")]
    Network { url: String, message: String },
}

/// Source of pages for the crawl engine
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &Url) -> Result<Page, FetchError>;
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The crawler configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(config: &Config) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.header_value())
        .timeout(Duration::from_secs(config.crawler.request_timeout))
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::limited(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetcher backed by a `reqwest` client
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn from_config(config: &Config) -> Result<Self, reqwest::Error> {
        Ok(Self::new(build_http_client(config)?))
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<Page, FetchError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| classify(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let final_url = response.url().clone();
        let body = response.text().await.map_err(|e| classify(url, e))?;

        Ok(Page {
            url: final_url,
            status: status.as_u16(),
            body,
        })
    }
}

fn classify(url: &Url, error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else if error.is_connect() {
        FetchError::Network {
            url: url.to_string(),
            message: "Connection refused".to_string(),
        }
    } else {
        FetchError::Network {
            url: url.to_string(),
            message: error.to_string(),
        }
    }
}
