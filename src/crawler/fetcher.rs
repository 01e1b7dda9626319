//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the harvester:
//! - Building the shared HTTP client with a descriptive user agent
//! - GET requests returning a parsed HTML document
//! - Error classification
//!
//! There is no retry logic. A failed request is reported to the caller,
//! which logs it and moves on to the next URL.

use crate::config::UserAgentConfig;
use reqwest::Client;
use scraper::Html;
use std::time::Duration;
use thiserror::Error;

/// Reasons a page could not be fetched
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Request timeout for {url}: {source}")]
    Timeout { url: String, source: reqwest::Error },

    #[error("Connection failed for {url}: {source}")]
    Connect { url: String, source: reqwest::Error },

    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },
}

impl FetchError {
    /// The URL whose fetch failed
    pub fn url(&self) -> &str {
        match self {
            Self::Timeout { url, .. }
            | Self::Connect { url, .. }
            | Self::Status { url, .. }
            | Self::Http { url, .. } => url,
        }
    }

    fn from_reqwest(url: &str, error: reqwest::Error) -> Self {
        let url = url.to_string();
        if error.is_timeout() {
            Self::Timeout { url, source: error }
        } else if error.is_connect() {
            Self::Connect { url, source: error }
        } else {
            Self::Http { url, source: error }
        }
    }
}

/// Formats the user agent string: `CrawlerName/Version (+ContactURL)`
pub fn user_agent_string(config: &UserAgentConfig) -> String {
    format!(
        "{}/{} (+{})",
        config.crawler_name, config.crawler_version, config.contact_url
    )
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The user agent configuration
/// * `timeout` - Bound on each whole request
///
/// # Example
///
/// ```no_run
/// use std::time::Duration;
/// use tiki_harvest::config::UserAgentConfig;
/// use tiki_harvest::crawler::build_http_client;
///
/// let config = UserAgentConfig {
///     crawler_name: "TikiHarvest".to_string(),
///     crawler_version: "0.1".to_string(),
///     contact_url: "https://example.com/about".to_string(),
/// };
///
/// let client = build_http_client(&config, Duration::from_secs(30)).unwrap();
/// ```
pub fn build_http_client(
    config: &UserAgentConfig,
    timeout: Duration,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent_string(config))
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches a URL and returns the response body
///
/// Redirects follow reqwest's default policy. Any non-2xx final status is
/// a `FetchError::Status`.
pub async fn fetch_page(client: &Client, url: &str) -> Result<String, FetchError> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| FetchError::from_reqwest(url, e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    response
        .text()
        .await
        .map_err(|e| FetchError::from_reqwest(url, e))
}

/// Fetches a URL and parses the body as an HTML document
pub async fn fetch_document(client: &Client, url: &str) -> Result<Html, FetchError> {
    let body = fetch_page(client, url).await?;
    tracing::trace!("Fetched {} ({} bytes)", url, body.len());
    Ok(Html::parse_document(&body))
}
