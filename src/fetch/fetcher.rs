//! Blocking HTTP fetcher
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building the HTTP client with a proper user agent string
//! - Waiting on the per-upstream rate gate before each attempt
//! - Bounded retries for transient failures
//! - Error classification

use crate::config::{Config, UserAgentConfig};
use crate::fetch::{Fetch, RateLimiter};
use crate::model::Document;
use crate::{CrawlError, FetchError};
use reqwest::blocking::{Client, Response};
use reqwest::header::CONTENT_TYPE;
use std::time::Duration;

/// Tuning of a `Fetcher`
#[derive(Debug, Clone)]
pub struct FetcherSettings {
    /// Minimum time between two requests to the same upstream
    pub min_interval: Duration,

    /// Extra attempts after a transient failure
    pub retry_budget: u32,

    /// Backoff unit; the n-th retry waits `n * retry_backoff`
    pub retry_backoff: Duration,
}

impl FetcherSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            min_interval: Duration::from_millis(config.crawler.per_upstream_min_interval_ms),
            retry_budget: config.crawler.retry_budget,
            retry_backoff: Duration::from_millis(config.crawler.retry_backoff_ms),
        }
    }
}

impl Default for FetcherSettings {
    fn default() -> Self {
        Self {
            min_interval: Duration::from_millis(250),
            retry_budget: 2,
            retry_backoff: Duration::from_millis(500),
        }
    }
}

/// Builds an HTTP client with proper configuration
///
/// # Example
///
/// ```no_run
/// use mediacrawl::config::UserAgentConfig;
/// use mediacrawl::fetch::build_http_client;
///
/// let config = UserAgentConfig {
///     crawler_name: "MediaCrawl".to_string(),
///     crawler_version: "1.0".to_string(),
///     contact_url: "https://example.com/about".to_string(),
///     contact_email: "admin@example.com".to_string(),
/// };
///
/// let client = build_http_client(&config).unwrap();
/// ```
pub fn build_http_client(config: &UserAgentConfig) -> Result<Client, reqwest::Error> {
    // Format: CrawlerName/Version (+ContactURL; ContactEmail)
    let user_agent = format!(
        "{}/{} (+{}; {})",
        config.crawler_name, config.crawler_version, config.contact_url, config.contact_email
    );

    Client::builder()
        .user_agent(user_agent)
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Rate-limited blocking fetcher shared by all workers of a run
#[derive(Debug)]
pub struct Fetcher {
    client: Client,
    limiter: RateLimiter,
    settings: FetcherSettings,
}

impl Fetcher {
    pub fn new(client: Client, settings: FetcherSettings) -> Self {
        Self {
            client,
            limiter: RateLimiter::new(settings.min_interval),
            settings,
        }
    }

    /// Builds the client and rate gate for one run
    pub fn from_config(config: &Config) -> Result<Self, CrawlError> {
        let client = build_http_client(&config.user_agent)?;
        Ok(Self::new(client, FetcherSettings::from_config(config)))
    }

    pub fn rate_limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    /// Sends one GET request and reads the body
    ///
    /// # Error Classification
    ///
    /// | Condition | Result |
    /// |-----------|--------|
    /// | Non-2xx status | `HttpStatus(code)` |
    /// | Request or body read timed out | `Timeout` |
    /// | Anything else (DNS, connect, TLS, decode) | `Network` |
    fn fetch_once(&self, url: &str, timeout: Duration) -> Result<Document, FetchError> {
        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .map_err(classify_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus(status.as_u16()));
        }

        read_document(url, response)
    }
}

impl Fetch for Fetcher {
    fn fetch(
        &self,
        url: &str,
        upstream_key: &str,
        timeout: Duration,
    ) -> Result<Document, FetchError> {
        let mut attempt: u32 = 0;

        loop {
            self.limiter.acquire(upstream_key);

            match self.fetch_once(url, timeout) {
                Ok(document) => return Ok(document),
                Err(e) if e.is_transient() && attempt < self.settings.retry_budget => {
                    attempt += 1;
                    let backoff = self.settings.retry_backoff * attempt;
                    tracing::debug!(
                        "Retrying {} after {} (attempt {}/{}, backoff {:?})",
                        url,
                        e,
                        attempt,
                        self.settings.retry_budget,
                        backoff
                    );
                    std::thread::sleep(backoff);
                }
                Err(e) => return Err(e),
            }
        }
    }
}

fn read_document(url: &str, response: Response) -> Result<Document, FetchError> {
    let status = response.status().as_u16();
    let final_url = response.url().to_string();
    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let body = response.text().map_err(classify_error)?;

    Ok(Document {
        url: url.to_string(),
        final_url,
        status,
        content_type,
        body,
    })
}

fn classify_error(e: reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::Timeout
    } else if let Some(status) = e.status() {
        FetchError::HttpStatus(status.as_u16())
    } else {
        FetchError::Network(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_config() -> UserAgentConfig {
        UserAgentConfig {
            crawler_name: "TestCrawler".to_string(),
            crawler_version: "1.0".to_string(),
            contact_url: "https://example.com/about".to_string(),
            contact_email: "admin@example.com".to_string(),
        }
    }

    #[test]
    fn test_build_http_client() {
        assert!(build_http_client(&create_test_config()).is_ok());
    }

    #[test]
    fn test_unreachable_host_is_network_error_after_retries() {
        let client = build_http_client(&create_test_config()).unwrap();
        let fetcher = Fetcher::new(
            client,
            FetcherSettings {
                min_interval: Duration::from_millis(1),
                retry_budget: 2,
                retry_backoff: Duration::from_millis(1),
            },
        );

        // Nothing listens on the discard port
        let result = fetcher.fetch("http://127.0.0.1:9/", "local", Duration::from_secs(2));

        assert!(matches!(
            result,
            Err(FetchError::Network(_)) | Err(FetchError::Timeout)
        ));
        assert_eq!(fetcher.rate_limiter().request_count("local"), 3);
    }

    #[test]
    fn test_transient_classification() {
        assert!(FetchError::Timeout.is_transient());
        assert!(FetchError::Network("reset".to_string()).is_transient());
        assert!(!FetchError::HttpStatus(404).is_transient());
        assert!(!FetchError::HttpStatus(503).is_transient());
    }
}
