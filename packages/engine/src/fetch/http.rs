//! HTTP-based fetcher implementation.
//!
//! Basic GET fetching suitable for feed endpoints. JavaScript-rendered
//! sources are out of scope; those need a headless ingestor in front.

use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::{FetchError, FetchResult};
use crate::traits::Fetcher;

const DEFAULT_USER_AGENT: &str = "CompassBot/1.0 (+activity catalog)";

/// Fetcher that issues plain HTTP GETs via `reqwest`.
pub struct HttpFetcher {
    client: reqwest::Client,
    user_agent: String,
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpFetcher {
    /// Create a new HTTP fetcher with default settings.
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .expect("Failed to create HTTP client"),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }

    /// Set a custom user agent.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set a custom HTTP client.
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str, timeout: Duration) -> FetchResult<Vec<u8>> {
        if url::Url::parse(url)
            .map(|u| u.scheme() != "http" && u.scheme() != "https")
            .unwrap_or(true)
        {
            return Err(FetchError::InvalidUrl {
                url: url.to_string(),
            });
        }

        debug!(url = %url, "HTTP fetch starting");
        let response = self
            .client
            .get(url)
            .header("User-Agent", &self.user_agent)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| {
                warn!(url = %url, error = %e, "HTTP request failed");
                if e.is_timeout() {
                    FetchError::Timeout {
                        url: url.to_string(),
                    }
                } else {
                    FetchError::Network {
                        url: url.to_string(),
                        reason: e.to_string(),
                    }
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout {
                    url: url.to_string(),
                }
            } else {
                FetchError::Network {
                    url: url.to_string(),
                    reason: e.to_string(),
                }
            }
        })?;

        Ok(body.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_rejects_non_http_url() {
        let fetcher = HttpFetcher::new();
        let result = fetcher
            .fetch("ftp://example.org/feed", Duration::from_secs(1))
            .await;
        assert!(matches!(result, Err(FetchError::InvalidUrl { .. })));
    }

    #[tokio::test]
    async fn test_rejects_garbage_url() {
        let fetcher = HttpFetcher::new();
        let result = fetcher.fetch("not a url", Duration::from_secs(1)).await;
        assert!(matches!(result, Err(FetchError::InvalidUrl { .. })));
    }
}
