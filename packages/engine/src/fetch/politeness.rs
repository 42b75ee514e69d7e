//! Per-host politeness wrapper.
//!
//! Wraps any Fetcher implementation with per-host rate limiting using the
//! governor crate. Limits are keyed by hostname so a slow municipal feed
//! cannot starve requests to other providers.

use async_trait::async_trait;
use governor::{Quota, RateLimiter};
use nonzero_ext::nonzero;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use crate::error::FetchResult;
use crate::traits::Fetcher;

/// Default sustained rate against any single host.
pub const DEFAULT_REQUESTS_PER_SECOND: NonZeroU32 = nonzero!(2u32);

type HostRateLimiter = RateLimiter<
    String,
    governor::state::keyed::DefaultKeyedStateStore<String>,
    governor::clock::DefaultClock,
>;

/// A fetcher wrapper that enforces per-host rate limits.
pub struct PoliteFetcher<F: Fetcher> {
    inner: F,
    limiter: Arc<HostRateLimiter>,
}

impl<F: Fetcher> PoliteFetcher<F> {
    /// Create a new polite fetcher.
    ///
    /// # Arguments
    /// * `fetcher` - The underlying fetcher to wrap
    /// * `requests_per_second` - Maximum requests per second per host
    pub fn new(fetcher: F, requests_per_second: u32) -> Self {
        let quota = Quota::per_second(
            NonZeroU32::new(requests_per_second).unwrap_or(DEFAULT_REQUESTS_PER_SECOND),
        );
        Self {
            inner: fetcher,
            limiter: Arc::new(RateLimiter::keyed(quota)),
        }
    }

    /// Create with a custom quota.
    pub fn with_quota(fetcher: F, quota: Quota) -> Self {
        Self {
            inner: fetcher,
            limiter: Arc::new(RateLimiter::keyed(quota)),
        }
    }

    /// Wait for this host's rate limiter before proceeding.
    async fn wait_for_permit(&self, url: &str) {
        let host = host_key(url);
        self.limiter.until_key_ready(&host).await;
    }
}

/// Hostname bucket for a URL. Unparseable URLs share one bucket; they
/// fail fast in the fetcher anyway.
fn host_key(url: &str) -> String {
    url::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.to_string()))
        .unwrap_or_default()
}

#[async_trait]
impl<F: Fetcher> Fetcher for PoliteFetcher<F> {
    async fn fetch(&self, url: &str, timeout: Duration) -> FetchResult<Vec<u8>> {
        self.wait_for_permit(url).await;
        self.inner.fetch(url, timeout).await
    }
}

/// Extension trait for easy politeness wrapping.
pub trait FetcherExt: Fetcher + Sized {
    /// Wrap this fetcher with per-host rate limiting.
    fn polite(self, requests_per_second: u32) -> PoliteFetcher<Self> {
        PoliteFetcher::new(self, requests_per_second)
    }
}

impl<F: Fetcher + Sized> FetcherExt for F {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockFetcher;
    use std::time::Instant;

    #[test]
    fn test_host_key() {
        assert_eq!(host_key("https://example.org/feed.ics"), "example.org");
        assert_eq!(host_key("https://a.example.org:8080/x"), "a.example.org");
        assert_eq!(host_key("not a url"), "");
    }

    #[tokio::test]
    async fn test_rate_limits_same_host() {
        let mock = MockFetcher::new()
            .with_response("https://example.org/a", b"a".to_vec())
            .with_response("https://example.org/b", b"b".to_vec())
            .with_response("https://example.org/c", b"c".to_vec());

        // 2 requests per second
        let fetcher = mock.polite(2);
        let start = Instant::now();

        for path in ["a", "b", "c"] {
            let url = format!("https://example.org/{path}");
            fetcher
                .fetch(&url, Duration::from_secs(1))
                .await
                .unwrap();
        }

        // First two are within the burst window, the third waits
        assert!(
            start.elapsed().as_millis() >= 400,
            "rate limiting not applied: {:?}",
            start.elapsed()
        );
    }

    #[tokio::test]
    async fn test_distinct_hosts_do_not_block_each_other() {
        let mock = MockFetcher::new()
            .with_response("https://a.org/feed", b"a".to_vec())
            .with_response("https://b.org/feed", b"b".to_vec());

        let fetcher = mock.polite(1);
        let start = Instant::now();

        fetcher
            .fetch("https://a.org/feed", Duration::from_secs(1))
            .await
            .unwrap();
        fetcher
            .fetch("https://b.org/feed", Duration::from_secs(1))
            .await
            .unwrap();

        // Each host gets its own quota, so neither request waits
        assert!(
            start.elapsed().as_millis() < 500,
            "hosts are sharing a limiter: {:?}",
            start.elapsed()
        );
    }
}
