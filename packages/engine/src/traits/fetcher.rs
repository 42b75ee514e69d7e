use async_trait::async_trait;
use std::time::Duration;

use crate::error::FetchResult;

/// Supplied network-fetch primitive: `fetch(url, timeout) -> bytes | status`.
///
/// Implementations return the raw response body on success and a
/// `FetchError` carrying the HTTP status otherwise. Retry and politeness
/// policy live in the engine, not in implementations.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str, timeout: Duration) -> FetchResult<Vec<u8>>;
}

#[async_trait]
impl<T: Fetcher + ?Sized> Fetcher for std::sync::Arc<T> {
    async fn fetch(&self, url: &str, timeout: Duration) -> FetchResult<Vec<u8>> {
        (**self).fetch(url, timeout).await
    }
}
