//! Retry policy for source fetches.
//!
//! Transient failures (5xx, 429, timeouts, transport errors) are retried
//! with doubling backoff; permanent failures (4xx, bad URLs) are returned
//! immediately.

use std::time::Duration;
use tokio::time::sleep;
use tracing::warn;

use crate::error::FetchResult;
use crate::traits::Fetcher;

/// Retries after the first attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Backoff before the first retry; doubles per attempt.
pub const DEFAULT_BACKOFF: Duration = Duration::from_millis(500);

/// Fetch `url` with retry on transient failure.
pub async fn fetch_with_retry<F: Fetcher + ?Sized>(
    fetcher: &F,
    url: &str,
    timeout: Duration,
    max_retries: u32,
    initial_backoff: Duration,
) -> FetchResult<Vec<u8>> {
    let mut retries = 0;
    let mut backoff = initial_backoff;

    loop {
        match fetcher.fetch(url, timeout).await {
            Ok(body) => return Ok(body),
            Err(e) if e.is_transient() && retries < max_retries => {
                retries += 1;
                warn!(
                    url = %url,
                    error = %e,
                    retry = retries,
                    max_retries,
                    "Fetch failed, retrying..."
                );
                sleep(backoff).await;
                backoff *= 2;
            }
            Err(e) => return Err(e),
        }
    }
}
