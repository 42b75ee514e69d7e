//! Network fetch layer: HTTP implementation, per-host politeness, retry.

pub mod http;
pub mod politeness;
pub mod retry;

pub use http::HttpFetcher;
pub use politeness::{FetcherExt, PoliteFetcher, DEFAULT_REQUESTS_PER_SECOND};
pub use retry::{fetch_with_retry, DEFAULT_BACKOFF, DEFAULT_MAX_RETRIES};
