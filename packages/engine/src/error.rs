//! Typed errors for the engine.
//!
//! Uses `thiserror` for library errors (not `anyhow`) to provide
//! strongly-typed, composable error handling. Recommendation and solve
//! paths do not surface these past the facade; they return well-formed
//! result objects instead.

use thiserror::Error;

/// Errors that can occur inside the engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Fetching a source failed after retries
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    /// A feed payload could not be decoded at all
    #[error("parse failed for {format}: {reason}")]
    Parse { format: String, reason: String },

    /// Geocoding collaborator failed or found nothing
    #[error("geocoding failed: {0}")]
    Geocode(String),

    /// Catalog or profile store operation failed
    #[error("store error: {0}")]
    Store(String),

    /// Referenced entity does not exist
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// Configuration error
    #[error("config error: {0}")]
    Config(String),

    /// JSON decoding error
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),
}

/// Errors from the fetch collaborator.
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    /// Invalid URL format
    #[error("invalid URL: {url}")]
    InvalidUrl { url: String },

    /// Non-success HTTP status; permanent for 4xx, transient for 5xx
    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    /// Connection timeout
    #[error("timeout fetching: {url}")]
    Timeout { url: String },

    /// Transport-level failure
    #[error("network error for {url}: {reason}")]
    Network { url: String, reason: String },
}

impl FetchError {
    /// Whether a retry could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::InvalidUrl { .. } => false,
            FetchError::Status { status, .. } => *status >= 500 || *status == 429,
            FetchError::Timeout { .. } => true,
            FetchError::Network { .. } => true,
        }
    }

    /// HTTP status when the failure carried one.
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Result type alias for fetch operations.
pub type FetchResult<T> = std::result::Result<T, FetchError>;
