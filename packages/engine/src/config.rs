//! Engine configuration loaded from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use dotenvy::dotenv;

use crate::error::{EngineError, Result};
use crate::fetch::{DEFAULT_BACKOFF, DEFAULT_MAX_RETRIES, DEFAULT_REQUESTS_PER_SECOND};
use crate::pipeline::health::{HealthPolicy, BROKEN_LINK_THRESHOLD, PASS_RATE_THRESHOLD};

/// Sources ingested in parallel per cycle.
pub const DEFAULT_MAX_CONCURRENT_SOURCES: usize = 4;

/// Per-fetch timeout.
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;

/// Wall-clock bound on one solve request.
pub const DEFAULT_SOLVER_TIME_BUDGET_SECS: u64 = 10;

/// Tunables for one engine instance. Every field has a default; the
/// environment overrides individual knobs.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub max_concurrent_sources: usize,
    pub requests_per_second: u32,
    pub max_retries: u32,
    pub retry_backoff_ms: u64,
    pub fetch_timeout_secs: u64,
    pub pass_rate_threshold: f64,
    pub broken_link_threshold: f64,
    pub solver_time_budget_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_concurrent_sources: DEFAULT_MAX_CONCURRENT_SOURCES,
            requests_per_second: DEFAULT_REQUESTS_PER_SECOND.get(),
            max_retries: DEFAULT_MAX_RETRIES,
            retry_backoff_ms: DEFAULT_BACKOFF.as_millis() as u64,
            fetch_timeout_secs: DEFAULT_FETCH_TIMEOUT_SECS,
            pass_rate_threshold: PASS_RATE_THRESHOLD,
            broken_link_threshold: BROKEN_LINK_THRESHOLD,
            solver_time_budget_secs: DEFAULT_SOLVER_TIME_BUDGET_SECS,
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        let defaults = Self::default();
        Ok(Self {
            max_concurrent_sources: var_or(
                "COMPASS_MAX_CONCURRENT_SOURCES",
                defaults.max_concurrent_sources,
            )?,
            requests_per_second: var_or(
                "COMPASS_REQUESTS_PER_SECOND",
                defaults.requests_per_second,
            )?,
            max_retries: var_or("COMPASS_MAX_RETRIES", defaults.max_retries)?,
            retry_backoff_ms: var_or("COMPASS_RETRY_BACKOFF_MS", defaults.retry_backoff_ms)?,
            fetch_timeout_secs: var_or("COMPASS_FETCH_TIMEOUT_SECS", defaults.fetch_timeout_secs)?,
            pass_rate_threshold: var_or(
                "COMPASS_PASS_RATE_THRESHOLD",
                defaults.pass_rate_threshold,
            )?,
            broken_link_threshold: var_or(
                "COMPASS_BROKEN_LINK_THRESHOLD",
                defaults.broken_link_threshold,
            )?,
            solver_time_budget_secs: var_or(
                "COMPASS_SOLVER_TIME_BUDGET_SECS",
                defaults.solver_time_budget_secs,
            )?,
        })
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }

    pub fn solver_time_budget(&self) -> Duration {
        Duration::from_secs(self.solver_time_budget_secs)
    }

    pub fn health_policy(&self) -> HealthPolicy {
        HealthPolicy {
            pass_rate_threshold: self.pass_rate_threshold,
            broken_link_threshold: self.broken_link_threshold,
        }
    }
}

fn var_or<T: FromStr>(key: &str, default: T) -> Result<T> {
    match env::var(key) {
        Ok(value) => value
            .parse()
            .map_err(|_| EngineError::Config(format!("{key} must be a valid number, got {value}"))),
        Err(_) => Ok(default),
    }
}
