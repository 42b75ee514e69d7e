//! Per-run outcome records: validation results, source health, and the
//! report each ingestion cycle returns to its caller.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::SourceId;

/// One quality check's outcome, in checklist order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckResult {
    pub name: String,
    pub passed: bool,
}

/// The validator's verdict on a single listing for one run.
///
/// Consumed immediately: sets `is_recommendable` and feeds the source
/// health tracker. Logged for audit, never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub checks: Vec<CheckResult>,
    pub pass_rate: f64,
    pub failing: Vec<String>,
}

impl ValidationResult {
    /// A listing stays recommendable when at most one check fails.
    pub fn is_recommendable(&self) -> bool {
        self.failing.len() <= 1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceStatus {
    Healthy,
    Demoted,
}

/// Rolling health state for one source, persisted across runs.
///
/// Mutated only by the health tracker; the scheduler reads `status` to
/// skip demoted sources.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceHealthRecord {
    pub source_id: SourceId,
    pub consecutive_bad_runs: u32,
    pub status: SourceStatus,
    pub last_run_at: Option<DateTime<Utc>>,
}

impl SourceHealthRecord {
    pub fn new(source_id: SourceId) -> Self {
        Self {
            source_id,
            consecutive_bad_runs: 0,
            status: SourceStatus::Healthy,
            last_run_at: None,
        }
    }
}

/// What one source's ingestion run produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceReport {
    pub source_id: SourceId,
    pub source_name: String,
    pub items_found: usize,
    pub items_created: usize,
    pub items_updated: usize,
    /// Listings kept but marked non-recommendable by validation.
    pub items_flagged: usize,
    /// Entries dropped at the parse/normalize stage, before validation.
    pub items_skipped: usize,
    /// Mean of this run's per-listing validation pass rates.
    pub pass_rate: f64,
    pub broken_link_rate: f64,
    pub status: SourceStatus,
    pub duration_ms: u64,
    pub error: Option<String>,
}

impl SourceReport {
    /// An empty report for a run that failed before producing listings.
    pub fn failed(source_id: SourceId, source_name: &str, error: String) -> Self {
        Self {
            source_id,
            source_name: source_name.to_string(),
            items_found: 0,
            items_created: 0,
            items_updated: 0,
            items_flagged: 0,
            items_skipped: 0,
            pass_rate: 0.0,
            broken_link_rate: 1.0,
            status: SourceStatus::Healthy,
            duration_ms: 0,
            error: Some(error),
        }
    }
}
