//! Source health tracking.
//!
//! Each ingestion run folds its quality numbers into the source's rolling
//! health record. Demotion is deliberately slow (two consecutive bad runs)
//! so one flaky fetch or a transient feed regression never takes a source
//! out; recovery is fast (one clean run).

use chrono::{DateTime, Utc};

use crate::types::{SourceHealthRecord, SourceStatus};

/// Runs with an aggregate pass rate below this are bad.
pub const PASS_RATE_THRESHOLD: f64 = 0.85;

/// Runs with a broken-link rate above this are bad.
pub const BROKEN_LINK_THRESHOLD: f64 = 0.05;

/// Consecutive bad runs before a source is demoted.
pub const DEMOTION_RUN_COUNT: u32 = 2;

/// Thresholds for classifying a run, overridable through `EngineConfig`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HealthPolicy {
    pub pass_rate_threshold: f64,
    pub broken_link_threshold: f64,
}

impl Default for HealthPolicy {
    fn default() -> Self {
        Self {
            pass_rate_threshold: PASS_RATE_THRESHOLD,
            broken_link_threshold: BROKEN_LINK_THRESHOLD,
        }
    }
}

impl HealthPolicy {
    pub fn is_bad_run(&self, pass_rate: f64, broken_link_rate: f64) -> bool {
        pass_rate < self.pass_rate_threshold || broken_link_rate > self.broken_link_threshold
    }

    /// Fold one run's quality numbers into the health record.
    ///
    /// Pure: the caller persists the returned record and acts on a status
    /// change (demoting or restoring the source's listings).
    pub fn apply_run(
        &self,
        record: &SourceHealthRecord,
        pass_rate: f64,
        broken_link_rate: f64,
        now: DateTime<Utc>,
    ) -> SourceHealthRecord {
        let mut next = record.clone();
        next.last_run_at = Some(now);

        if self.is_bad_run(pass_rate, broken_link_rate) {
            next.consecutive_bad_runs += 1;
            if next.consecutive_bad_runs >= DEMOTION_RUN_COUNT {
                next.status = SourceStatus::Demoted;
            }
        } else {
            next.consecutive_bad_runs = 0;
            next.status = SourceStatus::Healthy;
        }

        next
    }
}
