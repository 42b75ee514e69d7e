//! Hard schedule rules the solver enforces.
//!
//! The scorer treats availability windows softly (a partially fitting
//! schedule just scores lower); the solver treats them as hard, because an
//! assigned activity the child cannot attend is not a plan. Conflicts are
//! always per child. The parent ferrying two children to overlapping
//! sessions is not modeled.

use crate::types::{Recurrence, TimeWindow};

/// Whether a candidate can be attended at all: inside the child's declared
/// windows (children with none are fully flexible) and clear of every
/// imported commitment.
pub fn attendable(
    schedule: &Recurrence,
    windows: &[TimeWindow],
    commitments: &[Recurrence],
) -> bool {
    let in_windows = windows.is_empty() || schedule.fits_windows(windows);
    in_windows && !commitments.iter().any(|c| schedule.overlaps(c))
}

/// Pairwise conflict table over candidate options, indexed by position.
/// Options for different children never conflict.
pub struct ConflictMatrix {
    n: usize,
    conflicts: Vec<bool>,
}

impl ConflictMatrix {
    /// Build from `(child index, schedule)` pairs.
    pub fn build(options: &[(usize, &Recurrence)]) -> Self {
        let n = options.len();
        let mut conflicts = vec![false; n * n];
        for i in 0..n {
            for j in (i + 1)..n {
                let clash = options[i].0 == options[j].0 && options[i].1.overlaps(options[j].1);
                conflicts[i * n + j] = clash;
                conflicts[j * n + i] = clash;
            }
        }
        Self { n, conflicts }
    }

    pub fn conflicts(&self, i: usize, j: usize) -> bool {
        self.conflicts[i * self.n + j]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc, Weekday};

    fn weekly(day: Weekday, start_minute: u16, duration: u16) -> Recurrence {
        let anchor = Utc.with_ymd_and_hms(2030, 9, 2, 9, 0, 0).unwrap();
        let mut rec = Recurrence::weekly(vec![day], anchor, duration);
        rec.start_minute = start_minute;
        rec
    }

    #[test]
    fn test_no_windows_means_flexible() {
        let wed_evening = weekly(Weekday::Wed, 17 * 60, 60);
        assert!(attendable(&wed_evening, &[], &[]));
    }

    #[test]
    fn test_window_outside_schedule_blocks() {
        let wed_evening = weekly(Weekday::Wed, 17 * 60, 60);
        let sat_morning = TimeWindow::new(Weekday::Sat, 9 * 60, 12 * 60);

        assert!(!attendable(&wed_evening, &[sat_morning], &[]));

        let wed_window = TimeWindow::new(Weekday::Wed, 16 * 60, 19 * 60);
        assert!(attendable(&wed_evening, &[sat_morning, wed_window], &[]));
    }

    #[test]
    fn test_commitment_clash_blocks() {
        let sat_swim = weekly(Weekday::Sat, 9 * 60, 60);
        let sat_church = weekly(Weekday::Sat, 9 * 60 + 30, 90);
        let sat_lunch = weekly(Weekday::Sat, 12 * 60, 60);

        assert!(!attendable(&sat_swim, &[], &[sat_church.clone()]));
        assert!(attendable(&sat_swim, &[], &[sat_lunch]));
    }

    #[test]
    fn test_matrix_conflicts_only_within_a_child() {
        let a = weekly(Weekday::Sat, 9 * 60, 60);
        let b = weekly(Weekday::Sat, 9 * 60 + 30, 60);
        let c = weekly(Weekday::Sun, 9 * 60, 60);

        // Same slot, different children: indexes 0 and 2
        let matrix = ConflictMatrix::build(&[(0, &a), (0, &b), (1, &a), (0, &c)]);

        assert!(matrix.conflicts(0, 1));
        assert!(matrix.conflicts(1, 0));
        assert!(!matrix.conflicts(0, 2));
        assert!(!matrix.conflicts(0, 3));
        assert!(!matrix.conflicts(2, 3));
    }
}
