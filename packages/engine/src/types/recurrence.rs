//! Weekly recurrence for activity schedules.
//!
//! Listings carry a structured weekly schedule (weekdays + time-of-day
//! window + start anchor) rather than ad hoc date lists. The RFC 5545
//! round-trip goes through the `rrule` crate; occurrence expansion is
//! computed, never stored.

use chrono::{DateTime, Datelike, Timelike, Utc, Weekday};
use serde::{Deserialize, Serialize};

/// A repeating weekly time block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recurrence {
    /// Weekdays the activity meets. Never empty after normalization.
    pub days: Vec<Weekday>,
    /// Minutes since midnight when each session starts.
    pub start_minute: u16,
    /// Session length in minutes.
    pub duration_minutes: u16,
    /// First scheduled occurrence (DTSTART).
    pub anchor: DateTime<Utc>,
}

/// A block of time a child is available on one weekday.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub day: Weekday,
    pub start_minute: u16,
    pub end_minute: u16,
}

impl TimeWindow {
    pub fn new(day: Weekday, start_minute: u16, end_minute: u16) -> Self {
        Self {
            day,
            start_minute,
            end_minute,
        }
    }

    /// Whether this window fully contains the given block on the given day.
    pub fn covers(&self, day: Weekday, start_minute: u16, end_minute: u16) -> bool {
        self.day == day && self.start_minute <= start_minute && end_minute <= self.end_minute
    }
}

impl Recurrence {
    /// Build a recurrence anchored at `anchor`, meeting on `days` at the
    /// anchor's time of day.
    pub fn weekly(days: Vec<Weekday>, anchor: DateTime<Utc>, duration_minutes: u16) -> Self {
        let start_minute = (anchor.hour() * 60 + anchor.minute()) as u16;
        let days = if days.is_empty() {
            vec![anchor.weekday()]
        } else {
            days
        };
        Self {
            days,
            start_minute,
            duration_minutes,
            anchor,
        }
    }

    pub fn end_minute(&self) -> u16 {
        self.start_minute + self.duration_minutes
    }

    /// RFC 5545 RRULE body, e.g. `FREQ=WEEKLY;BYDAY=MO,WE`.
    pub fn to_rrule_string(&self) -> String {
        let by_day: Vec<&str> = self.days.iter().map(|d| day_abbrev(*d)).collect();
        format!("FREQ=WEEKLY;BYDAY={}", by_day.join(","))
    }

    /// Occurrences within [start, end), capped at `limit`.
    pub fn occurrences_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        limit: usize,
    ) -> Vec<DateTime<Utc>> {
        let full = format!(
            "DTSTART:{}\nRRULE:{}",
            self.anchor.format("%Y%m%dT%H%M%SZ"),
            self.to_rrule_string()
        );

        let Ok(rrule_set) = full.parse::<rrule::RRuleSet>() else {
            return vec![];
        };

        let after = start.with_timezone(&rrule::Tz::UTC);
        let before = end.with_timezone(&rrule::Tz::UTC);

        let result = rrule_set.after(after).before(before).all(limit as u16);

        result
            .dates
            .into_iter()
            .map(|d| d.with_timezone(&Utc))
            .collect()
    }

    /// Next occurrences from now over a 90-day horizon.
    pub fn next_occurrences(&self, limit: usize) -> Vec<DateTime<Utc>> {
        let now = Utc::now();
        self.occurrences_between(now, now + chrono::Duration::days(90), limit)
    }

    /// Whether two weekly blocks collide: a shared weekday whose
    /// time-of-day intervals overlap.
    pub fn overlaps(&self, other: &Recurrence) -> bool {
        let shares_day = self.days.iter().any(|d| other.days.contains(d));
        if !shares_day {
            return false;
        }
        intervals_overlap(
            self.start_minute,
            self.end_minute(),
            other.start_minute,
            other.end_minute(),
        )
    }

    /// Whether every meeting day fits inside at least one of the windows.
    pub fn fits_windows(&self, windows: &[TimeWindow]) -> bool {
        self.days.iter().all(|day| {
            windows
                .iter()
                .any(|w| w.covers(*day, self.start_minute, self.end_minute()))
        })
    }
}

/// Half-open interval overlap on minutes-of-day.
pub fn intervals_overlap(a_start: u16, a_end: u16, b_start: u16, b_end: u16) -> bool {
    a_start < b_end && b_start < a_end
}

/// RFC 5545 weekday abbreviation.
pub fn day_abbrev(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "MO",
        Weekday::Tue => "TU",
        Weekday::Wed => "WE",
        Weekday::Thu => "TH",
        Weekday::Fri => "FR",
        Weekday::Sat => "SA",
        Weekday::Sun => "SU",
    }
}

/// Parse an RFC 5545 weekday abbreviation.
pub fn parse_day_abbrev(s: &str) -> Option<Weekday> {
    match s.trim().to_ascii_uppercase().as_str() {
        "MO" => Some(Weekday::Mon),
        "TU" => Some(Weekday::Tue),
        "WE" => Some(Weekday::Wed),
        "TH" => Some(Weekday::Thu),
        "FR" => Some(Weekday::Fri),
        "SA" => Some(Weekday::Sat),
        "SU" => Some(Weekday::Sun),
        _ => None,
    }
}

/// Render minutes-since-midnight as `HH:MM`.
pub fn format_minute(minute: u16) -> String {
    format!("{:02}:{:02}", minute / 60, minute % 60)
}
