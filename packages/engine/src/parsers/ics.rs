//! ICS/iCalendar parser for calendar-based sources.
//!
//! Handles RFC 5545 line folding, `VEVENT` blocks, and recurring events
//! via their `RRULE` property. Anything outside `VEVENT` blocks is
//! ignored.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use super::ParseOutcome;
use crate::error::{EngineError, Result};
use crate::types::{RawListing, SourceConfig};

pub fn parse(bytes: &[u8], config: &SourceConfig) -> Result<ParseOutcome> {
    let text = String::from_utf8_lossy(bytes);

    if !text.contains("BEGIN:VCALENDAR") {
        return Err(EngineError::Parse {
            format: "ics".to_string(),
            reason: "payload is not an iCalendar document".to_string(),
        });
    }

    let mut outcome = ParseOutcome::default();
    let mut event: Option<RawListing> = None;
    let mut event_start: Option<String> = None;
    let mut event_end: Option<String> = None;

    for line in unfold_lines(&text) {
        let Some((left, value)) = line.split_once(':') else {
            continue;
        };
        // Property name precedes any parameters, e.g. DTSTART;TZID=...
        let prop = left.split(';').next().unwrap_or(left).to_ascii_uppercase();
        let value = value.trim();

        match prop.as_str() {
            "BEGIN" if value.eq_ignore_ascii_case("VEVENT") => {
                event = Some(RawListing::new(config.id));
                event_start = None;
                event_end = None;
            }
            "END" if value.eq_ignore_ascii_case("VEVENT") => {
                let Some(mut listing) = event.take() else {
                    continue;
                };
                listing.start_text = event_start.take();
                listing.duration_minutes = duration_between(
                    listing.start_text.as_deref(),
                    event_end.take().as_deref(),
                );
                if listing.url.is_none() {
                    listing.url = Some(config.url.clone());
                }
                match &listing.name {
                    Some(name) if !name.is_empty() => outcome.push(listing),
                    _ => outcome.skip(),
                }
            }
            _ => {
                let Some(listing) = event.as_mut() else {
                    continue;
                };
                match prop.as_str() {
                    "SUMMARY" => listing.name = Some(unescape(value)),
                    "DESCRIPTION" => listing.description = Some(unescape(value)),
                    "LOCATION" => listing.location = Some(unescape(value)),
                    "URL" => listing.url = Some(value.to_string()),
                    "UID" => listing.source_item_id = Some(value.to_string()),
                    "RRULE" => listing.rrule = Some(value.to_string()),
                    "DTSTART" => event_start = Some(value.to_string()),
                    "DTEND" => event_end = Some(value.to_string()),
                    "CATEGORIES" => {
                        listing.category = value
                            .split(',')
                            .next()
                            .map(|c| unescape(c.trim()))
                            .filter(|c| !c.is_empty());
                    }
                    _ => {}
                }
            }
        }
    }

    Ok(outcome)
}

/// Undo RFC 5545 line folding: a line starting with whitespace continues
/// the previous line.
fn unfold_lines(text: &str) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();
    for raw in text.lines() {
        if raw.starts_with(' ') || raw.starts_with('\t') {
            if let Some(last) = lines.last_mut() {
                last.push_str(&raw[1..]);
                continue;
            }
        }
        lines.push(raw.to_string());
    }
    lines
}

/// Undo RFC 5545 text escaping.
fn unescape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') | Some('N') => out.push('\n'),
            Some(escaped) => out.push(escaped),
            None => out.push('\\'),
        }
    }
    out
}

/// Parse an iCalendar date or date-time value. Floating times are taken
/// as UTC.
pub fn parse_ics_datetime(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim().trim_end_matches('Z');

    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y%m%dT%H%M%S") {
        return Some(dt.and_utc());
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y%m%d") {
        return date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
    }
    None
}

fn duration_between(start: Option<&str>, end: Option<&str>) -> Option<u16> {
    let start = parse_ics_datetime(start?)?;
    let end = parse_ics_datetime(end?)?;
    let minutes = (end - start).num_minutes();
    if minutes > 0 {
        u16::try_from(minutes).ok()
    } else {
        None
    }
}
