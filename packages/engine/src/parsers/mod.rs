//! Format parsers: one per supported feed format.
//!
//! Each parser decodes a fetched payload into loose `RawListing` records.
//! A parser never fails on a single malformed entry; it emits what it can
//! and counts the rest as skips. Only an undecodable payload is an error.

use crate::error::Result;
use crate::types::{RawListing, SourceConfig, SourceFormat};

pub mod html_table;
pub mod ics;
pub mod json_api;
pub mod rss_feed;

/// What one payload parsed into.
#[derive(Debug, Default)]
pub struct ParseOutcome {
    pub records: Vec<RawListing>,
    /// Entries dropped because they were individually malformed.
    pub skipped: usize,
}

impl ParseOutcome {
    pub fn push(&mut self, record: RawListing) {
        self.records.push(record);
    }

    pub fn skip(&mut self) {
        self.skipped += 1;
    }
}

/// Decode `bytes` according to the source's declared format.
pub fn parse(bytes: &[u8], config: &SourceConfig) -> Result<ParseOutcome> {
    let mut outcome = match config.format {
        SourceFormat::Ics => ics::parse(bytes, config),
        SourceFormat::Rss => rss_feed::parse(bytes, config),
        SourceFormat::JsonApi => json_api::parse(bytes, config),
        SourceFormat::HtmlTable => html_table::parse(bytes, config),
    }?;

    if let Some(limit) = config.options.item_limit {
        outcome.records.truncate(limit);
    }

    Ok(outcome)
}

/// First non-empty value among `keys`, trimmed.
pub(crate) fn first_of<'a>(
    get: impl Fn(&str) -> Option<&'a str>,
    keys: &[&str],
) -> Option<String> {
    keys.iter()
        .filter_map(|k| get(k))
        .map(str::trim)
        .find(|v| !v.is_empty())
        .map(String::from)
}

/// Field spellings accepted for an activity name.
pub(crate) const NAME_KEYS: &[&str] = &["name", "title", "activity", "program", "event_name"];

/// Field spellings accepted for a description.
pub(crate) const DESCRIPTION_KEYS: &[&str] = &["description", "details", "summary"];

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_first_of_prefers_earlier_keys() {
        let mut map = HashMap::new();
        map.insert("title", "Chess Club");
        map.insert("program", "Ignored");

        let got = first_of(|k| map.get(k).copied(), NAME_KEYS);
        assert_eq!(got.as_deref(), Some("Chess Club"));
    }

    #[test]
    fn test_first_of_skips_empty_values() {
        let mut map = HashMap::new();
        map.insert("name", "  ");
        map.insert("title", "Chess Club");

        let got = first_of(|k| map.get(k).copied(), NAME_KEYS);
        assert_eq!(got.as_deref(), Some("Chess Club"));
    }

    #[test]
    fn test_item_limit_truncates() {
        let config = SourceConfig::builder()
            .name("feed")
            .url("https://example.org/feed.ics")
            .format(SourceFormat::Ics)
            .provider("Example")
            .options(crate::types::SourceOptions {
                item_limit: Some(1),
                ..Default::default()
            })
            .build();

        let payload = concat!(
            "BEGIN:VCALENDAR\r\n",
            "BEGIN:VEVENT\r\nSUMMARY:One\r\nDTSTART:20250306T170000Z\r\nEND:VEVENT\r\n",
            "BEGIN:VEVENT\r\nSUMMARY:Two\r\nDTSTART:20250307T170000Z\r\nEND:VEVENT\r\n",
            "END:VCALENDAR\r\n"
        );

        let outcome = parse(payload.as_bytes(), &config).unwrap();
        assert_eq!(outcome.records.len(), 1);
    }
}
