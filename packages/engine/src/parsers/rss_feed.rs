//! RSS feed parser for syndication-based sources.
//!
//! Feed entries are sparse compared to calendar events: usually a title,
//! a blurb, a link, and a publish date. The normalizer recovers ages,
//! prices, and schedule details from the description text where it can.

use rss::Channel;

use super::ParseOutcome;
use crate::error::{EngineError, Result};
use crate::types::{RawListing, SourceConfig};

pub fn parse(bytes: &[u8], config: &SourceConfig) -> Result<ParseOutcome> {
    let channel = Channel::read_from(bytes).map_err(|e| EngineError::Parse {
        format: "rss".to_string(),
        reason: e.to_string(),
    })?;

    let mut outcome = ParseOutcome::default();

    for item in channel.items() {
        let Some(title) = item.title().map(str::trim).filter(|t| !t.is_empty()) else {
            outcome.skip();
            continue;
        };

        let mut listing = RawListing::new(config.id);
        listing.name = Some(title.to_string());
        listing.description = item.description().map(strip_html);
        listing.start_text = item.pub_date().map(String::from);
        listing.source_item_id = item.guid().map(|g| g.value().to_string());
        listing.url = item
            .link()
            .map(String::from)
            .or_else(|| Some(config.url.clone()));
        listing.category = item
            .categories()
            .first()
            .map(|c| c.name().trim().to_string())
            .filter(|c| !c.is_empty());

        outcome.push(listing);
    }

    Ok(outcome)
}

/// Drop markup from a description blurb, keeping the text.
fn strip_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut in_tag = false;
    for c in input.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            c if !in_tag => out.push(c),
            _ => {}
        }
    }
    out.trim().to_string()
}
