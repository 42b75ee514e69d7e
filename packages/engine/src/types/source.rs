use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

use super::ids::SourceId;

/// The closed set of feed formats the parsers understand.
///
/// Dispatch is by this enum on the source config; adding a format means
/// adding a variant and a parser, not discovering plugins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceFormat {
    Ics,
    Rss,
    JsonApi,
    HtmlTable,
}

/// Per-source parser knobs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceOptions {
    /// CSS selector for the listings table (HTML sources).
    pub table_selector: Option<String>,
    /// Dotted path to the listings array inside an API response.
    pub json_path: Option<String>,
    /// Hard cap on items taken from one fetch.
    pub item_limit: Option<usize>,
    /// Venue used when the feed carries no per-item location. Common for
    /// single-site feeds (a library or rec center publishing its own
    /// calendar).
    pub default_location: Option<String>,
}

/// Configuration for one ingestion source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TypedBuilder)]
pub struct SourceConfig {
    #[builder(default)]
    pub id: SourceId,
    #[builder(setter(into))]
    pub name: String,
    #[builder(setter(into))]
    pub url: String,
    pub format: SourceFormat,
    /// Organization the listings belong to; part of the dedup fingerprint.
    #[builder(setter(into))]
    pub provider: String,
    /// Category applied when the feed does not carry one per item.
    #[builder(default, setter(strip_option, into))]
    pub category_hint: Option<String>,
    #[builder(default)]
    pub options: SourceOptions,
}
