//! HTML table parser for structured listing pages.
//!
//! Only suitable for sources with a stable, consistent table layout; the
//! CSS selector for the table comes from source options. The first row is
//! taken as the header and columns are matched by alias.

use scraper::{ElementRef, Html, Selector};
use std::collections::HashMap;

use super::{first_of, ParseOutcome, DESCRIPTION_KEYS, NAME_KEYS};
use crate::error::{EngineError, Result};
use crate::types::{RawListing, SourceConfig};

const DEFAULT_TABLE_SELECTOR: &str = "table";

const DATE_COLUMNS: &[&str] = &["start date", "date", "dates", "schedule"];
const LOCATION_COLUMNS: &[&str] = &["location", "venue", "where"];
const AGE_COLUMNS: &[&str] = &["age", "ages", "age range"];
const PRICE_COLUMNS: &[&str] = &["price", "cost", "fee"];

pub fn parse(bytes: &[u8], config: &SourceConfig) -> Result<ParseOutcome> {
    let text = String::from_utf8_lossy(bytes);
    let document = Html::parse_document(&text);

    let table_selector = config
        .options
        .table_selector
        .as_deref()
        .unwrap_or(DEFAULT_TABLE_SELECTOR);
    let selector = Selector::parse(table_selector).map_err(|e| EngineError::Parse {
        format: "html_table".to_string(),
        reason: format!("invalid table selector '{table_selector}': {e}"),
    })?;

    let Some(table) = document.select(&selector).next() else {
        return Err(EngineError::Parse {
            format: "html_table".to_string(),
            reason: format!("no table matched selector '{table_selector}'"),
        });
    };

    let row_selector = Selector::parse("tr").unwrap();
    let header_selector = Selector::parse("th, td").unwrap();
    let cell_selector = Selector::parse("td").unwrap();

    let mut rows = table.select(&row_selector);
    let Some(header_row) = rows.next() else {
        return Err(EngineError::Parse {
            format: "html_table".to_string(),
            reason: "table has no rows".to_string(),
        });
    };

    let headers: Vec<String> = header_row
        .select(&header_selector)
        .map(|cell| cell_text(cell).to_lowercase())
        .collect();

    let mut outcome = ParseOutcome::default();
    for row in rows {
        let cells: Vec<ElementRef> = row.select(&cell_selector).collect();
        if cells.len() != headers.len() {
            outcome.skip();
            continue;
        }

        let row_data: HashMap<&str, String> = headers
            .iter()
            .map(String::as_str)
            .zip(cells.iter().map(|cell| cell_text(*cell)))
            .collect();

        match parse_row(&row_data, &cells, config) {
            Some(listing) => outcome.push(listing),
            None => outcome.skip(),
        }
    }

    Ok(outcome)
}

fn parse_row(
    row_data: &HashMap<&str, String>,
    cells: &[ElementRef],
    config: &SourceConfig,
) -> Option<RawListing> {
    let get = |key: &str| row_data.get(key).map(String::as_str);
    let name = first_of(get, NAME_KEYS)?;

    let mut listing = RawListing::new(config.id);
    listing.name = Some(name);
    listing.description = first_of(get, DESCRIPTION_KEYS);
    listing.start_text = first_of(get, DATE_COLUMNS);
    listing.location = first_of(get, LOCATION_COLUMNS);
    listing.age_text = first_of(get, AGE_COLUMNS);
    listing.price_text = first_of(get, PRICE_COLUMNS);
    listing.url = row_link(cells).or_else(|| Some(config.url.clone()));

    Some(listing)
}

/// Registration link: the first anchor anywhere in the row.
fn row_link(cells: &[ElementRef]) -> Option<String> {
    let anchor_selector = Selector::parse("a[href]").unwrap();
    cells
        .iter()
        .flat_map(|cell| cell.select(&anchor_selector))
        .find_map(|a| a.value().attr("href"))
        .map(String::from)
}

fn cell_text(cell: ElementRef) -> String {
    cell.text().collect::<Vec<_>>().join(" ").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{SourceFormat, SourceOptions};

    fn config(table_selector: Option<&str>) -> SourceConfig {
        SourceConfig::builder()
            .name("Community Ed")
            .url("https://commed.example.org/fall")
            .format(SourceFormat::HtmlTable)
            .provider("Community Education")
            .options(SourceOptions {
                table_selector: table_selector.map(String::from),
                ..Default::default()
            })
            .build()
    }

    const PAGE: &str = r#"<html><body>
<table class="programs">
  <tr><th>Program</th><th>Date</th><th>Ages</th><th>Price</th><th>Location</th></tr>
  <tr>
    <td><a href="https://commed.example.org/chess">Chess Club</a></td>
    <td>2025-09-10</td>
    <td>ages 6-10</td>
    <td>$45</td>
    <td>Lincoln Elementary</td>
  </tr>
  <tr><td>Broken row</td><td>only two cells</td></tr>
</table>
</body></html>"#;

    #[test]
    fn test_parses_table_rows() {
        let outcome = parse(PAGE.as_bytes(), &config(Some("table.programs"))).unwrap();
        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.skipped, 1);

        let record = &outcome.records[0];
        assert_eq!(record.name.as_deref(), Some("Chess Club"));
        assert_eq!(record.start_text.as_deref(), Some("2025-09-10"));
        assert_eq!(record.age_text.as_deref(), Some("ages 6-10"));
        assert_eq!(record.price_text.as_deref(), Some("$45"));
        assert_eq!(record.location.as_deref(), Some("Lincoln Elementary"));
        assert_eq!(record.url.as_deref(), Some("https://commed.example.org/chess"));
    }

    #[test]
    fn test_default_selector_finds_first_table() {
        let outcome = parse(PAGE.as_bytes(), &config(None)).unwrap();
        assert_eq!(outcome.records.len(), 1);
    }

    #[test]
    fn test_missing_table_is_an_error() {
        let result = parse(b"<html><body><p>No table here</p></body></html>", &config(None));
        assert!(result.is_err());
    }

    #[test]
    fn test_row_without_name_is_skipped() {
        let page = r#"<table>
  <tr><th>Date</th><th>Price</th></tr>
  <tr><td>2025-09-10</td><td>$45</td></tr>
</table>"#;

        let outcome = parse(page.as_bytes(), &config(None)).unwrap();
        assert!(outcome.records.is_empty());
        assert_eq!(outcome.skipped, 1);
    }
}
