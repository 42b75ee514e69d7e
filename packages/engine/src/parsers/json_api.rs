//! JSON parser for API-based sources.
//!
//! Handles REST event APIs and open data portals. Field names vary widely
//! across vendors, so lookups go through alias lists; the optional
//! `json_path` option points at the array of events inside a wrapped
//! response (e.g. `"events"` or `"data.items"`).

use chrono::DateTime;
use serde_json::{Map, Value};
use tracing::warn;

use super::{first_of, ParseOutcome, DESCRIPTION_KEYS, NAME_KEYS};
use crate::error::{EngineError, Result};
use crate::types::{Level, RawListing, SocialFormat, SourceConfig};

const START_KEYS: &[&str] = &["start", "start_date", "start_time", "date", "datetime_start"];
const END_KEYS: &[&str] = &["end", "end_date", "end_time", "datetime_end"];
const URL_KEYS: &[&str] = &["url", "event_url", "link", "website"];
const PRICE_KEYS: &[&str] = &["price", "cost", "ticket_price"];
const CATEGORY_KEYS: &[&str] = &["category", "activity_type", "type"];

pub fn parse(bytes: &[u8], config: &SourceConfig) -> Result<ParseOutcome> {
    let root: Value = serde_json::from_slice(bytes).map_err(|e| EngineError::Parse {
        format: "json_api".to_string(),
        reason: e.to_string(),
    })?;

    let target = match config.options.json_path.as_deref() {
        Some(path) => match descend(&root, path) {
            Some(value) => value,
            None => {
                warn!(source = %config.name, json_path = path, "JSON path not found in response");
                return Ok(ParseOutcome::default());
            }
        },
        None => &root,
    };

    let items: Vec<&Value> = match target {
        Value::Array(items) => items.iter().collect(),
        // A single event, or one wrapped in an object
        Value::Object(_) => vec![target],
        other => {
            warn!(source = %config.name, "expected array or object of events, got {}", value_kind(other));
            return Ok(ParseOutcome::default());
        }
    };

    let mut outcome = ParseOutcome::default();
    for item in items {
        match item.as_object().and_then(|obj| parse_item(obj, config)) {
            Some(listing) => outcome.push(listing),
            None => outcome.skip(),
        }
    }

    Ok(outcome)
}

/// Dotted-path traversal; descending stops early if it reaches an array.
fn descend<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = root;
    for part in path.split('.') {
        match current {
            Value::Object(map) => current = map.get(part)?,
            Value::Array(_) => break,
            _ => return None,
        }
    }
    Some(current)
}

fn parse_item(obj: &Map<String, Value>, config: &SourceConfig) -> Option<RawListing> {
    let name = get_str(obj, NAME_KEYS)?;

    let mut listing = RawListing::new(config.id);
    listing.name = Some(name);
    listing.description = get_str(obj, DESCRIPTION_KEYS);
    listing.category = get_str(obj, CATEGORY_KEYS);
    listing.start_text = start_text(obj, START_KEYS);
    listing.duration_minutes = duration_minutes(obj);
    listing.rrule = obj.get("rrule").and_then(Value::as_str).map(String::from);
    listing.location = location_text(obj);
    listing.price_text = price_text(obj, PRICE_KEYS);
    listing.age_min = get_u8(obj, &["min_age", "age_min"]);
    listing.age_max = get_u8(obj, &["max_age", "age_max"]);
    listing.age_text = get_str(obj, &["age_range", "ages"]);
    listing.source_item_id = item_id(obj);
    listing.url = get_str(obj, URL_KEYS).or_else(|| Some(config.url.clone()));

    if let Some(attrs) = obj.get("attributes").and_then(Value::as_object) {
        apply_attributes(&mut listing, attrs);
    }

    Some(listing)
}

/// Attribute bag in the shape providers publish: `intensity_level`,
/// `sensory_load`, `team_vs_solo`, `prerequisites`, and so on.
fn apply_attributes(listing: &mut RawListing, attrs: &Map<String, Value>) {
    listing.intensity = get_str(attrs, &["intensity_level", "intensity"])
        .as_deref()
        .and_then(parse_level);
    listing.sensory_load = get_str(attrs, &["sensory_load"])
        .as_deref()
        .and_then(parse_level);
    listing.social_format = get_str(attrs, &["team_vs_solo", "social_format"])
        .as_deref()
        .and_then(parse_social);
    listing.prerequisites = string_array(attrs, "prerequisites");
    listing.neuro_accommodations = string_array(attrs, "neuro_accommodations");
    if listing.neuro_accommodations.is_empty() {
        listing.neuro_accommodations = string_array(attrs, "accommodations");
    }
    listing.scholarship_available = attrs
        .get("has_scholarship")
        .or_else(|| attrs.get("scholarship_available"))
        .and_then(Value::as_bool);
    listing.transit_accessible = attrs.get("transit_accessible").and_then(Value::as_bool);
}

fn parse_level(value: &str) -> Option<Level> {
    match value.trim().to_ascii_lowercase().as_str() {
        "low" => Some(Level::Low),
        "medium" | "moderate" => Some(Level::Medium),
        "high" => Some(Level::High),
        _ => None,
    }
}

fn parse_social(value: &str) -> Option<SocialFormat> {
    match value.trim().to_ascii_lowercase().as_str() {
        "team" => Some(SocialFormat::Team),
        "solo" => Some(SocialFormat::Solo),
        "mixed" | "small_group" => Some(SocialFormat::Mixed),
        _ => None,
    }
}

fn get_str(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    first_of(|k| obj.get(k).and_then(Value::as_str), keys)
}

fn get_u8(obj: &Map<String, Value>, keys: &[&str]) -> Option<u8> {
    keys.iter().find_map(|k| {
        let value = obj.get(*k)?;
        if let Some(n) = value.as_u64() {
            return u8::try_from(n).ok();
        }
        value.as_str()?.trim().parse().ok()
    })
}

fn string_array(obj: &Map<String, Value>, key: &str) -> Vec<String> {
    obj.get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(String::from)
                .collect()
        })
        .unwrap_or_default()
}

/// Start values come as strings or as nested `{"local": ..., "utc": ...}`
/// objects (Eventbrite style).
fn start_text(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|k| match obj.get(*k)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Object(nested) => get_str(nested, &["local", "utc"]),
        _ => None,
    })
}

/// Session length, either published directly or derived from start/end
/// timestamps when both are RFC 3339.
fn duration_minutes(obj: &Map<String, Value>) -> Option<u16> {
    if let Some(n) = obj.get("duration_minutes").and_then(Value::as_u64) {
        return u16::try_from(n).ok();
    }

    let start = start_text(obj, START_KEYS)?;
    let end = start_text(obj, END_KEYS)?;
    let start = DateTime::parse_from_rfc3339(&start).ok()?;
    let end = DateTime::parse_from_rfc3339(&end).ok()?;
    let minutes = (end - start).num_minutes();
    if minutes > 0 {
        u16::try_from(minutes).ok()
    } else {
        None
    }
}

/// Venue comes as a nested object or a bare string.
fn location_text(obj: &Map<String, Value>) -> Option<String> {
    let value = obj
        .get("venue")
        .or_else(|| obj.get("location"))
        .or_else(|| obj.get("place"))?;

    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Object(nested) => {
            let parts: Vec<String> = [
                get_str(nested, &["name", "venue_name"]),
                get_str(nested, &["address", "address_1"]),
                get_str(nested, &["city"]),
                get_str(nested, &["state", "region"]),
                get_str(nested, &["zip_code", "postal_code"]),
            ]
            .into_iter()
            .flatten()
            .collect();
            if parts.is_empty() {
                None
            } else {
                Some(parts.join(", "))
            }
        }
        _ => None,
    }
}

/// Price comes as a number of dollars, a `{"value"/"amount"}` object, or
/// free text. Everything funnels into `price_text` for the normalizer.
fn price_text(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|k| match obj.get(*k)? {
        Value::Number(n) => n.as_f64().map(|v| format!("{v:.2}")),
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Object(nested) => {
            let value = nested.get("value").or_else(|| nested.get("amount"))?;
            match value {
                Value::Number(n) => n.as_f64().map(|v| format!("{v:.2}")),
                Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
                _ => None,
            }
        }
        _ => None,
    })
}

fn item_id(obj: &Map<String, Value>) -> Option<String> {
    let value = obj.get("id").or_else(|| obj.get("uid"))?;
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
