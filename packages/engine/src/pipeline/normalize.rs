//! Field normalization: a loose `RawListing` becomes a `CanonicalListing`
//! candidate, or is dropped with a logged reason.
//!
//! Sources spell the same facts a dozen ways. This module owns the mapping
//! into the canonical schema: dates to UTC, prices to cents with a billing
//! period, age text to an inclusive range, free-text locations to a stored
//! `Venue` via the geocoder. A record missing a required field (name,
//! category, age range, venue, schedule) is excluded here and counted as a
//! parse-stage drop; lower-quality but complete records go on to validation.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc, Weekday};
use lazy_static::lazy_static;
use regex::Regex;

use crate::error::Result;
use crate::parsers::ics::parse_ics_datetime;
use crate::pipeline::canon::FingerprintParts;
use crate::traits::{Geocoder, VenueStore};
use crate::types::{
    AgeRange, BillingPeriod, CanonicalListing, Currency, ListingAttributes, ListingId, Price,
    RawListing, Recurrence, SourceConfig, Venue,
};

/// Session length assumed when a source does not publish one.
pub const DEFAULT_DURATION_MINUTES: u16 = 60;

/// Open-topped age text ("6+") clamps here.
pub const OPEN_TOP_AGE: u8 = 18;

/// Open-bottomed numeric ranges (max only) are floored here.
pub const OPEN_BOTTOM_AGE: u8 = 2;

lazy_static! {
    // "ages 6-10", "Age: 6 to 10", bare "6-10"
    static ref AGE_RANGE_REGEX: Regex =
        Regex::new(r"(?i)(?:\bages?\b[:\s]*)?(\d{1,2})\s*(?:-|to)\s*(\d{1,2})").unwrap();

    // "6+", "ages 6 and up"
    static ref AGE_OPEN_REGEX: Regex =
        Regex::new(r"(?i)(?:\bages?\b[:\s]*)?(\d{1,2})\s*(?:\+|and up)").unwrap();

    // Stricter form for free-text scans: requires the "ages" prefix so a
    // date or address in a description cannot masquerade as an age range.
    static ref PROSE_AGE_REGEX: Regex =
        Regex::new(r"(?i)\bages?\s+(\d{1,2})\s*(?:-|to)\s*(\d{1,2})\b").unwrap();

    // "$125", "125.00", "$12.50/mo"
    static ref PRICE_REGEX: Regex = Regex::new(r"\$?\s*(\d+(?:\.\d{1,2})?)").unwrap();
}

/// Non-ICS sources publish datetimes in these layouts, tried in order.
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%m/%d/%Y %H:%M"];

/// Date-only layouts; midnight UTC is assumed. US ordering is tried before
/// day-first, so an ambiguous date resolves the way US feeds intend.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%d/%m/%Y"];

/// A normalized listing plus the per-record facts the validator needs but
/// the canonical schema does not carry.
#[derive(Debug, Clone)]
pub struct NormalizedRecord {
    pub listing: CanonicalListing,
    /// The venue resolved to coordinates.
    pub venue_geocoded: bool,
    /// Price text was present but did not parse. Distinct from absent.
    pub price_malformed: bool,
}

/// Normalize one raw record.
///
/// `Ok(None)` means the record was dropped for a missing required field.
/// `Err` is reserved for venue-store failures; a geocoder failure degrades
/// to an ungeocoded venue instead.
pub async fn normalize(
    raw: &RawListing,
    config: &SourceConfig,
    geocoder: &dyn Geocoder,
    venues: &dyn VenueStore,
    now: DateTime<Utc>,
) -> Result<Option<NormalizedRecord>> {
    let Some(name) = nonempty(raw.name.as_deref()) else {
        return Ok(drop_record(config, "name missing"));
    };

    let Some(category) = resolve_category(raw, config) else {
        return Ok(drop_record(config, "category missing"));
    };

    let Some(age) = resolve_age(raw) else {
        return Ok(drop_record(config, "age range missing"));
    };

    let Some(schedule) = build_schedule(raw) else {
        return Ok(drop_record(config, "schedule missing or unparseable"));
    };

    let location = nonempty(raw.location.as_deref())
        .or_else(|| nonempty(config.options.default_location.as_deref()));
    let Some(location) = location else {
        return Ok(drop_record(config, "location missing"));
    };

    let point = match geocoder.geocode(location).await {
        Ok(point) => point,
        Err(error) => {
            tracing::error!(error = %error, address = %location, "Geocoder failure");
            None
        }
    };

    let mut venue = Venue::new(location);
    if let Some(point) = point {
        venue = venue.with_point(point);
    }
    let venue = venues.find_or_create_venue(venue).await?;
    let venue_geocoded = venue.point.is_some();
    let cell = venue.cell.clone().unwrap_or_default();

    let provider = nonempty(raw.provider.as_deref()).unwrap_or(&config.provider);
    let parts = FingerprintParts::new(name, schedule.anchor, &cell, provider);

    let (price, price_malformed) = match nonempty(raw.price_text.as_deref()) {
        None => (None, false),
        Some(text) => match parse_price_text(text) {
            Some(price) => (Some(price), false),
            None => {
                tracing::debug!(source = %config.name, price = %text, "Unparseable price text");
                (None, true)
            }
        },
    };

    let listing = CanonicalListing {
        id: ListingId::new(),
        name: name.to_string(),
        description: raw.description.clone().unwrap_or_default(),
        category,
        age,
        schedule,
        venue_id: venue.id,
        price,
        provider: provider.to_string(),
        attributes: attributes_from(raw),
        canon_hash: parts.hash(),
        source_id: raw.source_id,
        source_url: raw.url.clone().unwrap_or_else(|| config.url.clone()),
        source_item_id: raw.source_item_id.clone(),
        last_verified: now,
        // Set by validation before the upsert.
        is_recommendable: false,
    };

    Ok(Some(NormalizedRecord {
        listing,
        venue_geocoded,
        price_malformed,
    }))
}

fn drop_record(config: &SourceConfig, reason: &str) -> Option<NormalizedRecord> {
    tracing::debug!(source = %config.name, reason, "Dropping raw listing");
    None
}

fn nonempty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn resolve_category(raw: &RawListing, config: &SourceConfig) -> Option<String> {
    nonempty(raw.category.as_deref())
        .or(config.category_hint.as_deref())
        .map(|c| c.trim().to_lowercase())
}

/// Resolve an age range from numeric fields, age text, or a conservative
/// scan of the description, in that order.
fn resolve_age(raw: &RawListing) -> Option<AgeRange> {
    match (raw.age_min, raw.age_max) {
        (Some(min), Some(max)) => return Some(AgeRange::new(min, max)),
        (Some(min), None) => return Some(AgeRange::new(min, OPEN_TOP_AGE)),
        (None, Some(max)) => return Some(AgeRange::new(OPEN_BOTTOM_AGE.min(max), max)),
        (None, None) => {}
    }

    if let Some(range) = raw.age_text.as_deref().and_then(parse_age_text) {
        return Some(range);
    }

    raw.description.as_deref().and_then(|text| {
        let caps = PROSE_AGE_REGEX.captures(text)?;
        let min = caps[1].parse().ok()?;
        let max = caps[2].parse().ok()?;
        Some(AgeRange::new(min, max))
    })
}

/// Parse a published age phrase: "ages 6-10", "6 to 10", "6+".
pub fn parse_age_text(text: &str) -> Option<AgeRange> {
    if let Some(caps) = AGE_RANGE_REGEX.captures(text) {
        let min = caps[1].parse().ok()?;
        let max = caps[2].parse().ok()?;
        return Some(AgeRange::new(min, max));
    }

    if let Some(caps) = AGE_OPEN_REGEX.captures(text) {
        let min: u8 = caps[1].parse().ok()?;
        return Some(AgeRange::new(min.min(OPEN_TOP_AGE), OPEN_TOP_AGE));
    }

    None
}

/// Parse a published price phrase into cents plus a billing period.
///
/// "Free" is a zero price. A bare dollar amount with no period word is
/// treated as per-session, the common case for drop-in listings.
pub fn parse_price_text(text: &str) -> Option<Price> {
    let lower = text.trim().to_lowercase();
    if lower.is_empty() {
        return None;
    }

    if lower.contains("free") {
        return Some(Price::free());
    }

    let caps = PRICE_REGEX.captures(&lower)?;
    let dollars: f64 = caps[1].parse().ok()?;
    let amount_cents = (dollars * 100.0).round() as i64;

    Some(Price::new(amount_cents, Currency::Usd, billing_period(&lower)))
}

fn billing_period(lower: &str) -> BillingPeriod {
    if lower.contains("/mo") || lower.contains("per month") || lower.contains("monthly") {
        BillingPeriod::PerMonth
    } else if lower.contains("/wk") || lower.contains("per week") || lower.contains("weekly") {
        BillingPeriod::PerWeek
    } else if lower.contains("/term") || lower.contains("per term") || lower.contains("per semester")
    {
        BillingPeriod::PerTerm
    } else if lower.contains("one-time") || lower.contains("one time") {
        BillingPeriod::OneTime
    } else {
        BillingPeriod::PerSession
    }
}

/// Parse a start datetime in any accepted layout, normalized to UTC.
pub fn parse_start_text(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }

    // RSS pubDate
    if let Ok(dt) = DateTime::parse_from_rfc2822(text) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Some(dt.and_utc());
        }
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
        }
    }

    parse_ics_datetime(text)
}

fn build_schedule(raw: &RawListing) -> Option<Recurrence> {
    let start = raw.start_text.as_deref().and_then(parse_start_text)?;
    let duration = raw.duration_minutes.unwrap_or(DEFAULT_DURATION_MINUTES);
    let days = raw
        .rrule
        .as_deref()
        .map(|body| rrule_weekdays(body, start))
        .unwrap_or_default();
    Some(Recurrence::weekly(days, start, duration))
}

/// Meeting weekdays from an RRULE body, validated through the `rrule` crate.
/// An unparseable rule degrades to the anchor's weekday.
fn rrule_weekdays(body: &str, anchor: DateTime<Utc>) -> Vec<Weekday> {
    let full = format!(
        "DTSTART:{}\nRRULE:{}",
        anchor.format("%Y%m%dT%H%M%SZ"),
        body
    );

    match full.parse::<rrule::RRuleSet>() {
        Ok(set) => set
            .get_rrule()
            .iter()
            .flat_map(|rule| rule.get_by_weekday().iter())
            .map(|day| match day {
                rrule::NWeekday::Every(weekday) => *weekday,
                rrule::NWeekday::Nth(_, weekday) => *weekday,
            })
            .collect(),
        Err(error) => {
            tracing::warn!(error = %error, rrule = %body, "Ignoring unparseable RRULE");
            vec![]
        }
    }
}

fn attributes_from(raw: &RawListing) -> ListingAttributes {
    ListingAttributes {
        intensity: raw.intensity,
        sensory_load: raw.sensory_load,
        social_format: raw.social_format,
        prerequisites: raw.prerequisites.clone(),
        neuro_accommodations: raw.neuro_accommodations.clone(),
        scholarship_available: raw.scholarship_available.unwrap_or(false),
        transit_accessible: raw.transit_accessible.unwrap_or(false),
    }
}
