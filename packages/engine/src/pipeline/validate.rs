//! Quality checks over normalized listings.
//!
//! A fixed, ordered checklist runs against every listing each ingestion
//! run. Failures never drop a listing; they lower its pass rate, and a
//! listing with more than one failing check is kept for audit but excluded
//! from recommendations. Per-listing pass rates aggregate into the source's
//! run pass rate, which feeds the health tracker.

use chrono::{DateTime, Utc};
use url::Url;

use crate::types::{CanonicalListing, CheckResult, ValidationResult};

pub const CHECK_SOURCE_URL: &str = "source_url_reachable";
pub const CHECK_START_IN_FUTURE: &str = "start_in_future";
pub const CHECK_PRICE: &str = "price_well_formed";
pub const CHECK_VENUE_GEOCODED: &str = "venue_geocoded";
pub const CHECK_AGE_SANE: &str = "age_range_sane";
pub const CHECK_REQUIRED_FIELDS: &str = "required_fields";

/// Sane age bounds: listings outside 2..=18 are flagged as suspect data.
pub const SANE_MIN_AGE: u8 = 2;
pub const SANE_MAX_AGE: u8 = 18;

/// Run facts the checklist needs that the listing itself does not carry.
#[derive(Debug, Clone, Copy)]
pub struct ValidationContext {
    pub now: DateTime<Utc>,
    /// The source host answered this run's fetch.
    pub source_reachable: bool,
    pub venue_geocoded: bool,
    /// Price text was present on the raw record but did not parse.
    pub price_malformed: bool,
}

impl ValidationContext {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now,
            source_reachable: true,
            venue_geocoded: true,
            price_malformed: false,
        }
    }
}

/// Run the checklist. Check order is fixed so reports and logs line up
/// across runs.
pub fn validate(listing: &CanonicalListing, ctx: &ValidationContext) -> ValidationResult {
    let checks = vec![
        CheckResult {
            name: CHECK_SOURCE_URL.to_string(),
            passed: url_well_formed(&listing.source_url) && ctx.source_reachable,
        },
        CheckResult {
            name: CHECK_START_IN_FUTURE.to_string(),
            // Date granularity: a program starting today still counts.
            passed: listing.schedule.anchor.date_naive() >= ctx.now.date_naive(),
        },
        CheckResult {
            name: CHECK_PRICE.to_string(),
            passed: !ctx.price_malformed,
        },
        CheckResult {
            name: CHECK_VENUE_GEOCODED.to_string(),
            passed: ctx.venue_geocoded,
        },
        CheckResult {
            name: CHECK_AGE_SANE.to_string(),
            passed: age_range_sane(listing),
        },
        CheckResult {
            name: CHECK_REQUIRED_FIELDS.to_string(),
            passed: required_fields_present(listing),
        },
    ];

    let passed = checks.iter().filter(|c| c.passed).count();
    let failing: Vec<String> = checks
        .iter()
        .filter(|c| !c.passed)
        .map(|c| c.name.clone())
        .collect();

    ValidationResult {
        pass_rate: passed as f64 / checks.len() as f64,
        checks,
        failing,
    }
}

pub fn url_well_formed(url: &str) -> bool {
    Url::parse(url)
        .map(|parsed| matches!(parsed.scheme(), "http" | "https"))
        .unwrap_or(false)
}

fn age_range_sane(listing: &CanonicalListing) -> bool {
    let age = listing.age;
    SANE_MIN_AGE <= age.min && age.min < age.max && age.max <= SANE_MAX_AGE
}

fn required_fields_present(listing: &CanonicalListing) -> bool {
    !listing.name.trim().is_empty()
        && !listing.category.trim().is_empty()
        && !listing.provider.trim().is_empty()
        && !listing.schedule.days.is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{
        AgeRange, CanonHash, ListingAttributes, ListingId, Recurrence, SourceId, VenueId,
    };
    use chrono::{TimeZone, Weekday};

    fn listing() -> CanonicalListing {
        let anchor = Utc.with_ymd_and_hms(2027, 9, 4, 9, 0, 0).unwrap();
        CanonicalListing {
            id: ListingId::new(),
            name: "Beginner Swim".to_string(),
            description: "Saturday swim lessons".to_string(),
            category: "swimming".to_string(),
            age: AgeRange::new(6, 10),
            schedule: Recurrence::weekly(vec![Weekday::Sat], anchor, 45),
            venue_id: VenueId::new(),
            price: None,
            provider: "parks rec".to_string(),
            attributes: ListingAttributes::default(),
            canon_hash: CanonHash("0".repeat(64)),
            source_id: SourceId::new(),
            source_url: "https://parks.example.org/swim".to_string(),
            source_item_id: None,
            last_verified: Utc::now(),
            is_recommendable: false,
        }
    }

    fn ctx() -> ValidationContext {
        ValidationContext::new(Utc.with_ymd_and_hms(2027, 1, 1, 0, 0, 0).unwrap())
    }

    #[test]
    fn test_clean_listing_passes_all_checks() {
        let result = validate(&listing(), &ctx());
        assert_eq!(result.pass_rate, 1.0);
        assert!(result.failing.is_empty());
        assert!(result.is_recommendable());
        assert_eq!(result.checks.len(), 6);
    }

    #[test]
    fn test_check_order_is_stable() {
        let result = validate(&listing(), &ctx());
        let names: Vec<&str> = result.checks.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                CHECK_SOURCE_URL,
                CHECK_START_IN_FUTURE,
                CHECK_PRICE,
                CHECK_VENUE_GEOCODED,
                CHECK_AGE_SANE,
                CHECK_REQUIRED_FIELDS,
            ]
        );
    }

    #[test]
    fn test_malformed_url_fails() {
        let mut listing = listing();
        listing.source_url = "not a url".to_string();
        let result = validate(&listing, &ctx());
        assert_eq!(result.failing, vec![CHECK_SOURCE_URL]);

        listing.source_url = "ftp://parks.example.org/swim".to_string();
        assert_eq!(validate(&listing, &ctx()).failing, vec![CHECK_SOURCE_URL]);
    }

    #[test]
    fn test_unreachable_source_fails_url_check() {
        let mut context = ctx();
        context.source_reachable = false;
        let result = validate(&listing(), &context);
        assert_eq!(result.failing, vec![CHECK_SOURCE_URL]);
    }

    #[test]
    fn test_past_start_fails() {
        let mut context = ctx();
        context.now = Utc.with_ymd_and_hms(2027, 10, 1, 0, 0, 0).unwrap();
        let result = validate(&listing(), &context);
        assert_eq!(result.failing, vec![CHECK_START_IN_FUTURE]);
    }

    #[test]
    fn test_start_today_counts_as_future() {
        let mut context = ctx();
        context.now = Utc.with_ymd_and_hms(2027, 9, 4, 23, 0, 0).unwrap();
        assert!(validate(&listing(), &context).failing.is_empty());
    }

    #[test]
    fn test_malformed_price_fails() {
        let mut context = ctx();
        context.price_malformed = true;
        let result = validate(&listing(), &context);
        assert_eq!(result.failing, vec![CHECK_PRICE]);
        // One failure still leaves the listing recommendable
        assert!(result.is_recommendable());
    }

    #[test]
    fn test_age_sanity_bounds() {
        let mut listing = listing();

        listing.age = AgeRange::new(0, 10);
        assert_eq!(validate(&listing, &ctx()).failing, vec![CHECK_AGE_SANE]);

        listing.age = AgeRange::new(6, 19);
        assert_eq!(validate(&listing, &ctx()).failing, vec![CHECK_AGE_SANE]);

        listing.age = AgeRange::new(8, 8);
        assert_eq!(validate(&listing, &ctx()).failing, vec![CHECK_AGE_SANE]);

        listing.age = AgeRange::new(2, 18);
        assert!(validate(&listing, &ctx()).failing.is_empty());
    }

    #[test]
    fn test_two_failures_not_recommendable() {
        let mut context = ctx();
        context.venue_geocoded = false;
        context.price_malformed = true;
        let result = validate(&listing(), &context);
        assert_eq!(result.failing.len(), 2);
        assert!(!result.is_recommendable());
        assert!((result.pass_rate - 4.0 / 6.0).abs() < 1e-9);
    }
}
