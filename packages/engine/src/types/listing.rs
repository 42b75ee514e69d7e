//! Listing records at the two stages of the pipeline: the loosely-typed
//! `RawListing` a parser emits, and the `CanonicalListing` the catalog
//! stores after normalization, dedup, and validation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::ids::{ListingId, SourceId, VenueId};
use super::money::Price;
use super::recurrence::Recurrence;

/// Coarse low/medium/high scale used for intensity and sensory load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Low,
    Medium,
    High,
}

/// Whether an activity is team-based, individual, or mixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SocialFormat {
    Team,
    Solo,
    Mixed,
}

/// Inclusive age range a listing serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgeRange {
    pub min: u8,
    pub max: u8,
}

impl AgeRange {
    pub fn new(min: u8, max: u8) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, age: u8) -> bool {
        self.min <= age && age <= self.max
    }

    /// Whether `age` falls within `buffer` years of the range.
    pub fn contains_with_buffer(&self, age: u8, buffer: u8) -> bool {
        let lo = self.min.saturating_sub(buffer);
        let hi = self.max.saturating_add(buffer);
        lo <= age && age <= hi
    }
}

/// Optional per-listing attributes read by the scorer.
///
/// An explicit record rather than an open map so a missing or misspelled
/// attribute is a type error at the normalizer boundary, not a silent zero
/// downstream.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListingAttributes {
    pub intensity: Option<Level>,
    pub sensory_load: Option<Level>,
    pub social_format: Option<SocialFormat>,
    pub prerequisites: Vec<String>,
    pub neuro_accommodations: Vec<String>,
    pub scholarship_available: bool,
    pub transit_accessible: bool,
}

/// One record as decoded by a format parser, before normalization.
///
/// Everything is optional; the normalizer decides what survives. A raw
/// listing belongs to exactly one source run and is discarded afterwards.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawListing {
    pub source_id: SourceId,
    pub source_item_id: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    /// Start date/time as published, still unparsed.
    pub start_text: Option<String>,
    /// RFC 5545 RRULE body when the source provides one.
    pub rrule: Option<String>,
    pub duration_minutes: Option<u16>,
    pub location: Option<String>,
    pub age_text: Option<String>,
    pub age_min: Option<u8>,
    pub age_max: Option<u8>,
    pub price_text: Option<String>,
    pub provider: Option<String>,
    pub url: Option<String>,
    pub intensity: Option<Level>,
    pub sensory_load: Option<Level>,
    pub social_format: Option<SocialFormat>,
    pub prerequisites: Vec<String>,
    pub neuro_accommodations: Vec<String>,
    pub scholarship_available: Option<bool>,
    pub transit_accessible: Option<bool>,
}

impl RawListing {
    pub fn new(source_id: SourceId) -> Self {
        Self {
            source_id,
            ..Default::default()
        }
    }
}

/// Stable dedup fingerprint over (name, date bucket, venue cell, provider).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CanonHash(pub String);

impl CanonHash {
    /// Hash the already-normalized fingerprint parts. Callers are expected
    /// to go through `pipeline::canon::fingerprint`, which normalizes.
    pub fn from_parts(name: &str, date_bucket: i64, cell: &str, provider: &str) -> Self {
        let preimage = format!("{name}|{date_bucket}|{cell}|{provider}");
        let mut hasher = Sha256::new();
        hasher.update(preimage.as_bytes());
        Self(hex::encode(hasher.finalize()))
    }
}

impl std::fmt::Display for CanonHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A normalized, fingerprinted activity listing as held by the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalListing {
    pub id: ListingId,
    pub name: String,
    pub description: String,
    pub category: String,
    pub age: AgeRange,
    pub schedule: Recurrence,
    pub venue_id: VenueId,
    /// `None` when the source published no price. Scoring treats unknown
    /// price as neutral rather than free.
    pub price: Option<Price>,
    pub provider: String,
    pub attributes: ListingAttributes,
    pub canon_hash: CanonHash,
    pub source_id: SourceId,
    pub source_url: String,
    pub source_item_id: Option<String>,
    pub last_verified: DateTime<Utc>,
    pub is_recommendable: bool,
}

/// The canonical listing plus its score breakdown, computed fresh per
/// recommendation or solve request. Never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredCandidate {
    pub listing: CanonicalListing,
    pub score: f64,
    pub fit: f64,
    pub practical: f64,
    pub goals: f64,
    /// Straight-line distance from the child's home, when both ends are
    /// geocoded.
    pub distance_km: Option<f64>,
}
