//! The catalog collaborator: durable storage for canonical listings,
//! venues, and per-source health records.
//!
//! Split into focused traits so implementations can back each concern
//! separately; `Catalog` is the composite the engine takes.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{
    CanonHash, CanonicalListing, GeoPoint, ListingId, SourceHealthRecord, SourceId, Venue, VenueId,
};

/// Radius filter around a point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoFilter {
    pub center: GeoPoint,
    pub radius_km: f64,
}

/// Filters for a catalog query. All filters are conjunctive.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListingQuery {
    pub category: Option<String>,
    /// Keep listings whose age range contains this age.
    pub age: Option<u8>,
    pub near: Option<GeoFilter>,
    pub recommendable_only: bool,
}

impl ListingQuery {
    pub fn recommendable() -> Self {
        Self {
            recommendable_only: true,
            ..Default::default()
        }
    }
}

/// What an upsert did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created,
    Updated,
}

/// Listing storage keyed by `canon_hash`.
///
/// Implementations must serialize concurrent upserts to the same hash and
/// resolve duplicate groups with `pipeline::canon::choose_representative`,
/// so the surviving representative is deterministic regardless of write
/// order. Exactly one recommendable listing exists per hash at any time.
#[async_trait]
pub trait ListingStore: Send + Sync {
    async fn upsert(&self, listing: CanonicalListing) -> Result<UpsertOutcome>;

    async fn get(&self, id: ListingId) -> Result<Option<CanonicalListing>>;

    /// The current group representative for a fingerprint.
    async fn get_by_hash(&self, hash: &CanonHash) -> Result<Option<CanonicalListing>>;

    async fn query(&self, query: &ListingQuery) -> Result<Vec<CanonicalListing>>;

    /// Mark every listing from a demoted source non-recommendable.
    /// Returns the number of listings flipped.
    async fn demote_source_listings(&self, source_id: SourceId) -> Result<usize>;
}

/// Venue storage. Venues are deduplicated by normalized address.
#[async_trait]
pub trait VenueStore: Send + Sync {
    /// Returns the stored venue for this address, inserting if new.
    async fn find_or_create_venue(&self, venue: Venue) -> Result<Venue>;

    async fn venue(&self, id: VenueId) -> Result<Option<Venue>>;
}

/// Per-source health record storage.
#[async_trait]
pub trait HealthStore: Send + Sync {
    async fn health(&self, source_id: SourceId) -> Result<Option<SourceHealthRecord>>;

    async fn put_health(&self, record: SourceHealthRecord) -> Result<()>;
}

/// Composite catalog trait the engine is built against.
pub trait Catalog: ListingStore + VenueStore + HealthStore {}

// Blanket implementation: anything implementing all three stores is a Catalog
impl<T: ListingStore + VenueStore + HealthStore> Catalog for T {}
