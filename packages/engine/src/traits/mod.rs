//! Collaborator seams the engine depends on.
//!
//! The engine owns the pipeline and planning logic; network fetching,
//! geocoding, the durable catalog, and profile storage are supplied
//! through these traits.

pub mod catalog;
pub mod fetcher;
pub mod geocoder;
pub mod profiles;

pub use catalog::{
    Catalog, GeoFilter, HealthStore, ListingQuery, ListingStore, UpsertOutcome, VenueStore,
};
pub use fetcher::Fetcher;
pub use geocoder::Geocoder;
pub use profiles::ProfileStore;
