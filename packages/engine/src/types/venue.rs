use serde::{Deserialize, Serialize};

use super::geo::GeoPoint;
use super::ids::VenueId;

/// A physical location where activities run.
///
/// Owned by the catalog and referenced by id from listings. The spatial
/// `cell` is the coarse geohash bucket used for dedup fingerprints and
/// radius pre-filtering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Venue {
    pub id: VenueId,
    pub name: Option<String>,
    pub address: String,
    pub point: Option<GeoPoint>,
    pub timezone: String,
    pub cell: Option<String>,
}

impl Venue {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            id: VenueId::new(),
            name: None,
            address: address.into(),
            point: None,
            timezone: "America/Chicago".to_string(),
            cell: None,
        }
    }

    /// Attach resolved coordinates, deriving the spatial cell.
    pub fn with_point(mut self, point: GeoPoint) -> Self {
        self.cell = Some(point.cell());
        self.point = Some(point);
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Address key used to collapse venues across sources.
    pub fn normalized_address(&self) -> String {
        normalize_address(&self.address)
    }
}

/// Lowercase, collapse whitespace, strip trailing punctuation.
pub fn normalize_address(address: &str) -> String {
    address
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .trim_end_matches(['.', ','])
        .to_string()
}
