use async_trait::async_trait;

use crate::error::Result;
use crate::types::GeoPoint;

/// Supplied `address -> (lat, lon)` resolver.
///
/// `Ok(None)` means the address could not be resolved; `Err` means the
/// collaborator itself failed. The normalizer treats both as "venue not
/// geocoded" but only the latter is logged as an error.
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn geocode(&self, address: &str) -> Result<Option<GeoPoint>>;
}
