//! Geographic primitives: points, distances, and the coarse spatial cells
//! used by venue indexing and the dedup fingerprint.

use serde::{Deserialize, Serialize};

/// Geohash precision for venue cells. Six characters is a ~1.2 km x 0.6 km
/// box, coarse enough that two listings at the same site land in one cell.
pub const GEO_CELL_PRECISION: usize = 6;

const EARTH_RADIUS_KM: f64 = 6371.0;

const BASE32: &[u8] = b"0123456789bcdefghjkmnpqrstuvwxyz";

/// A WGS84 coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Great-circle distance to another point in kilometers.
    pub fn distance_km(&self, other: &GeoPoint) -> f64 {
        let d_lat = (other.lat - self.lat).to_radians();
        let d_lon = (other.lon - self.lon).to_radians();
        let lat1 = self.lat.to_radians();
        let lat2 = other.lat.to_radians();

        let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_KM * h.sqrt().asin()
    }

    /// The ~1 km spatial cell containing this point.
    pub fn cell(&self) -> String {
        encode_geohash(self.lat, self.lon, GEO_CELL_PRECISION)
    }
}

/// Standard geohash encoding (base32, longitude bit first).
pub fn encode_geohash(lat: f64, lon: f64, precision: usize) -> String {
    let mut lat_range = (-90.0_f64, 90.0_f64);
    let mut lon_range = (-180.0_f64, 180.0_f64);
    let mut hash = String::with_capacity(precision);
    let mut bits = 0u8;
    let mut ch: usize = 0;
    let mut even_bit = true;

    while hash.len() < precision {
        if even_bit {
            let mid = (lon_range.0 + lon_range.1) / 2.0;
            if lon >= mid {
                ch = (ch << 1) | 1;
                lon_range.0 = mid;
            } else {
                ch <<= 1;
                lon_range.1 = mid;
            }
        } else {
            let mid = (lat_range.0 + lat_range.1) / 2.0;
            if lat >= mid {
                ch = (ch << 1) | 1;
                lat_range.0 = mid;
            } else {
                ch <<= 1;
                lat_range.1 = mid;
            }
        }
        even_bit = !even_bit;
        bits += 1;

        if bits == 5 {
            hash.push(BASE32[ch] as char);
            bits = 0;
            ch = 0;
        }
    }

    hash
}
