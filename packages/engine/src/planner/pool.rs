//! Builds the scored candidate pool shared by the recommendation and
//! planning surfaces.

use crate::error::Result;
use crate::scoring::{score_listing, ScoredListing};
use crate::traits::{Catalog, GeoFilter, ListingQuery};
use crate::types::{ChildProfile, FamilyProfile};

use super::solver::ChildContext;

/// Query the catalog and score every eligible listing for one child.
///
/// With a home on file the query is radius-filtered and listings at
/// unlocated venues are excluded (their distance cannot be verified).
/// Without one, everything age-eligible is in and commute scores neutral.
pub async fn build_pool(
    catalog: &dyn Catalog,
    child: &ChildProfile,
    family: &FamilyProfile,
) -> Result<Vec<ScoredListing>> {
    let query = ListingQuery {
        category: None,
        age: Some(child.age),
        near: family.home.map(|center| GeoFilter {
            center,
            radius_km: child.travel_radius_km,
        }),
        recommendable_only: true,
    };

    let listings = catalog.query(&query).await?;

    let mut pool = Vec::with_capacity(listings.len());
    for listing in listings {
        let venue_point = catalog.venue(listing.venue_id).await?.and_then(|v| v.point);
        let distance_km = family
            .home
            .zip(venue_point)
            .map(|(home, point)| home.distance_km(&point));
        let breakdown = score_listing(&listing, child, family, distance_km);
        pool.push(ScoredListing { listing, breakdown });
    }

    Ok(pool)
}

/// Build one child's solve context, optionally overriding the travel
/// radius (plan constraints and radius probes both go through here).
pub async fn build_context(
    catalog: &dyn Catalog,
    child: &ChildProfile,
    family: &FamilyProfile,
    radius_override: Option<f64>,
) -> Result<ChildContext> {
    let mut child = child.clone();
    if let Some(radius) = radius_override {
        child.travel_radius_km = radius;
    }
    let pool = build_pool(catalog, &child, family).await?;
    Ok(ChildContext {
        profile: child,
        pool,
    })
}
