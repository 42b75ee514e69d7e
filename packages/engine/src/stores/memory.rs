//! In-memory catalog and profile store for testing and development.

use async_trait::async_trait;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::RwLock;

use crate::error::Result;
use crate::pipeline::canon::{choose_representative, is_near_duplicate, FingerprintParts};
use crate::traits::{
    HealthStore, ListingQuery, ListingStore, ProfileStore, UpsertOutcome, VenueStore,
};
use crate::types::{
    CanonHash, CanonicalListing, ChildId, ChildProfile, FamilyId, FamilyProfile, ListingId,
    SourceHealthRecord, SourceId, Venue, VenueId,
};

/// One duplicate group: every listing sharing a fingerprint, with the
/// current canonical representative and the parts the group matches on.
#[derive(Debug, Clone)]
struct DupGroup {
    members: Vec<CanonicalListing>,
    rep: usize,
    parts: FingerprintParts,
}

/// In-memory catalog.
///
/// Useful for testing and development; data is lost on restart. The whole
/// upsert runs under one write lock, which serializes concurrent writes to
/// the same fingerprint and keeps the representative choice deterministic.
pub struct MemoryCatalog {
    groups: RwLock<HashMap<CanonHash, DupGroup>>,
    venues: RwLock<HashMap<VenueId, Venue>>,
    venue_addresses: RwLock<HashMap<String, VenueId>>,
    health: RwLock<HashMap<SourceId, SourceHealthRecord>>,
}

impl Default for MemoryCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self {
            groups: RwLock::new(HashMap::new()),
            venues: RwLock::new(HashMap::new()),
            venue_addresses: RwLock::new(HashMap::new()),
            health: RwLock::new(HashMap::new()),
        }
    }

    /// Number of duplicate groups (distinct fingerprints).
    pub fn group_count(&self) -> usize {
        self.groups.read().unwrap().len()
    }

    /// Total stored listings including superseded group members.
    pub fn listing_count(&self) -> usize {
        self.groups
            .read()
            .unwrap()
            .values()
            .map(|g| g.members.len())
            .sum()
    }

    pub fn venue_count(&self) -> usize {
        self.venues.read().unwrap().len()
    }

    /// All members of a fingerprint group, representative first. Superseded
    /// members are retained here for audit only.
    pub fn group_members(&self, hash: &CanonHash) -> Vec<CanonicalListing> {
        let groups = self.groups.read().unwrap();
        let Some(group) = groups.get(hash) else {
            return vec![];
        };
        let mut members = Vec::with_capacity(group.members.len());
        members.push(group.members[group.rep].clone());
        for (i, m) in group.members.iter().enumerate() {
            if i != group.rep {
                members.push(m.clone());
            }
        }
        members
    }

    pub fn clear(&self) {
        self.groups.write().unwrap().clear();
        self.venues.write().unwrap().clear();
        self.venue_addresses.write().unwrap().clear();
        self.health.write().unwrap().clear();
    }

    fn cell_for_venue(&self, venue_id: VenueId) -> String {
        self.venues
            .read()
            .unwrap()
            .get(&venue_id)
            .and_then(|v| v.cell.clone())
            .unwrap_or_default()
    }

    fn venue_point(&self, venue_id: VenueId) -> Option<crate::types::GeoPoint> {
        self.venues.read().unwrap().get(&venue_id).and_then(|v| v.point)
    }
}

#[async_trait]
impl ListingStore for MemoryCatalog {
    async fn upsert(&self, mut listing: CanonicalListing) -> Result<UpsertOutcome> {
        let cell = self.cell_for_venue(listing.venue_id);
        let parts = FingerprintParts::new(
            &listing.name,
            listing.schedule.anchor,
            &cell,
            &listing.provider,
        );

        let mut groups = self.groups.write().unwrap();

        // Exact fingerprint match first, then fold into a near-duplicate
        // group (typo'd name or bucket-straddling date).
        let target = if groups.contains_key(&listing.canon_hash) {
            listing.canon_hash.clone()
        } else {
            groups
                .iter()
                .find(|(_, g)| is_near_duplicate(&parts, &g.parts))
                .map(|(hash, _)| hash.clone())
                .unwrap_or_else(|| listing.canon_hash.clone())
        };
        listing.canon_hash = target.clone();

        match groups.entry(target) {
            Entry::Vacant(slot) => {
                slot.insert(DupGroup {
                    members: vec![listing],
                    rep: 0,
                    parts,
                });
                Ok(UpsertOutcome::Created)
            }
            Entry::Occupied(mut slot) => {
                let group = slot.get_mut();

                // Re-ingestion replaces the member from the same source
                // item, keeping its listing id stable across runs.
                let existing = group.members.iter().position(|m| {
                    m.source_id == listing.source_id
                        && m.source_item_id == listing.source_item_id
                        && (m.source_item_id.is_some() || m.source_url == listing.source_url)
                });

                match existing {
                    Some(i) => {
                        listing.id = group.members[i].id;
                        group.members[i] = listing;
                    }
                    None => group.members.push(listing),
                }

                if let Some(rep) = choose_representative(&group.members) {
                    group.rep = rep;
                    let rep_member = &group.members[rep];
                    group.parts = FingerprintParts::new(
                        &rep_member.name,
                        rep_member.schedule.anchor,
                        &parts.cell,
                        &rep_member.provider,
                    );
                }

                Ok(UpsertOutcome::Updated)
            }
        }
    }

    async fn get(&self, id: ListingId) -> Result<Option<CanonicalListing>> {
        let groups = self.groups.read().unwrap();
        Ok(groups
            .values()
            .flat_map(|g| g.members.iter())
            .find(|m| m.id == id)
            .cloned())
    }

    async fn get_by_hash(&self, hash: &CanonHash) -> Result<Option<CanonicalListing>> {
        let groups = self.groups.read().unwrap();
        Ok(groups.get(hash).map(|g| g.members[g.rep].clone()))
    }

    async fn query(&self, query: &ListingQuery) -> Result<Vec<CanonicalListing>> {
        let groups = self.groups.read().unwrap();

        let mut results: Vec<CanonicalListing> = groups
            .values()
            .map(|g| &g.members[g.rep])
            .filter(|rep| {
                if query.recommendable_only && !rep.is_recommendable {
                    return false;
                }
                if let Some(ref category) = query.category {
                    if !rep.category.eq_ignore_ascii_case(category) {
                        return false;
                    }
                }
                if let Some(age) = query.age {
                    if !rep.age.contains(age) {
                        return false;
                    }
                }
                true
            })
            .cloned()
            .collect();

        if let Some(filter) = query.near {
            results.retain(|rep| match self.venue_point(rep.venue_id) {
                Some(point) => filter.center.distance_km(&point) <= filter.radius_km,
                None => false,
            });
        }

        results.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(results)
    }

    async fn demote_source_listings(&self, source_id: SourceId) -> Result<usize> {
        let mut groups = self.groups.write().unwrap();
        let mut flipped = 0;
        for group in groups.values_mut() {
            for member in &mut group.members {
                if member.source_id == source_id && member.is_recommendable {
                    member.is_recommendable = false;
                    flipped += 1;
                }
            }
        }
        Ok(flipped)
    }
}

#[async_trait]
impl VenueStore for MemoryCatalog {
    async fn find_or_create_venue(&self, venue: Venue) -> Result<Venue> {
        let key = venue.normalized_address();

        if let Some(id) = self.venue_addresses.read().unwrap().get(&key).copied() {
            if let Some(stored) = self.venues.write().unwrap().get_mut(&id) {
                // Backfill coordinates resolved on a later run.
                if stored.point.is_none() && venue.point.is_some() {
                    stored.point = venue.point;
                    stored.cell = venue.cell.clone();
                }
                return Ok(stored.clone());
            }
        }

        self.venue_addresses
            .write()
            .unwrap()
            .insert(key, venue.id);
        self.venues.write().unwrap().insert(venue.id, venue.clone());
        Ok(venue)
    }

    async fn venue(&self, id: VenueId) -> Result<Option<Venue>> {
        Ok(self.venues.read().unwrap().get(&id).cloned())
    }
}

#[async_trait]
impl HealthStore for MemoryCatalog {
    async fn health(&self, source_id: SourceId) -> Result<Option<SourceHealthRecord>> {
        Ok(self.health.read().unwrap().get(&source_id).cloned())
    }

    async fn put_health(&self, record: SourceHealthRecord) -> Result<()> {
        self.health
            .write()
            .unwrap()
            .insert(record.source_id, record);
        Ok(())
    }
}

/// In-memory profile provider, seeded with `with_*` builders.
#[derive(Default)]
pub struct MemoryProfileStore {
    children: RwLock<HashMap<ChildId, ChildProfile>>,
    families: RwLock<HashMap<FamilyId, FamilyProfile>>,
}

impl MemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_child(self, child: ChildProfile) -> Self {
        self.children.write().unwrap().insert(child.id, child);
        self
    }

    pub fn with_family(self, family: FamilyProfile) -> Self {
        self.families.write().unwrap().insert(family.id, family);
        self
    }

    pub fn insert_child(&self, child: ChildProfile) {
        self.children.write().unwrap().insert(child.id, child);
    }

    pub fn insert_family(&self, family: FamilyProfile) {
        self.families.write().unwrap().insert(family.id, family);
    }
}

#[async_trait]
impl ProfileStore for MemoryProfileStore {
    async fn child(&self, id: ChildId) -> Result<Option<ChildProfile>> {
        Ok(self.children.read().unwrap().get(&id).cloned())
    }

    async fn family(&self, id: FamilyId) -> Result<Option<FamilyProfile>> {
        Ok(self.families.read().unwrap().get(&id).cloned())
    }

    async fn children_of(&self, family_id: FamilyId) -> Result<Vec<ChildProfile>> {
        let children = self.children.read().unwrap();
        let mut result: Vec<ChildProfile> = children
            .values()
            .filter(|c| c.family_id == family_id)
            .cloned()
            .collect();
        result.sort_by_key(|c| c.id);
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{
        AgeRange, BillingPeriod, Currency, GeoPoint, ListingAttributes, Price, Recurrence,
    };
    use crate::traits::GeoFilter;
    use chrono::{TimeZone, Utc, Weekday};

    async fn seeded_venue(catalog: &MemoryCatalog) -> Venue {
        let venue = Venue::new("123 Main St, Minneapolis")
            .with_point(GeoPoint::new(44.9778, -93.2650));
        catalog.find_or_create_venue(venue).await.unwrap()
    }

    fn listing(name: &str, venue_id: VenueId, source_id: SourceId) -> CanonicalListing {
        let anchor = Utc.with_ymd_and_hms(2025, 9, 6, 9, 0, 0).unwrap();
        let parts = FingerprintParts::new(name, anchor, "", "YMCA");
        CanonicalListing {
            id: ListingId::new(),
            name: name.to_string(),
            description: format!("{name} description"),
            category: "sports".to_string(),
            age: AgeRange::new(6, 10),
            schedule: Recurrence::weekly(vec![Weekday::Sat], anchor, 60),
            venue_id,
            price: Some(Price::new(5_000, Currency::Usd, BillingPeriod::PerMonth)),
            provider: "YMCA".to_string(),
            attributes: ListingAttributes::default(),
            canon_hash: parts.hash(),
            source_id,
            source_url: format!("https://example.org/{}", name.replace(' ', "-")),
            source_item_id: Some(name.to_string()),
            last_verified: anchor,
            is_recommendable: true,
        }
    }

    #[tokio::test]
    async fn test_upsert_create_then_update() {
        let catalog = MemoryCatalog::new();
        let venue = seeded_venue(&catalog).await;
        let source = SourceId::new();

        let first = listing("Karate Kids", venue.id, source);
        let outcome = catalog.upsert(first.clone()).await.unwrap();
        assert_eq!(outcome, UpsertOutcome::Created);

        let outcome = catalog.upsert(first).await.unwrap();
        assert_eq!(outcome, UpsertOutcome::Updated);
        assert_eq!(catalog.group_count(), 1);
        assert_eq!(catalog.listing_count(), 1);
    }

    #[tokio::test]
    async fn test_reingest_keeps_listing_id_stable() {
        let catalog = MemoryCatalog::new();
        let venue = seeded_venue(&catalog).await;
        let source = SourceId::new();

        let first = listing("Karate Kids", venue.id, source);
        let hash = first.canon_hash.clone();
        catalog.upsert(first).await.unwrap();
        let original = catalog.get_by_hash(&hash).await.unwrap().unwrap();

        let second = listing("Karate Kids", venue.id, source);
        catalog.upsert(second).await.unwrap();
        let after = catalog.get_by_hash(&hash).await.unwrap().unwrap();

        assert_eq!(original.id, after.id);
    }

    #[tokio::test]
    async fn test_near_duplicate_joins_existing_group() {
        let catalog = MemoryCatalog::new();
        let venue = seeded_venue(&catalog).await;

        let a = listing("Karate Kids", venue.id, SourceId::new());
        let mut b = listing("Karate Kidz", venue.id, SourceId::new());
        // Same event in both feeds, one with a typo'd name
        b.description = "short".to_string();

        catalog.upsert(a.clone()).await.unwrap();
        let outcome = catalog.upsert(b).await.unwrap();

        assert_eq!(outcome, UpsertOutcome::Updated);
        assert_eq!(catalog.group_count(), 1);
        assert_eq!(catalog.listing_count(), 2);

        // Longest description wins the representative slot
        let rep = catalog.get_by_hash(&a.canon_hash).await.unwrap().unwrap();
        assert_eq!(rep.name, "Karate Kids");
    }

    #[tokio::test]
    async fn test_query_returns_only_representatives() {
        let catalog = MemoryCatalog::new();
        let venue = seeded_venue(&catalog).await;

        catalog
            .upsert(listing("Karate Kids", venue.id, SourceId::new()))
            .await
            .unwrap();
        catalog
            .upsert(listing("Karate Kidz", venue.id, SourceId::new()))
            .await
            .unwrap();

        let results = catalog.query(&ListingQuery::recommendable()).await.unwrap();
        assert_eq!(results.len(), 1);
    }

    #[tokio::test]
    async fn test_query_filters() {
        let catalog = MemoryCatalog::new();
        let venue = seeded_venue(&catalog).await;

        let mut arts = listing("Pottery", venue.id, SourceId::new());
        arts.category = "arts".to_string();
        arts.age = AgeRange::new(10, 14);
        catalog.upsert(arts).await.unwrap();
        catalog
            .upsert(listing("Karate Kids", venue.id, SourceId::new()))
            .await
            .unwrap();

        let by_category = catalog
            .query(&ListingQuery {
                category: Some("arts".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(by_category.len(), 1);
        assert_eq!(by_category[0].name, "Pottery");

        let by_age = catalog
            .query(&ListingQuery {
                age: Some(7),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(by_age.len(), 1);
        assert_eq!(by_age[0].name, "Karate Kids");

        let nearby = catalog
            .query(&ListingQuery {
                near: Some(GeoFilter {
                    center: GeoPoint::new(44.9778, -93.2650),
                    radius_km: 1.0,
                }),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(nearby.len(), 2);

        let far = catalog
            .query(&ListingQuery {
                near: Some(GeoFilter {
                    center: GeoPoint::new(46.0, -96.0),
                    radius_km: 1.0,
                }),
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(far.is_empty());
    }

    #[tokio::test]
    async fn test_demote_source_listings() {
        let catalog = MemoryCatalog::new();
        let venue = seeded_venue(&catalog).await;
        let source = SourceId::new();

        catalog
            .upsert(listing("Karate Kids", venue.id, source))
            .await
            .unwrap();
        catalog
            .upsert(listing("Pottery", venue.id, source))
            .await
            .unwrap();

        let flipped = catalog.demote_source_listings(source).await.unwrap();
        assert_eq!(flipped, 2);

        let results = catalog.query(&ListingQuery::recommendable()).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_venue_dedup_by_address() {
        let catalog = MemoryCatalog::new();

        let first = catalog
            .find_or_create_venue(Venue::new("123 Main St"))
            .await
            .unwrap();
        let second = catalog
            .find_or_create_venue(
                Venue::new("123  MAIN ST").with_point(GeoPoint::new(44.9778, -93.2650)),
            )
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(catalog.venue_count(), 1);
        // Coordinates backfilled by the second sighting
        assert!(second.point.is_some());
    }

    #[tokio::test]
    async fn test_health_round_trip() {
        let catalog = MemoryCatalog::new();
        let source = SourceId::new();

        assert!(catalog.health(source).await.unwrap().is_none());

        let record = SourceHealthRecord::new(source);
        catalog.put_health(record.clone()).await.unwrap();
        assert_eq!(catalog.health(source).await.unwrap(), Some(record));
    }

    #[tokio::test]
    async fn test_profile_store_round_trip() {
        let family = FamilyProfile::builder()
            .id(FamilyId::new())
            .name("Larsen")
            .build();
        let child = ChildProfile::builder()
            .id(ChildId::new())
            .family_id(family.id)
            .name("Ada")
            .age(8)
            .build();

        let store = MemoryProfileStore::new()
            .with_family(family.clone())
            .with_child(child.clone());

        assert_eq!(store.family(family.id).await.unwrap(), Some(family.clone()));
        assert_eq!(store.child(child.id).await.unwrap(), Some(child));
        assert_eq!(store.children_of(family.id).await.unwrap().len(), 1);
    }
}
