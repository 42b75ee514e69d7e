use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

use super::geo::GeoPoint;
use super::ids::{ChildId, FamilyId};
use super::listing::{Level, SocialFormat};
use super::recurrence::{Recurrence, TimeWindow};

/// Default per-child activity cap when a plan request does not set one.
pub const DEFAULT_PER_CHILD_CAP: usize = 2;

/// One child's profile as supplied by the profile collaborator.
///
/// Goals are ranked, most important first. `commitments` are imported
/// external calendar blocks the planner must schedule around.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TypedBuilder)]
pub struct ChildProfile {
    pub id: ChildId,
    pub family_id: FamilyId,
    #[builder(setter(into))]
    pub name: String,
    pub age: u8,
    #[builder(default)]
    pub intensity_preference: Option<Level>,
    /// How sensitive the child is to noisy, busy settings. High
    /// sensitivity wants low sensory-load listings.
    #[builder(default)]
    pub sensory_sensitivity: Option<Level>,
    #[builder(default)]
    pub social_preference: Option<SocialFormat>,
    /// Skills and completed levels, matched against listing prerequisites.
    #[builder(default)]
    pub skills: Vec<String>,
    #[builder(default)]
    pub neuro_flags: Vec<String>,
    #[builder(default)]
    pub goals: Vec<String>,
    #[builder(default = 10.0)]
    pub travel_radius_km: f64,
    #[builder(default)]
    pub windows: Vec<TimeWindow>,
    #[builder(default)]
    pub commitments: Vec<Recurrence>,
}

/// Shared family-level constraints and preferences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TypedBuilder)]
pub struct FamilyProfile {
    pub id: FamilyId,
    #[builder(setter(into))]
    pub name: String,
    #[builder(default)]
    pub monthly_budget_cents: Option<i64>,
    #[builder(default)]
    pub prefers_transit: bool,
    #[builder(default)]
    pub home: Option<GeoPoint>,
}

/// Caller-supplied knobs for one solve request. Unset fields fall back to
/// the family profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TypedBuilder)]
pub struct PlanConstraints {
    #[builder(default = DEFAULT_PER_CHILD_CAP)]
    pub per_child_cap: usize,
    /// Overrides the family's monthly budget when set.
    #[builder(default)]
    pub monthly_budget_cents: Option<i64>,
    /// Overrides every child's travel radius when set.
    #[builder(default)]
    pub travel_radius_km: Option<f64>,
}

impl Default for PlanConstraints {
    fn default() -> Self {
        Self {
            per_child_cap: DEFAULT_PER_CHILD_CAP,
            monthly_budget_cents: None,
            travel_radius_km: None,
        }
    }
}
