//! Core data types shared across the pipeline and the planning engine.

pub mod geo;
pub mod ids;
pub mod listing;
pub mod money;
pub mod plan;
pub mod profile;
pub mod recurrence;
pub mod report;
pub mod source;
pub mod venue;

pub use geo::{encode_geohash, GeoPoint, GEO_CELL_PRECISION};
pub use ids::{ChildId, FamilyId, ListingId, SourceId, VenueId};
pub use listing::{
    AgeRange, CanonHash, CanonicalListing, Level, ListingAttributes, RawListing, ScoredCandidate,
    SocialFormat,
};
pub use money::{BillingPeriod, Currency, Price};
pub use plan::{
    ChildAssignment, ConfidenceLabel, Explanation, RecommendationSet, RecommendationSlot,
    Relaxation, RelaxationSuggestion, SolverPlan,
};
pub use profile::{ChildProfile, FamilyProfile, PlanConstraints, DEFAULT_PER_CHILD_CAP};
pub use recurrence::{
    day_abbrev, format_minute, intervals_overlap, parse_day_abbrev, Recurrence, TimeWindow,
};
pub use report::{
    CheckResult, SourceHealthRecord, SourceReport, SourceStatus, ValidationResult,
};
pub use source::{SourceConfig, SourceFormat, SourceOptions};
pub use venue::{normalize_address, Venue};
