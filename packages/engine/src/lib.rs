//! Children's Activity Discovery Engine
//!
//! Ingests activity listings from heterogeneous public feeds, canonicalizes
//! them into a deduplicated catalog, and plans enrollments: per-child scored
//! recommendations and multi-child weekly schedules under a family budget.
//!
//! # Design Philosophy
//!
//! **"Messy feeds in, defensible plans out"**
//!
//! - Parse leniently, validate strictly
//! - Dedup by fingerprint, merge by completeness
//! - Score transparently: every number has a named component
//! - Degrade, never throw: a failing source or store yields an empty
//!   set or an infeasible plan, not an error at the API boundary
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use engine::{Engine, EngineConfig, HttpFetcher, MemoryCatalog, MemoryProfileStore};
//! use engine::testing::MockGeocoder;
//!
//! let engine = Engine::new(
//!     Arc::new(MemoryCatalog::new()),
//!     Arc::new(MemoryProfileStore::new()),
//!     Arc::new(HttpFetcher::new(&config)),
//!     Arc::new(MockGeocoder::new()),
//!     config,
//! );
//!
//! // Ingest every configured source once
//! let reports = engine.run_ingestion_cycle(&sources).await;
//!
//! // Three-tier recommendations for one child
//! let set = engine.get_recommendations(child_id).await;
//!
//! // A weekly plan for the whole family
//! let plan = engine.solve_plan(family_id, &[], PlanConstraints::default()).await;
//! ```
//!
//! # Modules
//!
//! - [`traits`] - Collaborator seams (Catalog, Fetcher, Geocoder, ProfileStore)
//! - [`types`] - Core data types (listings, profiles, plans, money, recurrence)
//! - [`parsers`] - Feed format parsers (ICS, RSS, JSON API, HTML table)
//! - [`fetch`] - HTTP fetching with politeness and retry
//! - [`pipeline`] - Ingestion stages: normalize, canonicalize, validate, health
//! - [`scoring`] - Child/listing fit scoring, explanations, slot selection
//! - [`planner`] - Multi-child constraint solver and infeasibility diagnosis
//! - [`stores`] - Storage implementations (MemoryCatalog, MemoryProfileStore)
//! - [`testing`] - Mock implementations for testing

pub mod config;
pub mod engine;
pub mod error;
pub mod fetch;
pub mod parsers;
pub mod pipeline;
pub mod planner;
pub mod scoring;
pub mod stores;
pub mod testing;
pub mod traits;
pub mod types;

// Re-export the facade and its configuration at crate root
pub use config::EngineConfig;
pub use engine::Engine;
pub use error::{EngineError, FetchError, FetchResult, Result};

// Re-export collaborator traits
pub use traits::{
    Catalog, Fetcher, GeoFilter, Geocoder, HealthStore, ListingQuery, ListingStore, ProfileStore,
    UpsertOutcome, VenueStore,
};

// Re-export core types
pub use types::{
    AgeRange, BillingPeriod, CanonHash, CanonicalListing, ChildAssignment, ChildId, ChildProfile,
    ConfidenceLabel, Currency, Explanation, FamilyId, FamilyProfile, GeoPoint, Level,
    ListingAttributes, ListingId, PlanConstraints, Price, RawListing, RecommendationSet,
    RecommendationSlot, Recurrence, Relaxation, RelaxationSuggestion, ScoredCandidate,
    SocialFormat, SolverPlan, SourceConfig, SourceFormat, SourceId, SourceOptions, SourceReport,
    SourceStatus, TimeWindow, Venue, VenueId,
};

// Re-export pipeline components
pub use pipeline::{
    // Full cycle and single source
    ingest_source, run_ingestion_cycle,
    // Canonicalization
    choose_representative, is_near_duplicate, FingerprintParts,
    // Normalization and validation
    normalize, validate, NormalizedRecord, ValidationContext,
    // Source health
    HealthPolicy,
};

// Re-export scoring and planning entry points
pub use planner::{build_context, build_pool, diagnose, solve, ChildContext, PlanRequest};
pub use scoring::{explain, goal_categories, score_listing, select_slots, ScoreBreakdown, ScoredListing};

// Re-export fetchers
pub use fetch::{HttpFetcher, PoliteFetcher};

// Re-export stores
pub use stores::{MemoryCatalog, MemoryProfileStore};
