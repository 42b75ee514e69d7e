//! The ingestion pipeline, stage by stage: parse (see `crate::parsers`),
//! normalize, canonicalize/dedup, validate, and source-health bookkeeping.
//! `ingest` runs the whole cycle for a batch of sources.

pub mod canon;
pub mod health;
pub mod ingest;
pub mod normalize;
pub mod validate;

pub use canon::{choose_representative, is_near_duplicate, FingerprintParts};
pub use health::HealthPolicy;
pub use ingest::{ingest_source, run_ingestion_cycle};
pub use normalize::{normalize, NormalizedRecord};
pub use validate::{validate, ValidationContext};
