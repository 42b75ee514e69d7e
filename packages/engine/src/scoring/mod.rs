//! Scoring and recommendation selection.
//!
//! `score` computes the weighted fit/practical/goals breakdown for one
//! (listing, child, family) triple, `explain` renders it as parent-facing
//! prose, and `select` fills the primary / budget-saver / stretch tiers.

pub mod explain;
pub mod score;
pub mod select;

pub use explain::explain;
pub use score::{goal_categories, score_listing, ScoreBreakdown, ScoredListing};
pub use select::select_slots;
