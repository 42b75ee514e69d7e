//! Result objects returned by the recommendation and planning surfaces.
//!
//! These are always well-formed: empty slots and `feasible = false` are
//! ordinary values, not errors.

use serde::{Deserialize, Serialize};

use super::ids::{ChildId, ListingId};
use super::listing::ScoredCandidate;
use super::recurrence::TimeWindow;

/// Bucketed confidence shown with an explanation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceLabel {
    Excellent,
    Good,
    Moderate,
    Possible,
}

impl ConfidenceLabel {
    pub fn from_score(score: f64) -> Self {
        if score >= 0.8 {
            ConfidenceLabel::Excellent
        } else if score >= 0.6 {
            ConfidenceLabel::Good
        } else if score >= 0.4 {
            ConfidenceLabel::Moderate
        } else {
            ConfidenceLabel::Possible
        }
    }
}

/// Why a slot was filled, and what would change it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Explanation {
    /// Up to five reasons, strongest contributor first.
    pub reasons: Vec<String>,
    /// Up to three nearby constraint changes worth knowing about.
    pub tradeoffs: Vec<String>,
    pub confidence: f64,
    pub label: ConfidenceLabel,
}

/// One filled recommendation tier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationSlot {
    pub candidate: ScoredCandidate,
    pub explanation: Explanation,
}

/// The three-tier recommendation set for one child. A tier stays empty
/// rather than holding a poor match.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationSet {
    pub child_id: ChildId,
    pub primary: Option<RecommendationSlot>,
    pub budget_saver: Option<RecommendationSlot>,
    pub stretch: Option<RecommendationSlot>,
}

impl RecommendationSet {
    pub fn empty(child_id: ChildId) -> Self {
        Self {
            child_id,
            primary: None,
            budget_saver: None,
            stretch: None,
        }
    }

    pub fn filled_slots(&self) -> usize {
        [
            self.primary.is_some(),
            self.budget_saver.is_some(),
            self.stretch.is_some(),
        ]
        .iter()
        .filter(|f| **f)
        .count()
    }
}

/// One proposed loosening of a single constraint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Relaxation {
    IncreaseBudget { new_budget_cents: i64 },
    ExpandRadius { child_id: ChildId, new_radius_km: f64 },
    AddTimeWindow { child_id: ChildId, window: TimeWindow },
}

/// A relaxation shown to restore feasibility, with what it unlocks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelaxationSuggestion {
    #[serde(flatten)]
    pub relaxation: Relaxation,
    pub description: String,
    /// Listing names the probe solve newly assigned.
    pub enables: Vec<String>,
}

/// The listings assigned to one child, in score order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChildAssignment {
    pub child_id: ChildId,
    pub listing_ids: Vec<ListingId>,
    pub monthly_cost_cents: i64,
}

/// Outcome of one solve request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolverPlan {
    pub feasible: bool,
    /// One entry per requested child, input order, empty when infeasible.
    pub assignments: Vec<ChildAssignment>,
    pub total_monthly_cost_cents: i64,
    pub total_score: f64,
    /// Present only on infeasible plans, ordered by probe priority.
    pub suggestions: Vec<RelaxationSuggestion>,
    /// Telemetry only: infeasible-by-timeout rather than proven. Callers
    /// treat both identically.
    #[serde(skip)]
    pub timed_out: bool,
}

impl SolverPlan {
    pub fn infeasible() -> Self {
        Self {
            feasible: false,
            assignments: vec![],
            total_monthly_cost_cents: 0,
            total_score: 0.0,
            suggestions: vec![],
            timed_out: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confidence_label_buckets() {
        assert_eq!(ConfidenceLabel::from_score(0.95), ConfidenceLabel::Excellent);
        assert_eq!(ConfidenceLabel::from_score(0.8), ConfidenceLabel::Excellent);
        assert_eq!(ConfidenceLabel::from_score(0.79), ConfidenceLabel::Good);
        assert_eq!(ConfidenceLabel::from_score(0.6), ConfidenceLabel::Good);
        assert_eq!(ConfidenceLabel::from_score(0.59), ConfidenceLabel::Moderate);
        assert_eq!(ConfidenceLabel::from_score(0.4), ConfidenceLabel::Moderate);
        assert_eq!(ConfidenceLabel::from_score(0.39), ConfidenceLabel::Possible);
        assert_eq!(ConfidenceLabel::from_score(0.0), ConfidenceLabel::Possible);
    }

    #[test]
    fn test_empty_set_has_no_filled_slots() {
        let set = RecommendationSet::empty(ChildId::new());
        assert_eq!(set.filled_slots(), 0);
    }

    #[test]
    fn test_relaxation_serializes_tagged() {
        let suggestion = RelaxationSuggestion {
            relaxation: Relaxation::IncreaseBudget {
                new_budget_cents: 15_000,
            },
            description: "Raise the monthly budget to $150".to_string(),
            enables: vec!["Beginner Gymnastics".to_string()],
        };
        let json = serde_json::to_value(&suggestion).unwrap();
        assert_eq!(json["type"], "increase_budget");
        assert_eq!(json["new_budget_cents"], 15_000);
    }
}
