//! Turns a score breakdown into parent-facing prose.
//!
//! Reasons fire when a sub-score clears its threshold, in a fixed order,
//! so the same breakdown always yields the same explanation. Thresholds
//! are on the sub-score point scales, not the [0, 1] fractions.

use crate::types::{ChildProfile, ConfidenceLabel, Explanation, Level, SocialFormat};

use super::score::ScoreBreakdown;

pub const MAX_REASONS: usize = 5;
pub const MAX_TRADEOFFS: usize = 3;

const AGE_REASON_THRESHOLD: f64 = 12.0;
const INTENSITY_REASON_THRESHOLD: f64 = 8.0;
const SENSORY_REASON_THRESHOLD: f64 = 8.0;
const SOCIAL_REASON_THRESHOLD: f64 = 4.0;
const GOAL_REASON_THRESHOLD: f64 = 7.0;

const COMMUTE_CAUTION_THRESHOLD: f64 = 7.0;
const SCHEDULE_CAUTION_THRESHOLD: f64 = 7.0;
const PRICE_CAUTION_THRESHOLD: f64 = 3.0;

/// Build the explanation shown alongside a recommended listing.
pub fn explain(breakdown: &ScoreBreakdown, child: &ChildProfile) -> Explanation {
    let mut reasons = Vec::new();

    if breakdown.fit.age >= AGE_REASON_THRESHOLD {
        reasons.push(format!("Perfect age match ({} years old)", child.age));
    }
    if breakdown.fit.intensity >= INTENSITY_REASON_THRESHOLD {
        // The threshold is only reachable when the preference is stated
        if let Some(pref) = child.intensity_preference {
            reasons.push(format!(
                "Matches their {}-energy temperament",
                level_word(pref)
            ));
        }
    }
    if breakdown.fit.sensory >= SENSORY_REASON_THRESHOLD {
        reasons.push("Comfortable sensory environment".to_string());
    }
    if breakdown.fit.social >= SOCIAL_REASON_THRESHOLD {
        if let Some(pref) = child.social_preference {
            reasons.push(format!(
                "Works well with their {} preference",
                social_word(pref)
            ));
        }
    }
    if let Some((goal, _)) = breakdown
        .goals
        .per_goal
        .iter()
        .find(|(_, points)| *points >= GOAL_REASON_THRESHOLD)
    {
        reasons.push(format!("Directly supports '{goal}' goal"));
    }
    reasons.truncate(MAX_REASONS);

    let mut tradeoffs = Vec::new();
    if breakdown.practical.commute < COMMUTE_CAUTION_THRESHOLD {
        tradeoffs.push("May require longer travel time".to_string());
    }
    if breakdown.practical.schedule < SCHEDULE_CAUTION_THRESHOLD {
        tradeoffs.push("Check schedule compatibility carefully".to_string());
    }
    if breakdown.practical.price < PRICE_CAUTION_THRESHOLD {
        tradeoffs.push("Higher cost - consider if it fits your budget".to_string());
    }
    tradeoffs.truncate(MAX_TRADEOFFS);

    let confidence = breakdown.total();
    Explanation {
        reasons,
        tradeoffs,
        confidence,
        label: ConfidenceLabel::from_score(confidence),
    }
}

fn level_word(level: Level) -> &'static str {
    match level {
        Level::Low => "low",
        Level::Medium => "medium",
        Level::High => "high",
    }
}

fn social_word(format: SocialFormat) -> &'static str {
    match format {
        SocialFormat::Team => "team",
        SocialFormat::Solo => "solo",
        SocialFormat::Mixed => "mixed",
    }
}
