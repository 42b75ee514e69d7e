//! Fills the three recommendation tiers from a scored candidate list.
//!
//! Primary is the straight top scorer. Budget-saver is the cheapest of the
//! top scoring pool, stretch is the best listing priced past the family's
//! budget. A tier is left empty rather than repeating a listing or holding
//! a pick that does not earn its label.

use crate::types::{ChildProfile, ListingId, RecommendationSet, RecommendationSlot};

use super::explain::explain;
use super::score::ScoredListing;

/// Budget-saver is drawn from this top fraction of candidates by score,
/// rounded up, so a thin catalog still has a one-candidate pool.
pub const TOP_POOL_FRACTION: f64 = 0.2;

/// Stretch picks must cost more than this multiple of the monthly budget.
pub const STRETCH_BUDGET_FACTOR: f64 = 1.2;

/// Pick the three tiers for one child.
///
/// `budget_cents` is the effective monthly budget; without one there is
/// nothing to save against, so the stretch tier falls back to the runner-up.
pub fn select_slots(
    mut candidates: Vec<ScoredListing>,
    child: &ChildProfile,
    budget_cents: Option<i64>,
) -> RecommendationSet {
    candidates.sort_by(|a, b| b.score().total_cmp(&a.score()));

    let Some(top) = candidates.first() else {
        return RecommendationSet::empty(child.id);
    };
    let primary_id = top.listing.id;
    let primary = Some(slot(top, child));

    let pool_len = ((candidates.len() as f64) * TOP_POOL_FRACTION).ceil() as usize;
    let budget_saver = candidates[..pool_len.min(candidates.len())]
        .iter()
        .filter(|c| c.listing.price.is_some())
        .min_by(|a, b| {
            a.monthly_cost_cents()
                .cmp(&b.monthly_cost_cents())
                .then_with(|| b.score().total_cmp(&a.score()))
        })
        // The top pick being cheapest too means there is nothing to save
        .filter(|c| c.listing.id != primary_id);

    let mut used: Vec<ListingId> = vec![primary_id];
    if let Some(saver) = budget_saver {
        used.push(saver.listing.id);
    }

    let stretch = budget_cents
        .and_then(|budget| {
            let threshold = budget as f64 * STRETCH_BUDGET_FACTOR;
            candidates
                .iter()
                .filter(|c| !used.contains(&c.listing.id))
                .filter(|c| {
                    c.listing
                        .price
                        .map(|p| p.normalized_monthly_cents() as f64 > threshold)
                        .unwrap_or(false)
                })
                .max_by(|a, b| a.score().total_cmp(&b.score()))
        })
        .or_else(|| {
            candidates
                .get(1)
                .filter(|c| !used.contains(&c.listing.id))
        });

    RecommendationSet {
        child_id: child.id,
        primary,
        budget_saver: budget_saver.map(|c| slot(c, child)),
        stretch: stretch.map(|c| slot(c, child)),
    }
}

fn slot(scored: &ScoredListing, child: &ChildProfile) -> RecommendationSlot {
    RecommendationSlot {
        candidate: scored.candidate(),
        explanation: explain(&scored.breakdown, child),
    }
}
