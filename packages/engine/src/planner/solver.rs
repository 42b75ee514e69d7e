//! Branch-and-bound assignment of scored candidates to children.
//!
//! One boolean decision per (child, candidate) pair. Hard constraints:
//! per-child cap, no overlapping selections or commitment clashes for a
//! child, total normalized monthly cost within the family budget, and at
//! least one assignment per requested child. Objective: maximize total
//! score, scaled to integer thousandths.
//!
//! Options are explored best-score-first with an optimistic remaining-score
//! bound, so the incumbent found early is already a good plan if the
//! deadline cuts the search short.

use std::time::Instant;

use crate::scoring::ScoredListing;
use crate::types::{ChildAssignment, ChildProfile, ListingId, Recurrence, SolverPlan};

use super::conflicts::{attendable, ConflictMatrix};

/// Scores are scaled by this factor to integers for the objective.
pub const SCORE_SCALE: f64 = 1000.0;

/// One child's solve inputs: profile (windows, commitments) plus the
/// scored candidate pool built for the effective travel radius.
#[derive(Debug, Clone)]
pub struct ChildContext {
    pub profile: ChildProfile,
    pub pool: Vec<ScoredListing>,
}

/// A full solve request. `budget_cents` is the effective monthly budget
/// after plan-constraint overrides.
#[derive(Debug, Clone)]
pub struct PlanRequest {
    pub children: Vec<ChildContext>,
    pub per_child_cap: usize,
    pub budget_cents: Option<i64>,
}

/// One selectable (child, listing) pairing after hard eligibility.
#[derive(Debug, Clone)]
struct PlanOption {
    child: usize,
    listing_id: ListingId,
    schedule: Recurrence,
    cost_cents: i64,
    score_milli: i64,
}

/// Solve an assignment request against a hard wall-clock deadline.
///
/// Past the deadline the best plan found so far is returned; with none
/// found the result is infeasible with `timed_out` set.
pub fn solve(request: &PlanRequest, deadline: Instant) -> SolverPlan {
    let mut options: Vec<PlanOption> = Vec::new();
    for (child, ctx) in request.children.iter().enumerate() {
        for scored in &ctx.pool {
            if !attendable(
                &scored.listing.schedule,
                &ctx.profile.windows,
                &ctx.profile.commitments,
            ) {
                continue;
            }
            options.push(PlanOption {
                child,
                listing_id: scored.listing.id,
                schedule: scored.listing.schedule.clone(),
                cost_cents: scored.monthly_cost_cents(),
                score_milli: (scored.score() * SCORE_SCALE).round() as i64,
            });
        }
    }

    // A child with nothing attendable can never be served, so the whole
    // request is infeasible before any search.
    let all_children_have_options =
        (0..request.children.len()).all(|c| options.iter().any(|o| o.child == c));
    if !all_children_have_options {
        return SolverPlan::infeasible();
    }

    options.sort_by(|a, b| {
        b.score_milli
            .cmp(&a.score_milli)
            .then(a.listing_id.cmp(&b.listing_id))
    });

    let schedules: Vec<(usize, &Recurrence)> =
        options.iter().map(|o| (o.child, &o.schedule)).collect();
    let conflicts = ConflictMatrix::build(&schedules);

    // suffix[i] = total score of options[i..], the optimistic bound.
    let mut suffix = vec![0i64; options.len() + 1];
    for i in (0..options.len()).rev() {
        suffix[i] = suffix[i + 1] + options[i].score_milli;
    }

    // Last option index per child, for dead-branch pruning.
    let mut last_index = vec![0usize; request.children.len()];
    for (i, option) in options.iter().enumerate() {
        last_index[option.child] = i;
    }

    let mut search = Search {
        options: &options,
        conflicts: &conflicts,
        suffix: &suffix,
        last_index: &last_index,
        cap: request.per_child_cap,
        budget: request.budget_cents,
        deadline,
        timed_out: false,
        best: None,
        chosen: Vec::new(),
        counts: vec![0; request.children.len()],
        cost: 0,
        score: 0,
    };
    search.dfs(0);

    let timed_out = search.timed_out;
    let Some((score_milli, chosen)) = search.best else {
        let mut plan = SolverPlan::infeasible();
        plan.timed_out = timed_out;
        return plan;
    };

    // Chosen indices are in descending score order already, so each
    // child's listing ids come out best first.
    let mut assignments: Vec<ChildAssignment> = request
        .children
        .iter()
        .map(|ctx| ChildAssignment {
            child_id: ctx.profile.id,
            listing_ids: vec![],
            monthly_cost_cents: 0,
        })
        .collect();

    let mut total_cost = 0i64;
    for &i in &chosen {
        let option = &options[i];
        assignments[option.child].listing_ids.push(option.listing_id);
        assignments[option.child].monthly_cost_cents += option.cost_cents;
        total_cost += option.cost_cents;
    }

    SolverPlan {
        feasible: true,
        assignments,
        total_monthly_cost_cents: total_cost,
        total_score: score_milli as f64 / SCORE_SCALE,
        suggestions: vec![],
        timed_out,
    }
}

struct Search<'a> {
    options: &'a [PlanOption],
    conflicts: &'a ConflictMatrix,
    suffix: &'a [i64],
    last_index: &'a [usize],
    cap: usize,
    budget: Option<i64>,
    deadline: Instant,
    timed_out: bool,
    /// Best complete assignment so far: (score, chosen option indices).
    best: Option<(i64, Vec<usize>)>,
    chosen: Vec<usize>,
    counts: Vec<usize>,
    cost: i64,
    score: i64,
}

impl Search<'_> {
    fn dfs(&mut self, i: usize) {
        if self.timed_out {
            return;
        }
        if Instant::now() >= self.deadline {
            self.timed_out = true;
            return;
        }

        // A still-empty child with no options left below can never be
        // served on this branch.
        let dead = self
            .counts
            .iter()
            .enumerate()
            .any(|(c, &n)| n == 0 && self.last_index[c] < i);
        if dead {
            return;
        }

        // Optimistic bound: taking every remaining option cannot beat the
        // incumbent. Ties keep the first-found plan, so the result is
        // deterministic.
        if let Some((best_score, _)) = self.best {
            if self.score + self.suffix[i] <= best_score {
                return;
            }
        }

        if i == self.options.len() {
            self.best = Some((self.score, self.chosen.clone()));
            return;
        }

        let option = &self.options[i];
        let over_cap = self.counts[option.child] >= self.cap;
        let over_budget = self
            .budget
            .map(|b| self.cost + option.cost_cents > b)
            .unwrap_or(false);
        let clashes = self.chosen.iter().any(|&j| self.conflicts.conflicts(i, j));

        if !over_cap && !over_budget && !clashes {
            self.chosen.push(i);
            self.counts[option.child] += 1;
            self.cost += option.cost_cents;
            self.score += option.score_milli;
            self.dfs(i + 1);
            self.score -= option.score_milli;
            self.cost -= option.cost_cents;
            self.counts[option.child] -= 1;
            self.chosen.pop();
        }

        self.dfs(i + 1);
    }
}
