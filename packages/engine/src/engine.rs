//! The engine facade: ingestion, recommendations, and planning behind one
//! handle, wired to the supplied collaborators.
//!
//! Recommendation and solve requests always return a well-formed result.
//! Collaborator failures are logged and surface as an empty set or an
//! infeasible plan, never as an error past this boundary.

use std::sync::Arc;
use std::time::Instant;

use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::pipeline::ingest;
use crate::planner::{build_context, build_pool, diagnose, solve, PlanRequest};
use crate::scoring::select_slots;
use crate::traits::{Catalog, Fetcher, Geocoder, ProfileStore};
use crate::types::{
    ChildId, ChildProfile, FamilyId, PlanConstraints, RecommendationSet, SolverPlan, SourceConfig,
    SourceReport,
};

pub struct Engine {
    catalog: Arc<dyn Catalog>,
    profiles: Arc<dyn ProfileStore>,
    fetcher: Arc<dyn Fetcher>,
    geocoder: Arc<dyn Geocoder>,
    config: EngineConfig,
}

impl Engine {
    pub fn new(
        catalog: Arc<dyn Catalog>,
        profiles: Arc<dyn ProfileStore>,
        fetcher: Arc<dyn Fetcher>,
        geocoder: Arc<dyn Geocoder>,
        config: EngineConfig,
    ) -> Self {
        Self {
            catalog,
            profiles,
            fetcher,
            geocoder,
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Ingest every configured source once, with bounded parallelism.
    /// Returns one report per source in input order.
    pub async fn run_ingestion_cycle(&self, sources: &[SourceConfig]) -> Vec<SourceReport> {
        ingest::run_ingestion_cycle(
            sources,
            self.catalog.clone(),
            self.fetcher.clone(),
            self.geocoder.clone(),
            &self.config,
        )
        .await
    }

    /// The three-tier recommendation set for one child.
    ///
    /// Unknown children and store failures come back as an empty set.
    pub async fn get_recommendations(&self, child_id: ChildId) -> RecommendationSet {
        match self.recommendations_inner(child_id).await {
            Ok(set) => set,
            Err(error) => {
                tracing::warn!(
                    child_id = %child_id,
                    %error,
                    "recommendation request failed, returning an empty set"
                );
                RecommendationSet::empty(child_id)
            }
        }
    }

    async fn recommendations_inner(&self, child_id: ChildId) -> Result<RecommendationSet> {
        let child = self
            .profiles
            .child(child_id)
            .await?
            .ok_or_else(|| EngineError::NotFound {
                kind: "child",
                id: child_id.to_string(),
            })?;
        let family = self
            .profiles
            .family(child.family_id)
            .await?
            .ok_or_else(|| EngineError::NotFound {
                kind: "family",
                id: child.family_id.to_string(),
            })?;

        let pool = build_pool(self.catalog.as_ref(), &child, &family).await?;
        let set = select_slots(pool, &child, family.monthly_budget_cents);

        tracing::info!(
            child_id = %child_id,
            filled = set.filled_slots(),
            "recommendation set computed"
        );
        Ok(set)
    }

    /// Solve a multi-child plan. An empty `child_ids` means every child of
    /// the family.
    ///
    /// Unknown ids and store failures come back as an infeasible plan.
    pub async fn solve_plan(
        &self,
        family_id: FamilyId,
        child_ids: &[ChildId],
        constraints: PlanConstraints,
    ) -> SolverPlan {
        match self.solve_inner(family_id, child_ids, &constraints).await {
            Ok(plan) => plan,
            Err(error) => {
                tracing::warn!(
                    family_id = %family_id,
                    %error,
                    "solve request failed, reporting infeasible"
                );
                SolverPlan::infeasible()
            }
        }
    }

    async fn solve_inner(
        &self,
        family_id: FamilyId,
        child_ids: &[ChildId],
        constraints: &PlanConstraints,
    ) -> Result<SolverPlan> {
        let family = self
            .profiles
            .family(family_id)
            .await?
            .ok_or_else(|| EngineError::NotFound {
                kind: "family",
                id: family_id.to_string(),
            })?;

        let children: Vec<ChildProfile> = if child_ids.is_empty() {
            self.profiles.children_of(family_id).await?
        } else {
            let mut children = Vec::with_capacity(child_ids.len());
            for id in child_ids {
                let child = self
                    .profiles
                    .child(*id)
                    .await?
                    .filter(|c| c.family_id == family_id)
                    .ok_or_else(|| EngineError::NotFound {
                        kind: "child",
                        id: id.to_string(),
                    })?;
                children.push(child);
            }
            children
        };

        let mut contexts = Vec::with_capacity(children.len());
        for child in &children {
            contexts.push(
                build_context(
                    self.catalog.as_ref(),
                    child,
                    &family,
                    constraints.travel_radius_km,
                )
                .await?,
            );
        }

        let request = PlanRequest {
            children: contexts,
            per_child_cap: constraints.per_child_cap,
            budget_cents: constraints
                .monthly_budget_cents
                .or(family.monthly_budget_cents),
        };

        let deadline = Instant::now() + self.config.solver_time_budget();
        let mut plan = solve(&request, deadline);

        if plan.feasible {
            tracing::info!(
                family_id = %family_id,
                children = request.children.len(),
                total_score = plan.total_score,
                total_cost_cents = plan.total_monthly_cost_cents,
                "plan solved"
            );
        } else {
            plan.suggestions = diagnose(
                &request,
                self.catalog.as_ref(),
                &family,
                self.config.solver_time_budget(),
            )
            .await;
            tracing::info!(
                family_id = %family_id,
                children = request.children.len(),
                suggestions = plan.suggestions.len(),
                timed_out = plan.timed_out,
                "plan infeasible"
            );
        }

        Ok(plan)
    }
}
