//! Probes single-constraint relaxations after an infeasible solve.
//!
//! Each probe loosens exactly one constraint, re-solves, and reports the
//! first success per probe type: at most one budget suggestion, one radius
//! suggestion per child, one window suggestion per child. Steps run
//! smallest first, so a reported relaxation is the cheapest of its kind
//! that works. Combinations are never searched.

use std::time::{Duration, Instant};

use chrono::Weekday;

use crate::traits::Catalog;
use crate::types::{
    format_minute, intervals_overlap, FamilyProfile, Relaxation, RelaxationSuggestion, SolverPlan,
    TimeWindow,
};

use super::pool::build_context;
use super::solver::{solve, PlanRequest};

/// Budget probe increments in cents, smallest first.
pub const BUDGET_STEPS_CENTS: [i64; 3] = [2_500, 5_000, 10_000];

/// Radius probe increments in kilometers, smallest first.
pub const RADIUS_STEPS_KM: [f64; 2] = [2.0, 5.0];

/// Weekend-morning probe window, minutes since midnight.
pub const WINDOW_MORNING: (u16, u16) = (9 * 60, 12 * 60);

/// Weekday-evening probe window, minutes since midnight.
pub const WINDOW_EVENING: (u16, u16) = (17 * 60, 19 * 60);

/// Search for the smallest single-constraint relaxations that restore
/// feasibility. Call only after an infeasible solve; each probe gets its
/// own `probe_budget` deadline.
pub async fn diagnose(
    request: &PlanRequest,
    catalog: &dyn Catalog,
    family: &FamilyProfile,
    probe_budget: Duration,
) -> Vec<RelaxationSuggestion> {
    let mut suggestions = Vec::new();

    if let Some(budget) = request.budget_cents {
        for step in BUDGET_STEPS_CENTS {
            let new_budget = budget + step;
            let mut probe = request.clone();
            probe.budget_cents = Some(new_budget);

            let plan = solve(&probe, Instant::now() + probe_budget);
            if plan.feasible {
                suggestions.push(RelaxationSuggestion {
                    relaxation: Relaxation::IncreaseBudget {
                        new_budget_cents: new_budget,
                    },
                    description: format!(
                        "Raise the monthly budget to {}",
                        format_dollars(new_budget)
                    ),
                    enables: enabled_names(&plan, &probe),
                });
                break;
            }
        }
    }

    for (index, ctx) in request.children.iter().enumerate() {
        for step in RADIUS_STEPS_KM {
            let new_radius = ctx.profile.travel_radius_km + step;
            let rebuilt =
                match build_context(catalog, &ctx.profile, family, Some(new_radius)).await {
                    Ok(rebuilt) => rebuilt,
                    Err(error) => {
                        tracing::warn!(
                            child_id = %ctx.profile.id,
                            %error,
                            "radius probe could not re-query the catalog"
                        );
                        break;
                    }
                };

            let mut probe = request.clone();
            probe.children[index] = rebuilt;

            let plan = solve(&probe, Instant::now() + probe_budget);
            if plan.feasible {
                suggestions.push(RelaxationSuggestion {
                    relaxation: Relaxation::ExpandRadius {
                        child_id: ctx.profile.id,
                        new_radius_km: new_radius,
                    },
                    description: format!(
                        "Expand {}'s travel radius to {} km",
                        ctx.profile.name, new_radius
                    ),
                    enables: enabled_names(&plan, &probe),
                });
                break;
            }
        }
    }

    for (index, ctx) in request.children.iter().enumerate() {
        // A child with no declared windows is already fully flexible;
        // adding one would restrict, not relax.
        if ctx.profile.windows.is_empty() {
            continue;
        }
        for window in probe_windows() {
            let already_open = ctx.profile.windows.iter().any(|w| {
                w.day == window.day
                    && intervals_overlap(
                        w.start_minute,
                        w.end_minute,
                        window.start_minute,
                        window.end_minute,
                    )
            });
            if already_open {
                continue;
            }

            let mut probe = request.clone();
            probe.children[index].profile.windows.push(window);

            let plan = solve(&probe, Instant::now() + probe_budget);
            if plan.feasible {
                suggestions.push(RelaxationSuggestion {
                    relaxation: Relaxation::AddTimeWindow {
                        child_id: ctx.profile.id,
                        window,
                    },
                    description: format!(
                        "Open {} {}-{} for {}",
                        day_name(window.day),
                        format_minute(window.start_minute),
                        format_minute(window.end_minute),
                        ctx.profile.name
                    ),
                    enables: enabled_names(&plan, &probe),
                });
                break;
            }
        }
    }

    suggestions
}

/// Popular windows in probe order: weekend mornings, then weekday
/// evenings.
fn probe_windows() -> Vec<TimeWindow> {
    let mut windows = vec![
        TimeWindow::new(Weekday::Sat, WINDOW_MORNING.0, WINDOW_MORNING.1),
        TimeWindow::new(Weekday::Sun, WINDOW_MORNING.0, WINDOW_MORNING.1),
    ];
    for day in [
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
    ] {
        windows.push(TimeWindow::new(day, WINDOW_EVENING.0, WINDOW_EVENING.1));
    }
    windows
}

/// Names of the listings the probe solve assigned, in request child order.
fn enabled_names(plan: &SolverPlan, request: &PlanRequest) -> Vec<String> {
    let mut names = Vec::new();
    for assignment in &plan.assignments {
        for listing_id in &assignment.listing_ids {
            let name = request
                .children
                .iter()
                .flat_map(|c| c.pool.iter())
                .find(|s| s.listing.id == *listing_id)
                .map(|s| s.listing.name.clone());
            if let Some(name) = name {
                if !names.contains(&name) {
                    names.push(name);
                }
            }
        }
    }
    names
}

fn format_dollars(cents: i64) -> String {
    if cents % 100 == 0 {
        format!("${}", cents / 100)
    } else {
        format!("${}.{:02}", cents / 100, cents % 100)
    }
}

fn day_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::score::{FitPoints, GoalsPoints, PracticalPoints, ScoreBreakdown};
    use crate::scoring::ScoredListing;
    use crate::stores::MemoryCatalog;
    use crate::traits::{ListingStore, VenueStore};
    use crate::types::{
        AgeRange, BillingPeriod, CanonHash, CanonicalListing, ChildId, Currency, FamilyId,
        GeoPoint, ListingAttributes, ListingId, Price, Recurrence, SourceId, Venue, VenueId,
    };
    use crate::planner::solver::ChildContext;
    use crate::types::ChildProfile;
    use chrono::{TimeZone, Utc};

    const HOME: GeoPoint = GeoPoint {
        lat: 44.9778,
        lon: -93.2650,
    };

    fn schedule(day: Weekday, start_minute: u16) -> Recurrence {
        let anchor = Utc.with_ymd_and_hms(2030, 9, 2, 9, 0, 0).unwrap();
        let mut rec = Recurrence::weekly(vec![day], anchor, 60);
        rec.start_minute = start_minute;
        rec
    }

    fn candidate(name: &str, monthly_cents: Option<i64>, meets: Recurrence) -> ScoredListing {
        let listing = CanonicalListing {
            id: ListingId::new(),
            name: name.to_string(),
            description: String::new(),
            category: "sports".to_string(),
            age: AgeRange::new(6, 12),
            schedule: meets,
            venue_id: VenueId::new(),
            price: monthly_cents
                .map(|cents| Price::new(cents, Currency::Usd, BillingPeriod::PerMonth)),
            provider: "Provider".to_string(),
            attributes: ListingAttributes::default(),
            canon_hash: CanonHash("0".repeat(64)),
            source_id: SourceId::new(),
            source_url: "https://example.org".to_string(),
            source_item_id: None,
            last_verified: Utc::now(),
            is_recommendable: true,
        };
        let breakdown = ScoreBreakdown {
            fit: FitPoints {
                age: 40.0,
                intensity: 0.0,
                sensory: 0.0,
                social: 0.0,
                prerequisites: 0.0,
                neuro: 0.0,
            },
            practical: PracticalPoints {
                commute: 24.0,
                schedule: 0.0,
                price: 0.0,
                scholarship: 0.0,
                transit: 0.0,
            },
            goals: GoalsPoints::default(),
            distance_km: None,
        };
        ScoredListing { listing, breakdown }
    }

    fn child_named(name: &str) -> ChildProfile {
        ChildProfile::builder()
            .id(ChildId::new())
            .family_id(FamilyId::new())
            .name(name)
            .age(9)
            .build()
    }

    fn family() -> FamilyProfile {
        FamilyProfile::builder()
            .id(FamilyId::new())
            .name("Larsen")
            .home(Some(HOME))
            .build()
    }

    fn probe_budget() -> Duration {
        Duration::from_secs(1)
    }

    #[tokio::test]
    async fn test_budget_probe_reports_cheapest_working_step() {
        let pool = vec![candidate(
            "Gymnastics",
            Some(15_000),
            schedule(Weekday::Sat, 9 * 60),
        )];
        let request = PlanRequest {
            children: vec![ChildContext {
                profile: child_named("Maya"),
                pool,
            }],
            per_child_cap: 1,
            budget_cents: Some(10_000),
        };

        let catalog = MemoryCatalog::new();
        let suggestions = diagnose(&request, &catalog, &family(), probe_budget()).await;

        assert_eq!(suggestions.len(), 1);
        assert_eq!(
            suggestions[0].relaxation,
            Relaxation::IncreaseBudget {
                new_budget_cents: 15_000
            }
        );
        assert_eq!(
            suggestions[0].description,
            "Raise the monthly budget to $150"
        );
        assert_eq!(suggestions[0].enables, vec!["Gymnastics"]);
    }

    #[tokio::test]
    async fn test_no_probe_helps_returns_no_suggestions() {
        let request = PlanRequest {
            children: vec![ChildContext {
                profile: child_named("Maya"),
                pool: vec![],
            }],
            per_child_cap: 1,
            budget_cents: Some(10_000),
        };

        let catalog = MemoryCatalog::new();
        let suggestions = diagnose(&request, &catalog, &family(), probe_budget()).await;
        assert!(suggestions.is_empty());
    }

    #[tokio::test]
    async fn test_radius_probe_requeries_the_catalog() {
        let catalog = MemoryCatalog::new();

        // A venue roughly 11 km from home, just past the 10 km radius
        let venue = catalog
            .find_or_create_venue(
                Venue::new("500 Lake Rd").with_point(GeoPoint::new(44.9778, -93.1250)),
            )
            .await
            .unwrap();
        let anchor = Utc.with_ymd_and_hms(2030, 9, 7, 9, 0, 0).unwrap();
        let listing = CanonicalListing {
            id: ListingId::new(),
            name: "Lakeside Swim".to_string(),
            description: String::new(),
            category: "swimming".to_string(),
            age: AgeRange::new(6, 12),
            schedule: Recurrence::weekly(vec![Weekday::Sat], anchor, 60),
            venue_id: venue.id,
            price: Some(Price::new(4_000, Currency::Usd, BillingPeriod::PerMonth)),
            provider: "City".to_string(),
            attributes: ListingAttributes::default(),
            canon_hash: CanonHash("1".repeat(64)),
            source_id: SourceId::new(),
            source_url: "https://example.org/swim".to_string(),
            source_item_id: None,
            last_verified: anchor,
            is_recommendable: true,
        };
        catalog.upsert(listing).await.unwrap();

        let child = child_named("Maya");
        let child_id = child.id;
        let request = PlanRequest {
            children: vec![ChildContext {
                profile: child,
                pool: vec![],
            }],
            per_child_cap: 1,
            budget_cents: None,
        };

        let suggestions = diagnose(&request, &catalog, &family(), probe_budget()).await;

        assert_eq!(suggestions.len(), 1);
        assert_eq!(
            suggestions[0].relaxation,
            Relaxation::ExpandRadius {
                child_id,
                new_radius_km: 12.0
            }
        );
        assert_eq!(
            suggestions[0].description,
            "Expand Maya's travel radius to 12 km"
        );
        assert_eq!(suggestions[0].enables, vec!["Lakeside Swim"]);
    }

    #[tokio::test]
    async fn test_window_probe_skips_open_windows() {
        let mut child = child_named("Ada");
        child.windows = vec![TimeWindow::new(Weekday::Sat, 9 * 60, 12 * 60)];
        let child_id = child.id;

        let pool = vec![candidate(
            "Wed Theatre",
            Some(3_000),
            schedule(Weekday::Wed, 17 * 60 + 30),
        )];
        let request = PlanRequest {
            children: vec![ChildContext {
                profile: child,
                pool,
            }],
            per_child_cap: 1,
            budget_cents: None,
        };

        let catalog = MemoryCatalog::new();
        let suggestions = diagnose(&request, &catalog, &family(), probe_budget()).await;

        // The Saturday morning probe is skipped as already open; Sunday,
        // Monday, and Tuesday don't free the Wednesday session.
        assert_eq!(suggestions.len(), 1);
        assert_eq!(
            suggestions[0].relaxation,
            Relaxation::AddTimeWindow {
                child_id,
                window: TimeWindow::new(Weekday::Wed, 17 * 60, 19 * 60)
            }
        );
        assert_eq!(
            suggestions[0].description,
            "Open Wednesday 17:00-19:00 for Ada"
        );
        assert_eq!(suggestions[0].enables, vec!["Wed Theatre"]);
    }
}
