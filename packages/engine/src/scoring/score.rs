//! Per-(listing, child, family) scoring.
//!
//! Three weighted components: fit (how well the activity suits this child),
//! practical (whether the family can actually do it), and goals (whether it
//! advances what the child is working toward). Sub-scores are computed in
//! points on fixed budgets, converted to [0, 1] fractions per component,
//! then weighted 50/30/20 into the total.
//!
//! Missing data scores neutral, never zero: an unknown price or an
//! unstated temperament should not bury an otherwise strong candidate.

use crate::types::{
    intervals_overlap, AgeRange, CanonicalListing, ChildProfile, FamilyProfile, Level, Price,
    Recurrence, ScoredCandidate, SocialFormat, TimeWindow,
};

pub const WEIGHT_FIT: f64 = 0.5;
pub const WEIGHT_PRACTICAL: f64 = 0.3;
pub const WEIGHT_GOALS: f64 = 0.2;

pub const FIT_TOTAL: f64 = 50.0;
pub const PRACTICAL_TOTAL: f64 = 30.0;
pub const GOALS_TOTAL: f64 = 20.0;

/// Age band match scores this fraction when the child is within the buffer
/// rather than inside the range.
pub const AGE_BUFFER_YEARS: u8 = 2;
pub const AGE_BUFFER_FACTOR: f64 = 0.7;

const AGE_POINTS: f64 = 15.0;
const NEURO_POINTS: f64 = 5.0;
const COMMUTE_POINTS: f64 = 10.0;
const SCHEDULE_POINTS: f64 = 10.0;

/// Rank weights for the child's top three goals, most important first.
const GOAL_RANK_POINTS: [f64; 3] = [10.0, 6.0, 4.0];

/// A goal with no category alignment still earns this fraction of its rank
/// weight; holding the goal at all says something about the family.
const PARTIAL_GOAL_FACTOR: f64 = 0.3;

/// Fit sub-scores in points (out of 50).
#[derive(Debug, Clone, PartialEq)]
pub struct FitPoints {
    pub age: f64,
    pub intensity: f64,
    pub sensory: f64,
    pub social: f64,
    pub prerequisites: f64,
    pub neuro: f64,
}

impl FitPoints {
    pub fn total(&self) -> f64 {
        self.age + self.intensity + self.sensory + self.social + self.prerequisites + self.neuro
    }
}

/// Practical sub-scores in points (out of 30).
#[derive(Debug, Clone, PartialEq)]
pub struct PracticalPoints {
    pub commute: f64,
    pub schedule: f64,
    pub price: f64,
    pub scholarship: f64,
    pub transit: f64,
}

impl PracticalPoints {
    pub fn total(&self) -> f64 {
        self.commute + self.schedule + self.price + self.scholarship + self.transit
    }
}

/// Goal alignment in points (out of 20), one entry per ranked goal.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GoalsPoints {
    pub per_goal: Vec<(String, f64)>,
}

impl GoalsPoints {
    pub fn total(&self) -> f64 {
        self.per_goal.iter().map(|(_, points)| points).sum()
    }
}

/// Everything the scorer computed for one (listing, child, family) triple.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreBreakdown {
    pub fit: FitPoints,
    pub practical: PracticalPoints,
    pub goals: GoalsPoints,
    pub distance_km: Option<f64>,
}

impl ScoreBreakdown {
    pub fn fit_fraction(&self) -> f64 {
        (self.fit.total() / FIT_TOTAL).clamp(0.0, 1.0)
    }

    pub fn practical_fraction(&self) -> f64 {
        (self.practical.total() / PRACTICAL_TOTAL).clamp(0.0, 1.0)
    }

    pub fn goals_fraction(&self) -> f64 {
        (self.goals.total() / GOALS_TOTAL).clamp(0.0, 1.0)
    }

    /// The weighted total in [0, 1].
    pub fn total(&self) -> f64 {
        WEIGHT_FIT * self.fit_fraction()
            + WEIGHT_PRACTICAL * self.practical_fraction()
            + WEIGHT_GOALS * self.goals_fraction()
    }
}

/// A listing paired with its breakdown, the unit selection and planning
/// work over.
#[derive(Debug, Clone)]
pub struct ScoredListing {
    pub listing: CanonicalListing,
    pub breakdown: ScoreBreakdown,
}

impl ScoredListing {
    pub fn score(&self) -> f64 {
        self.breakdown.total()
    }

    /// Monthly cost for budget math; unknown prices count as zero here and
    /// are handled by the callers that care.
    pub fn monthly_cost_cents(&self) -> i64 {
        self.listing
            .price
            .map(|price| price.normalized_monthly_cents())
            .unwrap_or(0)
    }

    pub fn candidate(&self) -> ScoredCandidate {
        ScoredCandidate {
            listing: self.listing.clone(),
            score: self.breakdown.total(),
            fit: self.breakdown.fit_fraction(),
            practical: self.breakdown.practical_fraction(),
            goals: self.breakdown.goals_fraction(),
            distance_km: self.breakdown.distance_km,
        }
    }
}

/// Score one listing for one child.
///
/// `distance_km` is the straight-line home-to-venue distance when both
/// ends are geocoded; `None` scores neutral.
pub fn score_listing(
    listing: &CanonicalListing,
    child: &ChildProfile,
    family: &FamilyProfile,
    distance_km: Option<f64>,
) -> ScoreBreakdown {
    let attrs = &listing.attributes;

    let fit = FitPoints {
        age: score_age(&listing.age, child.age),
        intensity: score_intensity(child.intensity_preference, attrs.intensity),
        sensory: score_sensory(child.sensory_sensitivity, attrs.sensory_load),
        social: score_social(child.social_preference, attrs.social_format),
        prerequisites: score_prerequisites(&attrs.prerequisites, &child.skills),
        neuro: score_neuro(&child.neuro_flags, &attrs.neuro_accommodations),
    };

    let practical = PracticalPoints {
        commute: score_commute(distance_km, child.travel_radius_km),
        schedule: score_schedule(&listing.schedule, &child.windows, &child.commitments),
        price: score_price(listing.price.as_ref(), family.monthly_budget_cents),
        scholarship: score_scholarship(attrs.scholarship_available),
        transit: score_transit(family.prefers_transit, attrs.transit_accessible),
    };

    let goals = score_goals(&child.goals, &listing.category);

    ScoreBreakdown {
        fit,
        practical,
        goals,
        distance_km,
    }
}

/// Listing categories that advance a given goal.
pub fn goal_categories(goal: &str) -> &'static [&'static str] {
    match goal {
        "Build Confidence" => &["arts", "music", "theatre", "martial_arts"],
        "College Prep Skills" => &["stem", "academic", "robotics", "coding"],
        "Physical Fitness" => &["sports", "swimming", "dance", "martial_arts"],
        "Creative Expression" => &["arts", "music", "theatre", "crafts"],
        "Social Skills" => &["team_sports", "scouts", "group_activities"],
        "STEM Learning" => &["stem", "robotics", "coding", "science"],
        "Language Development" => &["language", "reading", "debate", "theatre"],
        "Cultural Connection" => &["cultural", "language", "music", "dance"],
        "Emotional Regulation" => &["mindfulness", "yoga", "martial_arts", "nature"],
        "Leadership" => &["scouts", "team_captain", "student_government"],
        _ => &[],
    }
}

fn score_age(age: &AgeRange, child_age: u8) -> f64 {
    if age.contains(child_age) {
        AGE_POINTS
    } else if age.contains_with_buffer(child_age, AGE_BUFFER_YEARS) {
        AGE_POINTS * AGE_BUFFER_FACTOR
    } else {
        0.0
    }
}

fn level_rank(level: Level) -> i8 {
    match level {
        Level::Low => 0,
        Level::Medium => 1,
        Level::High => 2,
    }
}

fn score_intensity(child: Option<Level>, listing: Option<Level>) -> f64 {
    let Some(child) = child else {
        return 5.0;
    };
    // Listings that say nothing are assumed moderate
    let listing = listing.unwrap_or(Level::Medium);
    match (level_rank(child) - level_rank(listing)).abs() {
        0 => 10.0,
        1 => 6.0,
        _ => 2.0,
    }
}

fn score_sensory(child: Option<Level>, load: Option<Level>) -> f64 {
    match (child, load) {
        (None, _) | (_, None) => 5.0,
        (Some(Level::High), Some(load)) => match load {
            Level::Low => 10.0,
            Level::Medium => 6.0,
            Level::High => 2.0,
        },
        (Some(Level::Medium), Some(_)) => 8.0,
        (Some(Level::Low), Some(_)) => 10.0,
    }
}

fn score_social(child: Option<SocialFormat>, listing: Option<SocialFormat>) -> f64 {
    let Some(child) = child else {
        return 2.5;
    };
    let listing = listing.unwrap_or(SocialFormat::Mixed);
    if child == listing {
        5.0
    } else {
        2.0
    }
}

fn score_prerequisites(prerequisites: &[String], skills: &[String]) -> f64 {
    let satisfied = prerequisites.iter().all(|requirement| {
        skills
            .iter()
            .any(|skill| skill.trim().eq_ignore_ascii_case(requirement.trim()))
    });
    if satisfied {
        5.0
    } else {
        0.0
    }
}

fn score_neuro(flags: &[String], accommodations: &[String]) -> f64 {
    if flags.is_empty() {
        return 0.0;
    }
    let matched = flags
        .iter()
        .filter(|flag| {
            accommodations
                .iter()
                .any(|a| a.trim().eq_ignore_ascii_case(flag.trim()))
        })
        .count();
    NEURO_POINTS * matched as f64 / flags.len() as f64
}

fn score_commute(distance_km: Option<f64>, radius_km: f64) -> f64 {
    let Some(distance) = distance_km else {
        return 5.0;
    };
    if radius_km <= 0.0 || distance >= radius_km {
        return 0.0;
    }
    COMMUTE_POINTS * (1.0 - distance / radius_km)
}

fn score_schedule(
    schedule: &Recurrence,
    windows: &[TimeWindow],
    commitments: &[Recurrence],
) -> f64 {
    // A family that listed no windows is assumed mostly flexible
    if windows.is_empty() {
        return 8.0;
    }
    if schedule.days.is_empty() {
        return 0.0;
    }

    let fitting = schedule
        .days
        .iter()
        .filter(|day| {
            let covered = windows
                .iter()
                .any(|w| w.covers(**day, schedule.start_minute, schedule.end_minute()));
            let clash = commitments.iter().any(|c| {
                c.days.contains(day)
                    && intervals_overlap(
                        schedule.start_minute,
                        schedule.end_minute(),
                        c.start_minute,
                        c.end_minute(),
                    )
            });
            covered && !clash
        })
        .count();

    SCHEDULE_POINTS * fitting as f64 / schedule.days.len() as f64
}

fn score_price(price: Option<&Price>, budget_cents: Option<i64>) -> f64 {
    let (Some(price), Some(budget)) = (price, budget_cents) else {
        // Unknown price or unstated budget is neutral
        return 3.0;
    };

    let monthly = price.normalized_monthly_cents() as f64;
    let budget = budget as f64;

    if monthly <= budget * 0.3 {
        5.0
    } else if monthly <= budget * 0.5 {
        3.0
    } else if monthly <= budget {
        2.0
    } else {
        0.0
    }
}

fn score_scholarship(available: bool) -> f64 {
    if available {
        2.5
    } else {
        0.0
    }
}

fn score_transit(prefers_transit: bool, accessible: bool) -> f64 {
    if !prefers_transit {
        return 2.0;
    }
    if accessible {
        2.5
    } else {
        0.0
    }
}

fn score_goals(goals: &[String], category: &str) -> GoalsPoints {
    let category = category.to_lowercase();
    let per_goal = goals
        .iter()
        .take(GOAL_RANK_POINTS.len())
        .enumerate()
        .map(|(rank, goal)| {
            let max = GOAL_RANK_POINTS[rank];
            let aligned = goal_categories(goal);
            let points = if aligned.iter().any(|target| category.contains(target)) {
                max
            } else {
                max * PARTIAL_GOAL_FACTOR
            };
            (goal.clone(), points)
        })
        .collect();
    GoalsPoints { per_goal }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{
        BillingPeriod, CanonHash, ChildId, Currency, FamilyId, ListingAttributes, ListingId,
        SourceId, VenueId,
    };
    use chrono::{TimeZone, Utc, Weekday};

    fn listing() -> CanonicalListing {
        let anchor = Utc.with_ymd_and_hms(2030, 9, 7, 9, 0, 0).unwrap();
        CanonicalListing {
            id: ListingId::new(),
            name: "Robotics Club".to_string(),
            description: "Weekly build sessions".to_string(),
            category: "robotics".to_string(),
            age: AgeRange::new(8, 12),
            schedule: Recurrence::weekly(vec![Weekday::Sat], anchor, 90),
            venue_id: VenueId::new(),
            price: Some(Price::new(2_000, Currency::Usd, BillingPeriod::PerMonth)),
            provider: "Library".to_string(),
            attributes: ListingAttributes {
                intensity: Some(Level::Medium),
                sensory_load: Some(Level::Low),
                social_format: Some(SocialFormat::Team),
                prerequisites: vec![],
                neuro_accommodations: vec!["adhd".to_string()],
                scholarship_available: false,
                transit_accessible: true,
            },
            canon_hash: CanonHash("0".repeat(64)),
            source_id: SourceId::new(),
            source_url: "https://library.example.org/robotics".to_string(),
            source_item_id: None,
            last_verified: Utc::now(),
            is_recommendable: true,
        }
    }

    fn child() -> ChildProfile {
        ChildProfile::builder()
            .id(ChildId::new())
            .family_id(FamilyId::new())
            .name("Ada")
            .age(10)
            .intensity_preference(Some(Level::Medium))
            .social_preference(Some(SocialFormat::Team))
            .goals(vec!["STEM Learning".to_string()])
            .windows(vec![TimeWindow::new(Weekday::Sat, 8 * 60, 12 * 60)])
            .build()
    }

    fn family() -> FamilyProfile {
        FamilyProfile::builder()
            .id(FamilyId::new())
            .name("Lovelace")
            .monthly_budget_cents(Some(10_000))
            .build()
    }

    #[test]
    fn test_strong_match_scores_high_and_bounded() {
        let breakdown = score_listing(&listing(), &child(), &family(), Some(1.0));
        assert!(breakdown.total() > 0.7, "got {}", breakdown.total());
        assert!(breakdown.total() <= 1.0);
        assert!(breakdown.fit_fraction() <= 1.0);
        assert!(breakdown.practical_fraction() <= 1.0);
        assert!(breakdown.goals_fraction() <= 1.0);
    }

    #[test]
    fn test_age_tiers() {
        let range = AgeRange::new(8, 12);
        assert_eq!(score_age(&range, 10), 15.0);
        // Buffer zone scores the 0.7 factor
        assert_eq!(score_age(&range, 13), 15.0 * 0.7);
        assert_eq!(score_age(&range, 6), 15.0 * 0.7);
        assert_eq!(score_age(&range, 5), 0.0);
        assert_eq!(score_age(&range, 15), 0.0);
    }

    #[test]
    fn test_intensity_match_levels() {
        assert_eq!(score_intensity(None, Some(Level::High)), 5.0);
        assert_eq!(score_intensity(Some(Level::Low), Some(Level::Low)), 10.0);
        assert_eq!(score_intensity(Some(Level::Low), Some(Level::Medium)), 6.0);
        assert_eq!(score_intensity(Some(Level::Low), Some(Level::High)), 2.0);
        // Unstated listing intensity is assumed moderate
        assert_eq!(score_intensity(Some(Level::Medium), None), 10.0);
    }

    #[test]
    fn test_sensory_sensitive_child() {
        assert_eq!(score_sensory(Some(Level::High), Some(Level::Low)), 10.0);
        assert_eq!(score_sensory(Some(Level::High), Some(Level::Medium)), 6.0);
        assert_eq!(score_sensory(Some(Level::High), Some(Level::High)), 2.0);
        assert_eq!(score_sensory(Some(Level::Medium), Some(Level::High)), 8.0);
        assert_eq!(score_sensory(Some(Level::Low), Some(Level::High)), 10.0);
        assert_eq!(score_sensory(None, Some(Level::High)), 5.0);
        assert_eq!(score_sensory(Some(Level::High), None), 5.0);
    }

    #[test]
    fn test_prerequisites_binary() {
        let skills = vec!["White Belt".to_string(), "swimming".to_string()];
        assert_eq!(score_prerequisites(&[], &skills), 5.0);
        assert_eq!(
            score_prerequisites(&["white belt".to_string()], &skills),
            5.0
        );
        assert_eq!(
            score_prerequisites(&["white belt".to_string(), "kata one".to_string()], &skills),
            0.0
        );
    }

    #[test]
    fn test_neuro_fraction() {
        let accommodations = vec!["ADHD".to_string(), "autism".to_string()];
        assert_eq!(score_neuro(&[], &accommodations), 0.0);
        assert_eq!(score_neuro(&["adhd".to_string()], &accommodations), 5.0);
        assert_eq!(
            score_neuro(
                &["adhd".to_string(), "dyslexia".to_string()],
                &accommodations
            ),
            2.5
        );
    }

    #[test]
    fn test_commute_linear_decay() {
        assert_eq!(score_commute(Some(0.0), 10.0), 10.0);
        assert_eq!(score_commute(Some(5.0), 10.0), 5.0);
        assert_eq!(score_commute(Some(10.0), 10.0), 0.0);
        assert_eq!(score_commute(Some(25.0), 10.0), 0.0);
        assert_eq!(score_commute(None, 10.0), 5.0);
    }

    #[test]
    fn test_schedule_window_fraction() {
        let anchor = Utc.with_ymd_and_hms(2030, 9, 7, 9, 0, 0).unwrap();
        let mut schedule = Recurrence::weekly(vec![Weekday::Sat, Weekday::Sun], anchor, 60);
        schedule.start_minute = 9 * 60;

        let sat_morning = TimeWindow::new(Weekday::Sat, 8 * 60, 12 * 60);
        assert_eq!(score_schedule(&schedule, &[], &[]), 8.0);
        assert_eq!(score_schedule(&schedule, &[sat_morning], &[]), 5.0);

        let sun_morning = TimeWindow::new(Weekday::Sun, 8 * 60, 12 * 60);
        assert_eq!(
            score_schedule(&schedule, &[sat_morning, sun_morning], &[]),
            10.0
        );

        // A Saturday commitment at the same hour knocks that day out
        let mut clash = Recurrence::weekly(vec![Weekday::Sat], anchor, 60);
        clash.start_minute = 9 * 60;
        assert_eq!(
            score_schedule(&schedule, &[sat_morning, sun_morning], &[clash]),
            5.0
        );
    }

    #[test]
    fn test_price_curve() {
        let budget = Some(10_000i64);
        let monthly =
            |cents: i64| Price::new(cents, Currency::Usd, BillingPeriod::PerMonth);

        assert_eq!(score_price(Some(&monthly(2_500)), budget), 5.0);
        assert_eq!(score_price(Some(&monthly(4_000)), budget), 3.0);
        assert_eq!(score_price(Some(&monthly(9_000)), budget), 2.0);
        assert_eq!(score_price(Some(&monthly(15_000)), budget), 0.0);
        assert_eq!(score_price(None, budget), 3.0);
        assert_eq!(score_price(Some(&monthly(4_000)), None), 3.0);
    }

    #[test]
    fn test_price_monotonic_as_price_drops() {
        let budget = Some(10_000i64);
        let prices = [20_000, 10_000, 5_000, 3_000, 1_000, 0];
        let mut last = -1.0;
        for cents in prices {
            let price = Price::new(cents, Currency::Usd, BillingPeriod::PerMonth);
            let score = score_price(Some(&price), budget);
            assert!(score >= last, "score dropped at {cents}");
            last = score;
        }
    }

    #[test]
    fn test_per_session_price_normalized_before_budget_check() {
        // $40/session is $160/month against a $100 budget
        let price = Price::new(4_000, Currency::Usd, BillingPeriod::PerSession);
        assert_eq!(score_price(Some(&price), Some(10_000)), 0.0);
    }

    #[test]
    fn test_transit_bonus_only_when_preferred() {
        assert_eq!(score_transit(true, true), 2.5);
        assert_eq!(score_transit(true, false), 0.0);
        assert_eq!(score_transit(false, true), 2.0);
        assert_eq!(score_transit(false, false), 2.0);
    }

    #[test]
    fn test_goal_rank_weights_and_partial_credit() {
        let goals = vec![
            "STEM Learning".to_string(),
            "Physical Fitness".to_string(),
            "Leadership".to_string(),
            "Build Confidence".to_string(),
        ];
        let points = score_goals(&goals, "robotics");

        // Top three only; the fourth goal is ignored
        assert_eq!(points.per_goal.len(), 3);
        assert_eq!(points.per_goal[0], ("STEM Learning".to_string(), 10.0));
        assert_eq!(points.per_goal[1], ("Physical Fitness".to_string(), 6.0 * 0.3));
        assert_eq!(points.per_goal[2], ("Leadership".to_string(), 4.0 * 0.3));

        assert_eq!(score_goals(&[], "robotics").total(), 0.0);
    }

    #[test]
    fn test_total_weighting() {
        let breakdown = ScoreBreakdown {
            fit: FitPoints {
                age: 15.0,
                intensity: 10.0,
                sensory: 10.0,
                social: 5.0,
                prerequisites: 5.0,
                neuro: 5.0,
            },
            practical: PracticalPoints {
                commute: 10.0,
                schedule: 10.0,
                price: 5.0,
                scholarship: 2.5,
                transit: 2.5,
            },
            goals: GoalsPoints {
                per_goal: vec![("STEM Learning".to_string(), 10.0)],
            },
            distance_km: None,
        };

        assert_eq!(breakdown.fit_fraction(), 1.0);
        assert_eq!(breakdown.practical_fraction(), 1.0);
        assert_eq!(breakdown.goals_fraction(), 0.5);
        assert!((breakdown.total() - (0.5 + 0.3 + 0.2 * 0.5)).abs() < 1e-9);
    }

    #[test]
    fn test_candidate_carries_fractions() {
        let scored = ScoredListing {
            listing: listing(),
            breakdown: score_listing(&listing(), &child(), &family(), Some(2.0)),
        };
        let candidate = scored.candidate();
        assert_eq!(candidate.score, scored.score());
        assert_eq!(candidate.distance_km, Some(2.0));
        assert_eq!(scored.monthly_cost_cents(), 2_000);
    }
}
