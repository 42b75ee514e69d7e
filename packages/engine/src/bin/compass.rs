//! CLI for the activity engine
//!
//! One-shot runs against JSON fixture files: ingest configured sources,
//! print recommendations for a child, or solve a family plan. Output is
//! JSON for piping into other tools.
//!
//! Fixture formats:
//! - `--sources`: array of `SourceConfig`
//! - `--profiles`: `{ "families": [FamilyProfile], "children": [ChildProfile] }`
//! - `--geo`: array of `{ "fragment": "main st", "lat": 44.97, "lon": -93.26 }`;
//!   addresses are matched by case-insensitive fragment, standing in for a
//!   live geocoding service.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use uuid::Uuid;

use engine::fetch::FetcherExt;
use engine::testing::MockGeocoder;
use engine::{
    ChildId, ChildProfile, Engine, EngineConfig, FamilyId, FamilyProfile, GeoPoint, HttpFetcher,
    MemoryCatalog, MemoryProfileStore, PlanConstraints, SourceConfig,
};

#[derive(Parser)]
#[command(name = "compass")]
#[command(about = "Ingest activity feeds and plan enrollments")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest every source in the fixture file and print per-source reports
    Ingest {
        /// JSON file with the source configurations
        #[arg(long)]
        sources: PathBuf,
        /// JSON file with address fragment -> coordinates entries
        #[arg(long)]
        geo: Option<PathBuf>,
    },

    /// Print the three-tier recommendation set for one child
    Recommend {
        /// Child id (UUID) from the profiles fixture
        #[arg(long)]
        child: Uuid,
        /// JSON file with families and children
        #[arg(long)]
        profiles: PathBuf,
        /// JSON file with the source configurations to ingest first
        #[arg(long)]
        sources: Option<PathBuf>,
        /// JSON file with address fragment -> coordinates entries
        #[arg(long)]
        geo: Option<PathBuf>,
    },

    /// Solve a weekly plan for a family and print it
    Solve {
        /// Family id (UUID) from the profiles fixture
        #[arg(long)]
        family: Uuid,
        /// Child ids to plan for; defaults to every child of the family
        #[arg(long = "child")]
        children: Vec<Uuid>,
        /// JSON file with families and children
        #[arg(long)]
        profiles: PathBuf,
        /// JSON file with the source configurations to ingest first
        #[arg(long)]
        sources: Option<PathBuf>,
        /// JSON file with address fragment -> coordinates entries
        #[arg(long)]
        geo: Option<PathBuf>,
        /// Monthly budget override in cents
        #[arg(long)]
        budget_cents: Option<i64>,
        /// Travel radius override in kilometers
        #[arg(long)]
        radius_km: Option<f64>,
        /// Max activities per child
        #[arg(long)]
        cap: Option<usize>,
    },
}

#[derive(Deserialize, Default)]
struct ProfileFixture {
    #[serde(default)]
    families: Vec<FamilyProfile>,
    #[serde(default)]
    children: Vec<ChildProfile>,
}

#[derive(Deserialize)]
struct GeoFixtureEntry {
    fragment: String,
    lat: f64,
    lon: f64,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,engine=debug".into()),
        )
        .with_target(true)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Ingest { sources, geo } => cmd_ingest(&sources, geo.as_deref()).await,
        Commands::Recommend {
            child,
            profiles,
            sources,
            geo,
        } => cmd_recommend(child, &profiles, sources.as_deref(), geo.as_deref()).await,
        Commands::Solve {
            family,
            children,
            profiles,
            sources,
            geo,
            budget_cents,
            radius_km,
            cap,
        } => {
            cmd_solve(
                family,
                &children,
                &profiles,
                sources.as_deref(),
                geo.as_deref(),
                budget_cents,
                radius_km,
                cap,
            )
            .await
        }
    }
}

fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Failed to parse {}", path.display()))
}

fn build_engine(geo: Option<&Path>, profiles: MemoryProfileStore) -> Result<Engine> {
    let config = EngineConfig::from_env()?;

    let mut geocoder = MockGeocoder::new();
    if let Some(path) = geo {
        let entries: Vec<GeoFixtureEntry> = load_json(path)?;
        for entry in entries {
            geocoder = geocoder.with_point(entry.fragment, GeoPoint::new(entry.lat, entry.lon));
        }
    }

    let fetcher = HttpFetcher::new().polite(config.requests_per_second);

    Ok(Engine::new(
        Arc::new(MemoryCatalog::new()),
        Arc::new(profiles),
        Arc::new(fetcher),
        Arc::new(geocoder),
        config,
    ))
}

fn load_profiles(path: &Path) -> Result<MemoryProfileStore> {
    let fixture: ProfileFixture = load_json(path)?;
    let store = MemoryProfileStore::new();
    for family in fixture.families {
        store.insert_family(family);
    }
    for child in fixture.children {
        store.insert_child(child);
    }
    Ok(store)
}

async fn ingest_if_configured(engine: &Engine, sources: Option<&Path>) -> Result<()> {
    let Some(path) = sources else {
        return Ok(());
    };
    let sources: Vec<SourceConfig> = load_json(path)?;
    let reports = engine.run_ingestion_cycle(&sources).await;
    for report in &reports {
        tracing::info!(
            source = %report.source_name,
            status = ?report.status,
            created = report.items_created,
            "source ingested"
        );
    }
    Ok(())
}

fn output<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn cmd_ingest(sources: &Path, geo: Option<&Path>) -> Result<()> {
    let engine = build_engine(geo, MemoryProfileStore::new())?;
    let sources: Vec<SourceConfig> = load_json(sources)?;
    let reports = engine.run_ingestion_cycle(&sources).await;
    output(&reports)
}

async fn cmd_recommend(
    child: Uuid,
    profiles: &Path,
    sources: Option<&Path>,
    geo: Option<&Path>,
) -> Result<()> {
    let engine = build_engine(geo, load_profiles(profiles)?)?;
    ingest_if_configured(&engine, sources).await?;

    let set = engine.get_recommendations(ChildId(child)).await;
    output(&set)
}

#[allow(clippy::too_many_arguments)]
async fn cmd_solve(
    family: Uuid,
    children: &[Uuid],
    profiles: &Path,
    sources: Option<&Path>,
    geo: Option<&Path>,
    budget_cents: Option<i64>,
    radius_km: Option<f64>,
    cap: Option<usize>,
) -> Result<()> {
    let engine = build_engine(geo, load_profiles(profiles)?)?;
    ingest_if_configured(&engine, sources).await?;

    let mut constraints = PlanConstraints::default();
    if let Some(budget) = budget_cents {
        constraints.monthly_budget_cents = Some(budget);
    }
    constraints.travel_radius_km = radius_km;
    if let Some(cap) = cap {
        constraints.per_child_cap = cap;
    }

    let child_ids: Vec<ChildId> = children.iter().copied().map(ChildId).collect();
    let plan = engine.solve_plan(FamilyId(family), &child_ids, constraints).await;
    output(&plan)
}
