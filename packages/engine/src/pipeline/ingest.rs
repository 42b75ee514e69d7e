//! The ingestion cycle: fetch, parse, normalize, validate, upsert, and
//! health bookkeeping for a batch of sources.
//!
//! Sources run with bounded parallelism. A fault in one source lands in
//! that source's report and its health record; it never aborts the cycle.

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use tokio::sync::Semaphore;
use tracing::{info, warn};

use crate::config::EngineConfig;
use crate::error::Result;
use crate::fetch::{fetch_with_retry, FetcherExt};
use crate::parsers;
use crate::pipeline::health::HealthPolicy;
use crate::pipeline::normalize::normalize;
use crate::pipeline::validate::{validate, ValidationContext, CHECK_SOURCE_URL};
use crate::traits::{Catalog, Fetcher, Geocoder, UpsertOutcome};
use crate::types::{SourceConfig, SourceHealthRecord, SourceReport, SourceStatus};

/// Ingest a batch of sources. Reports come back in input order.
pub async fn run_ingestion_cycle(
    sources: &[SourceConfig],
    catalog: Arc<dyn Catalog>,
    fetcher: Arc<dyn Fetcher>,
    geocoder: Arc<dyn Geocoder>,
    config: &EngineConfig,
) -> Vec<SourceReport> {
    info!(sources = sources.len(), "Starting ingestion cycle");

    let semaphore = Arc::new(Semaphore::new(config.max_concurrent_sources.max(1)));
    // One shared limiter, so two sources on the same host share its quota.
    let polite = Arc::new(fetcher.polite(config.requests_per_second));

    let mut handles = Vec::with_capacity(sources.len());
    for source in sources.iter().cloned() {
        let sem = Arc::clone(&semaphore);
        let catalog = Arc::clone(&catalog);
        let polite = Arc::clone(&polite);
        let geocoder = Arc::clone(&geocoder);
        let config = config.clone();

        handles.push(tokio::spawn(async move {
            let _permit = sem.acquire().await.unwrap();
            ingest_source(
                &source,
                catalog.as_ref(),
                polite.as_ref(),
                geocoder.as_ref(),
                &config,
            )
            .await
        }));
    }

    let mut reports = Vec::with_capacity(handles.len());
    for (handle, source) in handles.into_iter().zip(sources) {
        match handle.await {
            Ok(report) => reports.push(report),
            Err(error) => {
                tracing::error!(error = %error, source = %source.name, "Ingestion task panicked");
                reports.push(SourceReport::failed(
                    source.id,
                    &source.name,
                    format!("task failure: {error}"),
                ));
            }
        }
    }

    info!(sources = reports.len(), "Ingestion cycle complete");
    reports
}

/// Run one source end to end and fold the outcome into its health record.
/// Never fails; failures land in the report.
pub async fn ingest_source(
    source: &SourceConfig,
    catalog: &dyn Catalog,
    fetcher: &dyn Fetcher,
    geocoder: &dyn Geocoder,
    config: &EngineConfig,
) -> SourceReport {
    let started = Instant::now();
    let now = Utc::now();
    let policy = config.health_policy();

    let mut report =
        match ingest_source_inner(source, catalog, fetcher, geocoder, config, now).await {
            Ok(report) => report,
            Err(error) => {
                warn!(error = %error, source = %source.name, "Source run failed");
                SourceReport::failed(source.id, &source.name, error.to_string())
            }
        };

    report.status = apply_health(
        catalog,
        source,
        &policy,
        report.pass_rate,
        report.broken_link_rate,
        now,
    )
    .await;
    report.duration_ms = started.elapsed().as_millis() as u64;

    info!(
        source = %source.name,
        items_found = report.items_found,
        items_created = report.items_created,
        items_updated = report.items_updated,
        items_flagged = report.items_flagged,
        items_skipped = report.items_skipped,
        pass_rate = report.pass_rate,
        duration_ms = report.duration_ms,
        "Source ingestion complete"
    );

    report
}

async fn ingest_source_inner(
    source: &SourceConfig,
    catalog: &dyn Catalog,
    fetcher: &dyn Fetcher,
    geocoder: &dyn Geocoder,
    config: &EngineConfig,
    now: DateTime<Utc>,
) -> Result<SourceReport> {
    let body = fetch_with_retry(
        fetcher,
        &source.url,
        config.fetch_timeout(),
        config.max_retries,
        config.retry_backoff(),
    )
    .await?;

    let outcome = parsers::parse(&body, source)?;
    let items_found = outcome.records.len() + outcome.skipped;
    let mut items_skipped = outcome.skipped;
    let mut items_created = 0;
    let mut items_updated = 0;
    let mut items_flagged = 0;
    let mut broken_links = 0;
    let mut pass_rates = Vec::with_capacity(outcome.records.len());

    for raw in &outcome.records {
        let Some(record) = normalize(raw, source, geocoder, catalog, now).await? else {
            items_skipped += 1;
            continue;
        };

        let ctx = ValidationContext {
            now,
            source_reachable: true,
            venue_geocoded: record.venue_geocoded,
            price_malformed: record.price_malformed,
        };
        let result = validate(&record.listing, &ctx);
        if result.failing.iter().any(|name| name == CHECK_SOURCE_URL) {
            broken_links += 1;
        }
        pass_rates.push(result.pass_rate);

        let mut listing = record.listing;
        listing.is_recommendable = result.is_recommendable();
        if !listing.is_recommendable {
            items_flagged += 1;
            tracing::debug!(
                source = %source.name,
                listing = %listing.name,
                failing = ?result.failing,
                "Listing flagged non-recommendable"
            );
        }

        match catalog.upsert(listing).await? {
            UpsertOutcome::Created => items_created += 1,
            UpsertOutcome::Updated => items_updated += 1,
        }
    }

    let validated = pass_rates.len();
    // A run that produced nothing carries no evidence of badness.
    let pass_rate = if validated == 0 {
        1.0
    } else {
        pass_rates.iter().sum::<f64>() / validated as f64
    };
    let broken_link_rate = if validated == 0 {
        0.0
    } else {
        broken_links as f64 / validated as f64
    };

    Ok(SourceReport {
        source_id: source.id,
        source_name: source.name.clone(),
        items_found,
        items_created,
        items_updated,
        items_flagged,
        items_skipped,
        pass_rate,
        broken_link_rate,
        status: SourceStatus::Healthy,
        duration_ms: 0,
        error: None,
    })
}

/// Fold the run's quality numbers into the source's health record, acting
/// on a demotion. Store failures are logged, never fatal.
async fn apply_health(
    catalog: &dyn Catalog,
    source: &SourceConfig,
    policy: &HealthPolicy,
    pass_rate: f64,
    broken_link_rate: f64,
    now: DateTime<Utc>,
) -> SourceStatus {
    let previous = match catalog.health(source.id).await {
        Ok(record) => record.unwrap_or_else(|| SourceHealthRecord::new(source.id)),
        Err(error) => {
            tracing::error!(error = %error, source = %source.name, "Failed to load source health");
            SourceHealthRecord::new(source.id)
        }
    };

    let was_demoted = previous.status == SourceStatus::Demoted;
    let next = policy.apply_run(&previous, pass_rate, broken_link_rate, now);

    if next.status == SourceStatus::Demoted {
        if !was_demoted {
            warn!(
                source = %source.name,
                consecutive_bad_runs = next.consecutive_bad_runs,
                "Source demoted after consecutive bad runs"
            );
        }
        match catalog.demote_source_listings(source.id).await {
            Ok(flipped) if flipped > 0 => {
                info!(source = %source.name, listings = flipped, "Source listings excluded from recommendations");
            }
            Ok(_) => {}
            Err(error) => {
                tracing::error!(error = %error, source = %source.name, "Failed to demote source listings");
            }
        }
    }

    let status = next.status;
    if let Err(error) = catalog.put_health(next).await {
        tracing::error!(error = %error, source = %source.name, "Failed to persist source health");
    }
    status
}
