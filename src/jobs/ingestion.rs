//! Day-by-day ingestion: fetch, store raw, refresh the month aggregate.
//!
//! Dates are processed one at a time in ascending order. Each date is fully
//! committed before the next request goes out.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use sea_orm::DatabaseConnection;
use serde::Serialize;

use crate::error::{chain_message, FetchError, IngestError, StoreError};
use crate::models::date_range::DateRange;
use crate::models::snapshot::PriceSnapshot;
use crate::services::aggregate_store;
use crate::services::file_store;
use crate::services::raw_store::{self, RawInsert};

/// Where one day's price comes from.
#[async_trait]
pub trait PriceSource: Send + Sync {
    async fn fetch(&self, coin_id: &str, date: NaiveDate) -> Result<PriceSnapshot, FetchError>;
}

/// Where fetched snapshots go.
#[derive(Debug, Clone)]
pub enum Sink {
    /// `coin_raw` rows plus the `coin_aggregated` monthly summary
    Database(DatabaseConnection),
    /// One JSON file per day, no aggregate
    Filesystem(PathBuf),
}

/// What to do when a date fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum FailurePolicy {
    /// Stop at the first failing date
    #[default]
    Abort,
    /// Record the failure and move on to the next date
    Skip,
}

#[derive(Debug, Clone)]
pub struct IngestOptions {
    pub coin_id: String,
    pub range: DateRange,
    pub policy: FailurePolicy,
    /// Replace raw rows that already exist instead of keeping them
    pub force: bool,
    /// Pause between consecutive dates
    pub request_delay: Duration,
}

impl IngestOptions {
    pub fn new(coin_id: impl Into<String>, range: DateRange) -> Self {
        Self {
            coin_id: coin_id.into(),
            range,
            policy: FailurePolicy::default(),
            force: false,
            request_delay: Duration::ZERO,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DateFailure {
    pub date: NaiveDate,
    pub message: String,
}

/// Per-run counters and the dates that failed.
#[derive(Debug, Default, Clone, Serialize)]
pub struct IngestReport {
    pub dates: usize,
    pub inserted: usize,
    pub already_present: usize,
    pub replaced: usize,
    pub files_written: usize,
    pub months_refreshed: usize,
    pub failures: Vec<DateFailure>,
}

impl IngestReport {
    pub fn succeeded(&self) -> usize {
        self.dates - self.failures.len()
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Run the pipeline for every date in `options.range`.
///
/// Under [`FailurePolicy::Abort`] the first failing date ends the run with
/// an error. Under [`FailurePolicy::Skip`] failures are listed in the report
/// instead, except for store errors that mean the database is unreachable.
pub async fn run_ingestion<S>(
    source: &S,
    sink: &Sink,
    options: &IngestOptions,
) -> Result<IngestReport, IngestError>
where
    S: PriceSource + ?Sized,
{
    let total = options.range.len();
    let mut report = IngestReport::default();

    tracing::info!(
        coin_id = %options.coin_id,
        start = %options.range.start(),
        end = %options.range.end(),
        "Starting ingestion of {} day(s) for {}",
        total,
        options.coin_id
    );

    for (index, date) in options.range.days().enumerate() {
        if index > 0 && !options.request_delay.is_zero() {
            tokio::time::sleep(options.request_delay).await;
        }

        tracing::debug!("[{}/{}] Processing {} {}", index + 1, total, options.coin_id, date);
        report.dates += 1;

        match ingest_date(source, sink, options, date, &mut report).await {
            Ok(()) => {}
            Err(e) if options.policy == FailurePolicy::Skip && !e.is_systemic() => {
                let message = chain_message(&e);
                tracing::warn!(coin_id = %options.coin_id, %date, "Skipping date: {}", message);
                report.failures.push(DateFailure { date, message });
            }
            Err(e) => {
                tracing::error!(
                    coin_id = %options.coin_id,
                    %date,
                    "Aborting run: {}",
                    chain_message(&e)
                );
                return Err(e);
            }
        }
    }

    tracing::info!(
        "Ingestion complete for {}: {} dates | inserted: {} | already present: {} | replaced: {} | files: {} | months refreshed: {} | failed: {}",
        options.coin_id,
        report.dates,
        report.inserted,
        report.already_present,
        report.replaced,
        report.files_written,
        report.months_refreshed,
        report.failures.len()
    );

    Ok(report)
}

async fn ingest_date<S>(
    source: &S,
    sink: &Sink,
    options: &IngestOptions,
    date: NaiveDate,
    report: &mut IngestReport,
) -> Result<(), IngestError>
where
    S: PriceSource + ?Sized,
{
    let coin_id = options.coin_id.as_str();

    let snapshot = source
        .fetch(coin_id, date)
        .await
        .map_err(|source| IngestError::Fetch {
            coin_id: coin_id.to_string(),
            date,
            source,
        })?;

    let store_err = |source: StoreError| IngestError::Store {
        coin_id: coin_id.to_string(),
        date,
        source,
    };

    match sink {
        Sink::Database(db) => {
            let outcome = if options.force {
                raw_store::replace(db, &snapshot).await
            } else {
                raw_store::insert_if_absent(db, &snapshot).await
            }
            .map_err(store_err)?;

            match outcome {
                RawInsert::Inserted => report.inserted += 1,
                RawInsert::AlreadyExists => report.already_present += 1,
                RawInsert::Replaced => report.replaced += 1,
            }

            // Runs for every outcome, AlreadyExists included
            aggregate_store::refresh_month(db, coin_id, snapshot.year_month())
                .await
                .map_err(store_err)?;
            report.months_refreshed += 1;
        }
        Sink::Filesystem(dir) => {
            file_store::write_snapshot(dir, &snapshot)
                .await
                .map_err(store_err)?;
            report.files_written += 1;
        }
    }

    Ok(())
}
