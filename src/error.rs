//! Error taxonomy for the ingestion pipeline.
//!
//! Each stage returns its own error type so the driver can decide between
//! skipping a date and aborting the run.

use std::error::Error as StdError;
use std::path::PathBuf;

use chrono::NaiveDate;
use sea_orm::DbErr;
use thiserror::Error;

/// Invalid or missing invocation settings. Raised before any network or
/// storage activity.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no date given: pass --date or --start_date/--end_date")]
    MissingDate,

    #[error("--start_date was given without --end_date")]
    MissingEndDate,

    #[error("--end_date was given without --start_date")]
    MissingStartDate,

    #[error("--date cannot be combined with --start_date/--end_date")]
    ConflictingDateModes,

    #[error("invalid date '{value}', expected YYYY-MM-DD")]
    InvalidDate { value: String },

    #[error("end_date {end} is before start_date {start}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    #[error("database setting {name} is not set")]
    MissingDatabaseSetting { name: &'static str },

    #[error("database setting {name} has invalid value '{value}'")]
    InvalidDatabaseSetting { name: &'static str, value: String },
}

/// A single-day fetch from CoinGecko that did not yield a price.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("CoinGecko returned HTTP {status} for {url}")]
    Http { status: u16, url: String },

    #[error("malformed CoinGecko response from {url}: {detail}")]
    MalformedResponse { url: String, detail: String },

    #[error("request to {url} failed")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

impl FetchError {
    /// Stable classification used in logs and reports.
    pub fn reason(&self) -> &'static str {
        match self {
            FetchError::Http { .. } => "http",
            FetchError::MalformedResponse { .. } => "malformed-response",
            FetchError::Request { .. } => "request",
        }
    }

    pub fn url(&self) -> &str {
        match self {
            FetchError::Http { url, .. }
            | FetchError::MalformedResponse { url, .. }
            | FetchError::Request { url, .. } => url,
        }
    }
}

/// Persistence failure other than a benign duplicate insert.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error")]
    Database(#[from] DbErr),

    #[error("failed to write {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize snapshot")]
    Serialize(#[from] serde_json::Error),
}

impl StoreError {
    /// True when the store itself is unreachable. Such errors stop the run
    /// whatever the failure policy says.
    pub fn is_systemic(&self) -> bool {
        matches!(
            self,
            StoreError::Database(DbErr::Conn(_)) | StoreError::Database(DbErr::ConnectionAcquire(_))
        )
    }
}

/// Failure to ingest one date, carrying enough context to report it.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("fetching {coin_id} for {date} from {} failed", .source.url())]
    Fetch {
        coin_id: String,
        date: NaiveDate,
        #[source]
        source: FetchError,
    },

    #[error("storing {coin_id} for {date} failed")]
    Store {
        coin_id: String,
        date: NaiveDate,
        #[source]
        source: StoreError,
    },
}

impl IngestError {
    pub fn date(&self) -> NaiveDate {
        match self {
            IngestError::Fetch { date, .. } | IngestError::Store { date, .. } => *date,
        }
    }

    pub fn is_systemic(&self) -> bool {
        match self {
            IngestError::Fetch { .. } => false,
            IngestError::Store { source, .. } => source.is_systemic(),
        }
    }
}

/// Render an error and every source below it as `outer: inner: ...`.
pub fn chain_message(err: &(dyn StdError + 'static)) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(inner) = source {
        message.push_str(": ");
        message.push_str(&inner.to_string());
        source = inner.source();
    }
    message
}
