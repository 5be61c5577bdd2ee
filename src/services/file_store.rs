//! Filesystem variant: one JSON document per coin per day.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use crate::error::StoreError;
use crate::models::snapshot::PriceSnapshot;

/// `<dir>/<YYYY-MM-DD>_<coin>.json`
pub fn snapshot_path(dir: &Path, coin_id: &str, date: NaiveDate) -> PathBuf {
    dir.join(format!("{}_{}.json", date.format("%Y-%m-%d"), coin_id))
}

/// Write the raw payload, creating `dir` first if needed. An existing file
/// for the same day is overwritten.
pub async fn write_snapshot(dir: &Path, snapshot: &PriceSnapshot) -> Result<PathBuf, StoreError> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|source| StoreError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

    let path = snapshot_path(dir, &snapshot.coin_id, snapshot.date);
    let body = serde_json::to_vec(&snapshot.raw_payload)?;

    tokio::fs::write(&path, body)
        .await
        .map_err(|source| StoreError::Io {
            path: path.clone(),
            source,
        })?;

    tracing::info!(
        coin_id = %snapshot.coin_id,
        date = %snapshot.date,
        path = %path.display(),
        "Stored response on filesystem"
    );

    Ok(path)
}
