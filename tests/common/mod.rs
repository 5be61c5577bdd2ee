#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::NaiveDate;
use coin_history_ingest::error::FetchError;
use coin_history_ingest::jobs::ingestion::PriceSource;
use coin_history_ingest::models::snapshot::PriceSnapshot;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr};
use sea_orm_migration::MigratorTrait;
use std::env;

/// Set up test database connection
/// Uses TEST_DATABASE_URL environment variable or falls back to an in-memory SQLite database
pub async fn setup_test_db() -> Result<DatabaseConnection, DbErr> {
    let database_url =
        env::var("TEST_DATABASE_URL").unwrap_or_else(|_| "sqlite::memory:".to_string());

    // A single pooled connection keeps the in-memory database alive and shared
    let mut options = ConnectOptions::new(database_url);
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);

    let db = Database::connect(options).await?;
    migration::Migrator::up(&db, None).await?;

    Ok(db)
}

/// Remove every row for a coin, so tests can share a persistent database
pub async fn cleanup_coin(db: &DatabaseConnection, coin_id: &str) -> Result<(), DbErr> {
    db.execute_unprepared(&format!("DELETE FROM coin_raw WHERE coin_id = '{}'", coin_id))
        .await?;
    db.execute_unprepared(&format!(
        "DELETE FROM coin_aggregated WHERE coin_id = '{}'",
        coin_id
    ))
    .await?;
    Ok(())
}

pub fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn snapshot(coin_id: &str, date: NaiveDate, price: f64) -> PriceSnapshot {
    PriceSnapshot {
        coin_id: coin_id.to_string(),
        date,
        usd_price: price,
        raw_payload: serde_json::json!({
            "id": coin_id,
            "market_data": { "current_price": { "usd": price } }
        }),
    }
}

/// Serves canned prices; dates without a price answer like a CoinGecko 404
pub struct FakePriceSource {
    prices: HashMap<NaiveDate, f64>,
    calls: Mutex<Vec<NaiveDate>>,
}

impl FakePriceSource {
    pub fn new(prices: &[(NaiveDate, f64)]) -> Self {
        Self {
            prices: prices.iter().copied().collect(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<NaiveDate> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PriceSource for FakePriceSource {
    async fn fetch(&self, coin_id: &str, date: NaiveDate) -> Result<PriceSnapshot, FetchError> {
        self.calls.lock().unwrap().push(date);

        match self.prices.get(&date) {
            Some(price) => Ok(snapshot(coin_id, date, *price)),
            None => Err(FetchError::Http {
                status: 404,
                url: format!(
                    "http://fake/coins/{}/history?date={}",
                    coin_id,
                    date.format("%d-%m-%Y")
                ),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_setup_test_db() {
        let db = setup_test_db().await;
        assert!(db.is_ok(), "Test database connection should succeed");
    }
}
