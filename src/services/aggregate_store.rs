//! Monthly min/max summary in `coin_aggregated`, always recomputed from the
//! rows in `coin_raw`.
//!
//! `refresh_month` is the only code that writes the aggregate table.

use chrono::NaiveDate;
use sea_orm::{
    ActiveValue::Set, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    FromQueryResult, QueryFilter, QuerySelect, TransactionTrait,
};
use serde::Serialize;

use crate::entities::{coin_aggregated, coin_raw, prelude::*};
use crate::error::StoreError;
use crate::models::snapshot::{month_start, next_month};

/// Price extremes of one coin over one calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MonthlyPriceRange {
    pub year_month: NaiveDate,
    pub max_price: f64,
    pub min_price: f64,
}

impl From<coin_aggregated::Model> for MonthlyPriceRange {
    fn from(model: coin_aggregated::Model) -> Self {
        Self {
            year_month: model.year_month,
            max_price: model.max_price,
            min_price: model.min_price,
        }
    }
}

#[derive(Debug, FromQueryResult)]
struct PriceBounds {
    max_price: Option<f64>,
    min_price: Option<f64>,
}

/// Rebuild the `(coin_id, month)` aggregate from raw data.
///
/// Delete, scan and insert share one transaction. If the month has no raw
/// rows the key is left absent and `None` is returned. `year_month` may be
/// any day of the month.
pub async fn refresh_month(
    db: &DatabaseConnection,
    coin_id: &str,
    year_month: NaiveDate,
) -> Result<Option<MonthlyPriceRange>, StoreError> {
    let month = month_start(year_month);
    let following_month = next_month(month);

    tracing::info!(
        coin_id,
        year_month = %month,
        "Upserting {} data for {} on coin_aggregated table",
        coin_id,
        month
    );

    let txn = db.begin().await?;

    CoinAggregated::delete_many()
        .filter(coin_aggregated::Column::CoinId.eq(coin_id))
        .filter(coin_aggregated::Column::YearMonth.eq(month))
        .exec(&txn)
        .await?;

    let bounds = CoinRaw::find()
        .select_only()
        .column_as(coin_raw::Column::Price.max(), "max_price")
        .column_as(coin_raw::Column::Price.min(), "min_price")
        .filter(coin_raw::Column::CoinId.eq(coin_id))
        .filter(coin_raw::Column::Date.gte(month))
        .filter(coin_raw::Column::Date.lt(following_month))
        .into_model::<PriceBounds>()
        .one(&txn)
        .await?;

    let range = match bounds {
        Some(PriceBounds {
            max_price: Some(max_price),
            min_price: Some(min_price),
        }) => Some(MonthlyPriceRange {
            year_month: month,
            max_price,
            min_price,
        }),
        _ => None,
    };

    if let Some(range) = range {
        let row = coin_aggregated::ActiveModel {
            coin_id: Set(coin_id.to_string()),
            year_month: Set(range.year_month),
            max_price: Set(range.max_price),
            min_price: Set(range.min_price),
        };
        CoinAggregated::insert(row)
            .exec_without_returning(&txn)
            .await?;
    }

    txn.commit().await?;

    match range {
        Some(range) => tracing::info!(
            coin_id,
            year_month = %month,
            max_price = range.max_price,
            min_price = range.min_price,
            "Refreshed aggregate"
        ),
        None => tracing::warn!(
            coin_id,
            year_month = %month,
            "No raw data for month, aggregate left empty"
        ),
    }

    Ok(range)
}

pub async fn find_month<C>(
    db: &C,
    coin_id: &str,
    year_month: NaiveDate,
) -> Result<Option<MonthlyPriceRange>, StoreError>
where
    C: ConnectionTrait,
{
    let row = CoinAggregated::find_by_id((coin_id.to_string(), month_start(year_month)))
        .one(db)
        .await?;

    Ok(row.map(MonthlyPriceRange::from))
}

/// All stored months for a coin, oldest first.
pub async fn list_for_coin<C>(db: &C, coin_id: &str) -> Result<Vec<MonthlyPriceRange>, StoreError>
where
    C: ConnectionTrait,
{
    use sea_orm::QueryOrder;

    let rows = CoinAggregated::find()
        .filter(coin_aggregated::Column::CoinId.eq(coin_id))
        .order_by_asc(coin_aggregated::Column::YearMonth)
        .all(db)
        .await?;

    Ok(rows.into_iter().map(MonthlyPriceRange::from).collect())
}
