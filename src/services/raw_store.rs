//! Raw snapshot storage in `coin_raw`, at most one row per coin per day.

use chrono::NaiveDate;
use sea_orm::{
    ActiveValue::Set, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, SqlErr, TransactionTrait,
};

use crate::entities::{coin_raw, prelude::*};
use crate::error::StoreError;
use crate::models::snapshot::PriceSnapshot;

/// Outcome of writing one snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawInsert {
    Inserted,
    /// A row for this coin and day was already stored by an earlier run
    AlreadyExists,
    /// Existing row was dropped and written again (forced refetch)
    Replaced,
}

fn active_model(snapshot: &PriceSnapshot) -> coin_raw::ActiveModel {
    coin_raw::ActiveModel {
        coin_id: Set(snapshot.coin_id.clone()),
        date: Set(snapshot.date),
        price: Set(snapshot.usd_price),
        response: Set(snapshot.raw_payload.clone()),
    }
}

fn is_duplicate_key(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

/// Insert the snapshot unless `(coin_id, date)` is already stored.
///
/// A duplicate key is reported as [`RawInsert::AlreadyExists`]; the stored
/// row is left untouched.
pub async fn insert_if_absent<C>(db: &C, snapshot: &PriceSnapshot) -> Result<RawInsert, StoreError>
where
    C: ConnectionTrait,
{
    tracing::info!(
        coin_id = %snapshot.coin_id,
        date = %snapshot.date,
        "Inserting {} data for {} on coin_raw table",
        snapshot.coin_id,
        snapshot.date
    );

    match CoinRaw::insert(active_model(snapshot))
        .exec_without_returning(db)
        .await
    {
        Ok(_) => Ok(RawInsert::Inserted),
        Err(e) if is_duplicate_key(&e) => {
            tracing::info!(
                coin_id = %snapshot.coin_id,
                date = %snapshot.date,
                "Already have {} data for {} on DB",
                snapshot.coin_id,
                snapshot.date
            );
            Ok(RawInsert::AlreadyExists)
        }
        Err(e) => Err(StoreError::Database(e)),
    }
}

/// Overwrite whatever is stored for `(coin_id, date)` with this snapshot.
///
/// Delete and insert run in one transaction, so readers never see the day
/// missing.
pub async fn replace(
    db: &DatabaseConnection,
    snapshot: &PriceSnapshot,
) -> Result<RawInsert, StoreError> {
    let txn = db.begin().await?;

    let deleted = CoinRaw::delete_many()
        .filter(coin_raw::Column::CoinId.eq(snapshot.coin_id.as_str()))
        .filter(coin_raw::Column::Date.eq(snapshot.date))
        .exec(&txn)
        .await?;

    CoinRaw::insert(active_model(snapshot))
        .exec_without_returning(&txn)
        .await?;

    txn.commit().await?;

    let outcome = if deleted.rows_affected > 0 {
        RawInsert::Replaced
    } else {
        RawInsert::Inserted
    };

    tracing::info!(
        coin_id = %snapshot.coin_id,
        date = %snapshot.date,
        "Stored {} data for {} on coin_raw table ({:?})",
        snapshot.coin_id,
        snapshot.date,
        outcome
    );

    Ok(outcome)
}

pub async fn find<C>(
    db: &C,
    coin_id: &str,
    date: NaiveDate,
) -> Result<Option<coin_raw::Model>, StoreError>
where
    C: ConnectionTrait,
{
    Ok(CoinRaw::find_by_id((coin_id.to_string(), date)).one(db).await?)
}

/// Number of stored days for a coin.
pub async fn count_for<C>(db: &C, coin_id: &str) -> Result<u64, StoreError>
where
    C: ConnectionTrait,
{
    Ok(CoinRaw::find()
        .filter(coin_raw::Column::CoinId.eq(coin_id))
        .count(db)
        .await?)
}
