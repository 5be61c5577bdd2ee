mod common;

use coin_history_ingest::services::aggregate_store::{self, MonthlyPriceRange};
use coin_history_ingest::services::raw_store::{self, RawInsert};

use crate::common::{cleanup_coin, setup_test_db, snapshot, ymd};

/// Inserting the same (coin, date) twice keeps one row and reports AlreadyExists
#[tokio::test]
async fn test_raw_insert_is_idempotent() {
    let db = setup_test_db().await.expect("Failed to connect to test DB");
    cleanup_coin(&db, "bitcoin").await.unwrap();

    let first = snapshot("bitcoin", ymd(2022, 4, 10), 42_000.0);
    let second = snapshot("bitcoin", ymd(2022, 4, 10), 1.0);

    assert_eq!(
        raw_store::insert_if_absent(&db, &first).await.unwrap(),
        RawInsert::Inserted
    );
    assert_eq!(
        raw_store::insert_if_absent(&db, &second).await.unwrap(),
        RawInsert::AlreadyExists
    );

    assert_eq!(raw_store::count_for(&db, "bitcoin").await.unwrap(), 1);

    // The first write wins; duplicates never overwrite
    let stored = raw_store::find(&db, "bitcoin", ymd(2022, 4, 10))
        .await
        .unwrap()
        .expect("row should exist");
    assert_eq!(stored.price, 42_000.0);
    assert_eq!(stored.response, first.raw_payload);
}

/// Same day for different coins are independent rows
#[tokio::test]
async fn test_raw_insert_keys_on_coin_and_date() {
    let db = setup_test_db().await.expect("Failed to connect to test DB");
    cleanup_coin(&db, "raw-key-a").await.unwrap();
    cleanup_coin(&db, "raw-key-b").await.unwrap();

    let day = ymd(2022, 4, 10);
    raw_store::insert_if_absent(&db, &snapshot("raw-key-a", day, 1.0))
        .await
        .unwrap();
    let outcome = raw_store::insert_if_absent(&db, &snapshot("raw-key-b", day, 2.0))
        .await
        .unwrap();

    assert_eq!(outcome, RawInsert::Inserted);
    assert_eq!(raw_store::count_for(&db, "raw-key-a").await.unwrap(), 1);
    assert_eq!(raw_store::count_for(&db, "raw-key-b").await.unwrap(), 1);
}

/// Forced replace swaps the stored price for the new one
#[tokio::test]
async fn test_raw_replace_overwrites_existing_row() {
    let db = setup_test_db().await.expect("Failed to connect to test DB");
    cleanup_coin(&db, "raw-replace").await.unwrap();

    let day = ymd(2022, 4, 10);
    assert_eq!(
        raw_store::replace(&db, &snapshot("raw-replace", day, 10.0))
            .await
            .unwrap(),
        RawInsert::Inserted
    );
    assert_eq!(
        raw_store::replace(&db, &snapshot("raw-replace", day, 12.5))
            .await
            .unwrap(),
        RawInsert::Replaced
    );

    let stored = raw_store::find(&db, "raw-replace", day).await.unwrap().unwrap();
    assert_eq!(stored.price, 12.5);
    assert_eq!(raw_store::count_for(&db, "raw-replace").await.unwrap(), 1);
}

/// Max/min cover exactly the raw rows inside the month
#[tokio::test]
async fn test_refresh_month_computes_max_and_min() {
    let db = setup_test_db().await.expect("Failed to connect to test DB");
    cleanup_coin(&db, "agg-bitcoin").await.unwrap();

    for (date, price) in [
        (ymd(2022, 4, 5), 100.0),
        (ymd(2022, 4, 10), 150.0),
        (ymd(2022, 4, 20), 80.0),
        // Neighbouring months must not leak into April
        (ymd(2022, 3, 31), 5.0),
        (ymd(2022, 5, 1), 500.0),
    ] {
        raw_store::insert_if_absent(&db, &snapshot("agg-bitcoin", date, price))
            .await
            .unwrap();
    }

    let range = aggregate_store::refresh_month(&db, "agg-bitcoin", ymd(2022, 4, 1))
        .await
        .unwrap();

    let expected = MonthlyPriceRange {
        year_month: ymd(2022, 4, 1),
        max_price: 150.0,
        min_price: 80.0,
    };
    assert_eq!(range, Some(expected));
    assert_eq!(
        aggregate_store::find_month(&db, "agg-bitcoin", ymd(2022, 4, 1))
            .await
            .unwrap(),
        Some(expected)
    );
}

/// A month with a single raw row has max == min == that price
#[tokio::test]
async fn test_refresh_month_single_record() {
    let db = setup_test_db().await.expect("Failed to connect to test DB");
    cleanup_coin(&db, "agg-single").await.unwrap();

    raw_store::insert_if_absent(&db, &snapshot("agg-single", ymd(2022, 2, 14), 33.3))
        .await
        .unwrap();

    // Any day of the month resolves to the month bucket
    let range = aggregate_store::refresh_month(&db, "agg-single", ymd(2022, 2, 14))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(range.year_month, ymd(2022, 2, 1));
    assert_eq!(range.max_price, 33.3);
    assert_eq!(range.min_price, 33.3);
}

/// Refreshing again after new raw data replaces the row instead of adding one
#[tokio::test]
async fn test_refresh_month_recomputes_instead_of_accumulating() {
    let db = setup_test_db().await.expect("Failed to connect to test DB");
    cleanup_coin(&db, "agg-recompute").await.unwrap();

    raw_store::insert_if_absent(&db, &snapshot("agg-recompute", ymd(2022, 4, 5), 100.0))
        .await
        .unwrap();
    aggregate_store::refresh_month(&db, "agg-recompute", ymd(2022, 4, 1))
        .await
        .unwrap();

    raw_store::insert_if_absent(&db, &snapshot("agg-recompute", ymd(2022, 4, 6), 120.0))
        .await
        .unwrap();
    aggregate_store::refresh_month(&db, "agg-recompute", ymd(2022, 4, 1))
        .await
        .unwrap();

    let months = aggregate_store::list_for_coin(&db, "agg-recompute")
        .await
        .unwrap();
    assert_eq!(
        months,
        vec![MonthlyPriceRange {
            year_month: ymd(2022, 4, 1),
            max_price: 120.0,
            min_price: 100.0,
        }]
    );
}

/// No raw rows means no aggregate row, never a zero one
#[tokio::test]
async fn test_refresh_month_without_raw_data_leaves_key_absent() {
    let db = setup_test_db().await.expect("Failed to connect to test DB");
    cleanup_coin(&db, "agg-empty").await.unwrap();

    let range = aggregate_store::refresh_month(&db, "agg-empty", ymd(2022, 6, 1))
        .await
        .unwrap();

    assert_eq!(range, None);
    assert!(aggregate_store::list_for_coin(&db, "agg-empty")
        .await
        .unwrap()
        .is_empty());
}

/// Aggregates of other months and coins are untouched by a refresh
#[tokio::test]
async fn test_refresh_month_only_touches_its_key() {
    let db = setup_test_db().await.expect("Failed to connect to test DB");
    cleanup_coin(&db, "agg-iso-a").await.unwrap();
    cleanup_coin(&db, "agg-iso-b").await.unwrap();

    raw_store::insert_if_absent(&db, &snapshot("agg-iso-a", ymd(2022, 3, 3), 7.0))
        .await
        .unwrap();
    raw_store::insert_if_absent(&db, &snapshot("agg-iso-a", ymd(2022, 4, 3), 9.0))
        .await
        .unwrap();
    raw_store::insert_if_absent(&db, &snapshot("agg-iso-b", ymd(2022, 4, 3), 11.0))
        .await
        .unwrap();

    aggregate_store::refresh_month(&db, "agg-iso-a", ymd(2022, 3, 1))
        .await
        .unwrap();
    aggregate_store::refresh_month(&db, "agg-iso-b", ymd(2022, 4, 1))
        .await
        .unwrap();
    aggregate_store::refresh_month(&db, "agg-iso-a", ymd(2022, 4, 1))
        .await
        .unwrap();

    let march = aggregate_store::find_month(&db, "agg-iso-a", ymd(2022, 3, 1))
        .await
        .unwrap()
        .unwrap();
    let other_coin = aggregate_store::find_month(&db, "agg-iso-b", ymd(2022, 4, 1))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(march.max_price, 7.0);
    assert_eq!(other_coin.max_price, 11.0);
    assert_eq!(
        aggregate_store::list_for_coin(&db, "agg-iso-a")
            .await
            .unwrap()
            .len(),
        2
    );
}
