use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// One coin's USD price on one day, together with the response it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSnapshot {
    pub coin_id: String,
    pub date: NaiveDate,
    pub usd_price: f64,
    pub raw_payload: serde_json::Value,
}

impl PriceSnapshot {
    /// Aggregation bucket this snapshot falls into.
    pub fn year_month(&self) -> NaiveDate {
        month_start(self.date)
    }
}

/// First calendar day of the month containing `date`.
pub fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// First calendar day of the month after the one containing `date`.
pub fn next_month(date: NaiveDate) -> NaiveDate {
    let start = month_start(date);
    if start.month() == 12 {
        NaiveDate::from_ymd_opt(start.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(start.year(), start.month() + 1, 1)
    }
    .unwrap_or(NaiveDate::MAX)
}
