//! Response shape of CoinGecko's `/coins/{id}/history` endpoint.
//!
//! Only the fields the pipeline reads are modelled; the full body is kept
//! separately as the raw payload.

use std::collections::HashMap;

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct HistoryResponse {
    /// Absent for dates before the coin was listed
    #[serde(default)]
    pub market_data: Option<MarketData>,
}

#[derive(Debug, Deserialize)]
pub struct MarketData {
    #[serde(default)]
    pub current_price: HashMap<String, Option<f64>>,
}

impl HistoryResponse {
    pub fn usd_price(&self) -> Option<f64> {
        self.market_data
            .as_ref()
            .and_then(|m| m.current_price.get("usd"))
            .copied()
            .flatten()
    }
}
