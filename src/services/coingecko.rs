use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Client, StatusCode};

use crate::config::CoinGeckoConfig;
use crate::error::FetchError;
use crate::jobs::ingestion::PriceSource;
use crate::models::history::HistoryResponse;
use crate::models::snapshot::PriceSnapshot;

/// Client for CoinGecko's per-day `/coins/{id}/history` endpoint.
///
/// Holds no per-request state; every call takes the coin and date it needs.
#[derive(Clone)]
pub struct CoinGeckoService {
    client: Client,
    api_key: Option<String>,
    base_url: String,
}

impl CoinGeckoService {
    pub fn new(config: CoinGeckoConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            client,
            api_key: config.api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// `{base_url}/coins/{coin_id}/history?date=DD-MM-YYYY`
    pub fn history_url(&self, coin_id: &str, date: NaiveDate) -> String {
        format!(
            "{}/coins/{}/history?date={}",
            self.base_url,
            coin_id,
            date.format("%d-%m-%Y")
        )
    }

    /// Fetch one day's snapshot. Single attempt, no retry.
    pub async fn fetch_history(
        &self,
        coin_id: &str,
        date: NaiveDate,
    ) -> Result<PriceSnapshot, FetchError> {
        let url = self.history_url(coin_id, date);

        tracing::info!(coin_id, %date, %url, "Fetching {} data for {}", coin_id, date);

        let mut request = self
            .client
            .get(&url)
            .header("accept", "application/json");

        if let Some(api_key) = &self.api_key {
            request = request.header("x-cg-pro-api-key", api_key);
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(source) => {
                tracing::error!(coin_id, %date, %url, "Request failed: {}", source);
                return Err(FetchError::Request { url, source });
            }
        };

        let status = response.status();
        if status != StatusCode::OK {
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!(
                coin_id,
                %date,
                %url,
                status = status.as_u16(),
                "CoinGecko API error {}: {}",
                status,
                error_text
            );
            return Err(FetchError::Http {
                status: status.as_u16(),
                url,
            });
        }

        let body = match response.bytes().await {
            Ok(body) => body,
            Err(source) => {
                tracing::error!(coin_id, %date, %url, "Failed to read response body: {}", source);
                return Err(FetchError::Request { url, source });
            }
        };

        let snapshot = parse_history(coin_id, date, &body).map_err(|detail| {
            tracing::error!(coin_id, %date, %url, "Malformed response: {}", detail);
            FetchError::MalformedResponse {
                url: url.clone(),
                detail,
            }
        })?;

        tracing::info!(coin_id, %date, price = snapshot.usd_price, "Data retrieved OK");

        Ok(snapshot)
    }
}

#[async_trait]
impl PriceSource for CoinGeckoService {
    async fn fetch(&self, coin_id: &str, date: NaiveDate) -> Result<PriceSnapshot, FetchError> {
        self.fetch_history(coin_id, date).await
    }
}

/// Turn a `/history` body into a snapshot, keeping the full document as the
/// raw payload.
fn parse_history(coin_id: &str, date: NaiveDate, body: &[u8]) -> Result<PriceSnapshot, String> {
    let raw_payload: serde_json::Value =
        serde_json::from_slice(body).map_err(|e| format!("body is not JSON: {}", e))?;

    let parsed: HistoryResponse = serde_json::from_value(raw_payload.clone())
        .map_err(|e| format!("unexpected body shape: {}", e))?;

    let usd_price = parsed
        .usd_price()
        .ok_or_else(|| "missing market_data.current_price.usd".to_string())?;

    Ok(PriceSnapshot {
        coin_id: coin_id.to_string(),
        date,
        usd_price,
        raw_payload,
    })
}
