use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::core::price::{DateRange, PriceHistoryProvider, PricePoint, PriceSeries};

/// Daily closes from the Financial Modeling Prep historical price endpoint.
pub struct FmpProvider {
    base_url: String,
    api_key: String,
}

impl FmpProvider {
    pub fn new(base_url: &str, api_key: &str) -> Self {
        FmpProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct FmpHistoryResponse {
    #[serde(default)]
    historical: Vec<FmpBar>,
    #[serde(rename = "Error Message")]
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FmpBar {
    date: NaiveDate,
    close: f64,
}

#[async_trait]
impl PriceHistoryProvider for FmpProvider {
    #[instrument(
        name = "FmpHistoryFetch",
        skip(self),
        fields(symbol = %symbol, range = %range)
    )]
    async fn fetch_history(&self, symbol: &str, range: DateRange) -> Result<PriceSeries> {
        let url = format!(
            "{}/api/v3/historical-price-full/{}?from={}&to={}",
            self.base_url, symbol, range.from, range.to
        );
        debug!("Requesting price history from {}", url);

        let client = reqwest::Client::builder()
            .user_agent("retrack/0.1")
            .build()?;
        let response = client
            .get(format!("{url}&apikey={}", self.api_key))
            .send()
            .await
            .with_context(|| format!("Failed to send request for symbol: {symbol}"))?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "HTTP error: {} for symbol: {}",
                response.status(),
                symbol
            ));
        }

        let text = response
            .text()
            .await
            .with_context(|| format!("Failed to get response text for symbol: {symbol}"))?;
        let data: FmpHistoryResponse = serde_json::from_str(&text)
            .map_err(|e| anyhow!("Failed to parse JSON response for {}: {}", symbol, e))?;

        if let Some(message) = data.error_message {
            return Err(anyhow!("FMP error for {}: {}", symbol, message));
        }

        // The endpoint returns newest first; PriceSeries reorders.
        let series: PriceSeries = data
            .historical
            .into_iter()
            .filter(|bar| range.contains(bar.date))
            .map(|bar| PricePoint::new(bar.date, bar.close))
            .collect();
        debug!(points = series.len(), "Parsed FMP price history");
        Ok(series)
    }
}
