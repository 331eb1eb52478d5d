use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use super::MarketDataSource;
use crate::shared::errors::ServiceError;
use crate::shared::types::MarketSnapshot;

/// Birdeye token overview response
#[derive(Debug, Deserialize)]
struct BirdeyeResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    data: Option<BirdeyeTokenOverview>,
}

#[derive(Debug, Deserialize)]
struct BirdeyeTokenOverview {
    #[serde(default)]
    symbol: Option<String>,
    #[serde(default)]
    liquidity: Option<f64>,
    #[serde(default, alias = "holder")]
    holders: Option<u64>,
}

/// Birdeye market-data API client
pub struct BirdeyeClient {
    http_client: Client,
    base_url: String,
    api_key: String,
}

impl BirdeyeClient {
    pub fn new(base_url: String, api_key: String, timeout: Duration) -> Result<Self, ServiceError> {
        Ok(Self {
            http_client: Client::builder().timeout(timeout).build()?,
            base_url,
            api_key,
        })
    }
}

#[async_trait]
impl MarketDataSource for BirdeyeClient {
    async fn token_overview(&self, token_address: &str) -> Result<Option<MarketSnapshot>, ServiceError> {
        debug!("📊 Birdeye overview for {}", token_address);

        let response = self
            .http_client
            .get(&self.base_url)
            .query(&[("address", token_address)])
            .header("X-API-KEY", &self.api_key)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ServiceError::Status(response.status().as_u16()));
        }

        let body = response.text().await?;
        parse_overview_response(&body)
    }
}

/// `None` unless the response reports success and carries data. Absent fields default
/// to `N/A` / zero.
pub fn parse_overview_response(body: &str) -> Result<Option<MarketSnapshot>, ServiceError> {
    let response: BirdeyeResponse =
        serde_json::from_str(body).map_err(|e| ServiceError::Malformed(e.to_string()))?;

    if !response.success {
        return Ok(None);
    }

    Ok(response.data.map(|data| MarketSnapshot {
        symbol: data.symbol.unwrap_or_else(|| "N/A".to_string()),
        liquidity: data.liquidity.unwrap_or(0.0),
        holders: data.holders.unwrap_or(0),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_overview() {
        let body = r#"{"success":true,"data":{"symbol":"PEPE","liquidity":10250.75,"holders":81,"price":0.01}}"#;
        let snapshot = parse_overview_response(body).unwrap().unwrap();
        assert_eq!(snapshot.symbol, "PEPE");
        assert_eq!(snapshot.liquidity, 10250.75);
        assert_eq!(snapshot.holders, 81);
    }

    #[test]
    fn test_parse_overview_defaults_and_alias() {
        let body = r#"{"success":true,"data":{"holder":12}}"#;
        let snapshot = parse_overview_response(body).unwrap().unwrap();
        assert_eq!(snapshot.symbol, "N/A");
        assert_eq!(snapshot.liquidity, 0.0);
        assert_eq!(snapshot.holders, 12);
    }

    #[test]
    fn test_parse_overview_without_data() {
        assert_eq!(parse_overview_response(r#"{"success":false,"data":{"symbol":"X"}}"#).unwrap(), None);
        assert_eq!(parse_overview_response(r#"{"success":true,"data":null}"#).unwrap(), None);
        assert_eq!(parse_overview_response(r#"{"success":true}"#).unwrap(), None);
    }

    #[test]
    fn test_parse_overview_malformed() {
        assert!(matches!(parse_overview_response("<html>"), Err(ServiceError::Malformed(_))));
    }
}
