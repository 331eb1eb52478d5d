use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

use super::SecurityScorer;
use crate::shared::errors::ServiceError;
use crate::shared::types::{HoneypotFlag, LpHolder, TokenSecurity};

/// GoPlus token security response
#[derive(Debug, Deserialize)]
struct GoPlusResponse {
    #[serde(default)]
    result: Option<HashMap<String, GoPlusTokenData>>,
}

#[derive(Debug, Deserialize)]
struct GoPlusTokenData {
    #[serde(default)]
    is_honeypot: Option<Value>,
    #[serde(default)]
    lp_holders: Vec<GoPlusLpHolder>,
}

/// GoPlus mixes strings and numbers for these fields
#[derive(Debug, Deserialize)]
struct GoPlusLpHolder {
    #[serde(default)]
    is_locked: Option<Value>,
    #[serde(default)]
    percent: Option<Value>,
}

/// GoPlus security API client
pub struct GoPlusClient {
    http_client: Client,
    base_url: String,
    api_key: String,
}

impl GoPlusClient {
    pub fn new(base_url: String, api_key: String, timeout: Duration) -> Result<Self, ServiceError> {
        Ok(Self {
            http_client: Client::builder().timeout(timeout).build()?,
            base_url,
            api_key,
        })
    }
}

#[async_trait]
impl SecurityScorer for GoPlusClient {
    async fn token_security(&self, token_address: &str) -> Result<Option<TokenSecurity>, ServiceError> {
        debug!("🔍 GoPlus security lookup for {}", token_address);

        let response = self
            .http_client
            .get(&self.base_url)
            .query(&[("contract_addresses", token_address)])
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ServiceError::Status(response.status().as_u16()));
        }

        let body: Value = response.json().await?;
        parse_security_response(body, token_address)
    }
}

/// Extract the security data for `token_address`. The result map may be keyed by the
/// lowercased address, so keys are matched case-insensitively.
pub fn parse_security_response(body: Value, token_address: &str) -> Result<Option<TokenSecurity>, ServiceError> {
    let response: GoPlusResponse =
        serde_json::from_value(body).map_err(|e| ServiceError::Malformed(e.to_string()))?;

    let Some(mut result) = response.result else {
        return Ok(None);
    };

    let key = result
        .keys()
        .find(|key| key.as_str() == token_address)
        .or_else(|| result.keys().find(|key| key.eq_ignore_ascii_case(token_address)))
        .cloned();

    Ok(key.and_then(|key| result.remove(&key)).map(|data| TokenSecurity {
        honeypot: match data.is_honeypot.as_ref().and_then(as_i64) {
            Some(1) => HoneypotFlag::Honeypot,
            Some(0) => HoneypotFlag::NotHoneypot,
            _ => HoneypotFlag::Unknown,
        },
        lp_holders: data
            .lp_holders
            .iter()
            .map(|lp| LpHolder {
                is_locked: lp.is_locked.as_ref().and_then(as_i64) == Some(1),
                percent: lp.percent.as_ref().and_then(as_f64).unwrap_or(0.0),
            })
            .collect(),
    }))
}

fn as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        Value::Bool(b) => Some(*b as i64),
        _ => None,
    }
}

fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
