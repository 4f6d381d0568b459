//! Market-metadata client (C3): the two HTTP calls the scanner and resolver
//! need against the prediction-market's discovery/resolution API.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client as HttpClient;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::warn;

use crate::error::{Error, Result};

const LIST_MARKETS_TIMEOUT: Duration = Duration::from_secs(30);
const GET_MARKET_TIMEOUT: Duration = Duration::from_secs(10);

/// One row from `list_markets`, with the JSON-stringified array fields
/// already parsed into native vectors.
#[derive(Debug, Clone)]
pub struct MarketSummary {
    pub market_id: String,
    pub condition_id: String,
    pub question: String,
    pub volume: Decimal,
    pub liquidity: Decimal,
    pub expires_at: Option<DateTime<Utc>>,
    pub neg_risk: bool,
    pub active: bool,
    pub accepting_orders: bool,
    pub outcomes: Vec<String>,
    pub token_ids: Vec<String>,
}

/// Resolution state returned by `get_market`.
#[derive(Debug, Clone)]
pub struct MarketResolution {
    pub resolved: bool,
    pub winner: Option<String>,
}

#[async_trait]
pub trait MetadataClient: Send + Sync {
    async fn list_markets(&self, min_volume: Decimal, limit: usize) -> Result<Vec<MarketSummary>>;
    async fn get_market(&self, condition_id: &str) -> Result<MarketResolution>;
}

#[derive(Debug, Deserialize)]
struct RawMarket {
    id: Option<String>,
    #[serde(rename = "conditionId")]
    condition_id: Option<String>,
    question: Option<String>,
    #[serde(default)]
    volume: Value,
    #[serde(default)]
    liquidity: Value,
    #[serde(rename = "endDate")]
    end_date: Option<String>,
    #[serde(rename = "negRisk", default)]
    neg_risk: bool,
    #[serde(default)]
    active: bool,
    #[serde(rename = "acceptingOrders", default = "default_true")]
    accepting_orders: bool,
    #[serde(default)]
    outcomes: Value,
    #[serde(rename = "clobTokenIds", default)]
    clob_token_ids: Value,
    #[serde(default)]
    resolved: Option<bool>,
    #[serde(default)]
    closed: Option<bool>,
    #[serde(default)]
    winner: Option<String>,
    #[serde(default)]
    tokens: Option<Vec<RawToken>>,
}

#[derive(Debug, Deserialize)]
struct RawToken {
    #[serde(default)]
    winner: bool,
    outcome: Option<String>,
}

fn default_true() -> bool {
    true
}

/// Checks `outcomes` for a dict-shaped entry marked as the winner, mirroring
/// the CLOB API's settlement variant where `outcomes` is an array of objects
/// rather than the flat name-string array `list_markets` sees. Returns the
/// winner's `outcome` field, falling back to `name`.
fn winner_from_outcomes(outcomes: &Value) -> Option<String> {
    let entries = outcomes.as_array()?;
    for entry in entries {
        let Some(obj) = entry.as_object() else {
            continue;
        };
        if !obj.get("winner").and_then(Value::as_bool).unwrap_or(false) {
            continue;
        }
        let name = obj
            .get("outcome")
            .and_then(Value::as_str)
            .or_else(|| obj.get("name").and_then(Value::as_str));
        if let Some(name) = name {
            return Some(name.to_string());
        }
    }
    None
}

/// Parses a field that may arrive either as a native JSON array or as a
/// JSON-encoded string containing one (Gamma-API's stringified-array quirk).
fn parse_json_array_field(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .iter()
            .map(|v| v.as_str().map(str::to_string).unwrap_or_else(|| v.to_string()))
            .collect(),
        Value::String(s) => serde_json::from_str::<Vec<String>>(s).unwrap_or_default(),
        _ => Vec::new(),
    }
}

fn decimal_from_value(value: &Value) -> Decimal {
    match value {
        Value::Number(n) => n
            .as_f64()
            .and_then(Decimal::from_f64_retain)
            .unwrap_or(Decimal::ZERO),
        Value::String(s) => s.parse().unwrap_or(Decimal::ZERO),
        _ => Decimal::ZERO,
    }
}

/// HTTP client for the market-metadata discovery/resolution API.
pub struct HttpMetadataClient {
    http: HttpClient,
    base_url: String,
}

impl HttpMetadataClient {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: HttpClient::new(),
            base_url: base_url.into(),
        }
    }

    fn market_id(raw: &RawMarket) -> Option<String> {
        raw.id.clone().or_else(|| raw.condition_id.clone())
    }
}

#[async_trait]
impl MetadataClient for HttpMetadataClient {
    async fn list_markets(&self, min_volume: Decimal, limit: usize) -> Result<Vec<MarketSummary>> {
        let url = format!("{}/markets", self.base_url);
        let response = tokio::time::timeout(
            LIST_MARKETS_TIMEOUT,
            self.http
                .get(&url)
                .query(&[
                    ("active", "true".to_string()),
                    ("closed", "false".to_string()),
                    ("volume_num_min", min_volume.to_string()),
                    ("limit", limit.to_string()),
                ])
                .send(),
        )
        .await
        .map_err(|_| Error::Exchange("list_markets request timed out".into()))??;

        let raw_markets: Vec<RawMarket> = response.json().await?;
        let mut summaries = Vec::with_capacity(raw_markets.len());
        for raw in raw_markets {
            let Some(market_id) = Self::market_id(&raw) else {
                continue;
            };
            let outcomes = parse_json_array_field(&raw.outcomes);
            let token_ids = parse_json_array_field(&raw.clob_token_ids);
            let expires_at = raw
                .end_date
                .as_deref()
                .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
                .map(|dt| dt.with_timezone(&Utc));

            summaries.push(MarketSummary {
                condition_id: raw.condition_id.clone().unwrap_or_else(|| market_id.clone()),
                market_id,
                question: raw.question.unwrap_or_default(),
                volume: decimal_from_value(&raw.volume),
                liquidity: decimal_from_value(&raw.liquidity),
                expires_at,
                neg_risk: raw.neg_risk,
                active: raw.active,
                accepting_orders: raw.accepting_orders,
                outcomes,
                token_ids,
            });
        }
        Ok(summaries)
    }

    async fn get_market(&self, condition_id: &str) -> Result<MarketResolution> {
        let url = format!("{}/markets/{condition_id}", self.base_url);
        let response = tokio::time::timeout(GET_MARKET_TIMEOUT, self.http.get(&url).send())
            .await
            .map_err(|_| Error::Exchange("get_market request timed out".into()))??;

        let raw: RawMarket = response.json().await?;
        let resolved = raw.resolved.or(raw.closed).unwrap_or(false);
        let winner = raw
            .winner
            .clone()
            .or_else(|| {
                raw.tokens
                    .as_ref()?
                    .iter()
                    .find(|t| t.winner)
                    .and_then(|t| t.outcome.clone())
            })
            .or_else(|| winner_from_outcomes(&raw.outcomes));

        if resolved && winner.is_none() {
            warn!(condition_id, "market resolved but no winner field present yet");
        }

        Ok(MarketResolution { resolved, winner })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_stringified_json_array() {
        let value = Value::String(r#"["Yes","No"]"#.to_string());
        assert_eq!(parse_json_array_field(&value), vec!["Yes", "No"]);
    }

    #[test]
    fn parses_native_json_array() {
        let value = serde_json::json!(["tok1", "tok2"]);
        assert_eq!(parse_json_array_field(&value), vec!["tok1", "tok2"]);
    }

    #[test]
    fn decimal_from_value_handles_numbers_and_strings() {
        assert_eq!(decimal_from_value(&serde_json::json!(12.5)), Decimal::new(125, 1));
        assert_eq!(decimal_from_value(&serde_json::json!("42")), Decimal::new(42, 0));
        assert_eq!(decimal_from_value(&Value::Null), Decimal::ZERO);
    }

    #[test]
    fn winner_from_outcomes_reads_outcome_field() {
        let outcomes = serde_json::json!([
            {"outcome": "Yes", "winner": false},
            {"outcome": "No", "winner": true},
        ]);
        assert_eq!(winner_from_outcomes(&outcomes), Some("No".to_string()));
    }

    #[test]
    fn winner_from_outcomes_falls_back_to_name_field() {
        let outcomes = serde_json::json!([
            {"name": "Yes", "winner": true},
        ]);
        assert_eq!(winner_from_outcomes(&outcomes), Some("Yes".to_string()));
    }

    #[test]
    fn winner_from_outcomes_returns_none_without_a_winner() {
        let outcomes = serde_json::json!([
            {"outcome": "Yes", "winner": false},
            {"outcome": "No", "winner": false},
        ]);
        assert_eq!(winner_from_outcomes(&outcomes), None);
    }

    #[test]
    fn winner_from_outcomes_ignores_flat_string_arrays() {
        let outcomes = serde_json::json!(["Yes", "No"]);
        assert_eq!(winner_from_outcomes(&outcomes), None);
    }
}
