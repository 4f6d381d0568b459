//! Exchange client (C2): orderbook reads and order placement, normalized to
//! the domain's [`OrderBook`] shape regardless of the wire format behind it.

pub mod polymarket;

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::core::domain::{OrderBook, TokenId};
use crate::error::Result;

/// Which side of the book an order rests on. The core only ever buys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderSide {
    Buy,
}

/// Outcome of a successful order placement.
#[derive(Debug, Clone)]
pub struct Fill {
    pub order_id: String,
    pub status: OrderStatus,
    pub fill_price: Decimal,
    pub size: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderStatus {
    Filled,
    Pending,
    Rejected,
}

/// Facade over the exchange SDK/REST surface used by the scanner, the
/// signal engine's depth checks, and the executor.
///
/// Every call may run a blocking SDK client under the hood; implementations
/// are expected to offload onto `tokio::task::spawn_blocking` internally so
/// callers never see a blocked scheduler thread.
#[async_trait]
pub trait ExchangeClient: Send + Sync {
    /// Fetch and normalize the order book for one outcome token. Returns
    /// an empty book (not an error) on an SDK failure - the failure is
    /// logged at the call site, matching the "missing, not raised" contract.
    async fn orderbook(&self, token_id: &TokenId) -> OrderBook;

    /// Submit a good-till-cancel BUY order.
    async fn place_order(
        &self,
        token_id: &TokenId,
        side: OrderSide,
        price: Decimal,
        size: Decimal,
        neg_risk: bool,
    ) -> Result<Fill>;

    /// Best-effort cancel; failures are logged by the implementation, never
    /// propagated to the caller.
    async fn cancel_order(&self, order_id: &str);
}
