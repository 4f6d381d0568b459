//! Pure domain types shared across the trading pipeline.
//!
//! - [`Market`] / [`Outcome`] / [`OrderBook`] - scanner output, signal-engine input
//! - [`TradeSignal`] / [`SignalLeg`] / [`Strategy`] - signal-engine output
//! - [`Position`] / [`PositionLeg`] / [`PositionStatus`] - executor output, resolver input
//! - [`DailyPnl`] - the rollup maintained by the resolver
//! - [`MarketId`] / [`TokenId`] / [`PositionId`] - opaque identifiers

mod ids;
mod market;
mod pnl;
mod position;
mod signal;

pub use ids::{ConditionId, MarketId, PositionId, TokenId};
pub use market::{Level, Market, OrderBook, Outcome};
pub use pnl::DailyPnl;
pub use position::{OrderFill, Position, PositionLeg, PositionStatus};
pub use signal::{LateMarketTelemetry, SignalLeg, Strategy, TradeSignal};
