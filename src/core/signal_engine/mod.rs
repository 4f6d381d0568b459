//! Signal engine (C5): runs the three detection strategies, in order,
//! against every market snapshot the scanner produces.

mod late_market;
mod one_of_many;
mod yes_no;

pub use late_market::{is_late_candidate, LateMarketDetector};

use rust_decimal::Decimal;
use tokio::sync::mpsc;
use tracing::{debug, error};

use crate::core::domain::{Market, TradeSignal};
use crate::core::feed::PriceFeed;

/// Detector feature flags and thresholds, loaded from configuration.
#[derive(Debug, Clone)]
pub struct SignalEngineConfig {
    pub enable_one_of_many: bool,
    pub enable_yes_no: bool,
    pub enable_late_market: bool,
    pub late_market_only: bool,

    pub max_arb_position_size: Decimal,
    pub max_late_position_size: Decimal,
    pub min_arb_edge_pct: Decimal,
    pub min_time_to_close_minutes: i64,
    pub max_spread_one_of_many: Decimal,
    pub max_spread_yes_no: Decimal,
    pub max_spread_late_market: Decimal,
    pub orderbook_depth_levels: usize,

    pub late_market_window_start_secs: i64,
    pub late_market_window_end_secs: i64,
    pub late_market_min_deviation_pct: Decimal,
    pub late_market_max_volatility_pct: Decimal,
    pub late_market_max_price: Decimal,
    pub late_market_volatility_window: usize,
}

/// Owns the per-run detector state (currently just the late-market dedup
/// set) and dispatches a snapshot through the enabled detectors in order.
pub struct SignalEngine {
    config: SignalEngineConfig,
    late_market: LateMarketDetector,
}

impl SignalEngine {
    #[must_use]
    pub fn new(config: SignalEngineConfig) -> Self {
        Self {
            late_market: LateMarketDetector::new(),
            config,
        }
    }

    /// Run every enabled detector against `market`, in the fixed order
    /// one-of-many, yes/no, late-market.
    pub fn evaluate(&mut self, market: &Market, feed: &PriceFeed) -> Vec<TradeSignal> {
        if self.config.late_market_only && !market.is_late_candidate {
            return Vec::new();
        }

        let mut signals = Vec::with_capacity(1);

        if self.config.enable_one_of_many {
            if let Some(signal) = one_of_many::detect(market, &self.config) {
                signals.push(signal);
            }
        }
        if self.config.enable_yes_no {
            if let Some(signal) = yes_no::detect(market, &self.config) {
                signals.push(signal);
            }
        }
        if self.config.enable_late_market {
            if let Some(signal) = self.late_market.detect(market, feed, &self.config) {
                signals.push(signal);
            }
        }

        signals
    }
}

/// Drives the engine off the market queue until the channel closes,
/// pushing every emitted signal onto the signal queue.
pub async fn run(
    mut engine: SignalEngine,
    feed: PriceFeed,
    mut market_rx: mpsc::Receiver<Market>,
    signal_tx: mpsc::Sender<TradeSignal>,
) {
    while let Some(market) = market_rx.recv().await {
        for signal in engine.evaluate(&market, &feed) {
            debug!(strategy = %signal.strategy, market_id = %signal.market_id, "signal emitted");
            if signal_tx.try_send(signal).is_err() {
                error!("signal queue full or closed, dropping signal");
            }
        }
    }
}

pub(crate) fn min_time_to_close_secs(config: &SignalEngineConfig) -> i64 {
    config.min_time_to_close_minutes * 60
}
