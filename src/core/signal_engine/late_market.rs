//! Late-market directional strategy: trade the side a correlated spot-price
//! move already points toward, in the closing window of a crypto market.

use std::collections::HashSet;
use std::time::{Duration, Instant};

use rust_decimal::Decimal;

use crate::core::domain::{LateMarketTelemetry, Market, MarketId, PositionId, SignalLeg, Strategy, TradeSignal};
use crate::core::feed::PriceFeed;

use super::SignalEngineConfig;

const DEDUP_RESET_EVERY: u32 = 200;
const DEDUP_IDLE_TIMEOUT: Duration = Duration::from_secs(30);

/// (keyword in the question, feed symbol) pairs. Generous on purpose -
/// false positives are filtered by the downstream gates.
const ASSET_KEYWORDS: &[(&str, &str)] = &[
    ("bitcoin", "btcusdt"),
    ("btc", "btcusdt"),
    ("ethereum", "ethusdt"),
    ("eth", "ethusdt"),
    ("solana", "solusdt"),
    ("sol", "solusdt"),
    ("xrp", "xrpusdt"),
    ("ripple", "xrpusdt"),
];

const DIRECTION_PHRASES: &[&str] = &["up or down", "up/down", "up-or-down"];

/// Heuristic classifier run by the watch-list feeder (C4): generous by
/// design, the signal engine's own gates reject anything that slips through.
#[must_use]
pub fn is_late_candidate(question: &str) -> bool {
    let lower = question.to_lowercase();
    let has_asset = ASSET_KEYWORDS.iter().any(|(kw, _)| lower.contains(kw));
    let has_direction = DIRECTION_PHRASES.iter().any(|phrase| lower.contains(phrase));
    has_asset && has_direction
}

fn symbol_for_question(question: &str) -> Option<&'static str> {
    let lower = question.to_lowercase();
    ASSET_KEYWORDS
        .iter()
        .find(|(kw, _)| lower.contains(kw))
        .map(|(_, symbol)| *symbol)
}

/// Owns the per-market dedup set so a market only ever emits one late signal
/// per entry window, with periodic resets so a market that persists across
/// windows can be re-evaluated.
pub struct LateMarketDetector {
    emitted: HashSet<MarketId>,
    processed: u32,
    last_activity: Instant,
}

impl LateMarketDetector {
    #[must_use]
    pub fn new() -> Self {
        Self {
            emitted: HashSet::new(),
            processed: 0,
            last_activity: Instant::now(),
        }
    }

    pub fn detect(
        &mut self,
        market: &Market,
        feed: &PriceFeed,
        config: &SignalEngineConfig,
    ) -> Option<TradeSignal> {
        self.tick();

        if !market.is_late_candidate {
            return None;
        }
        let now = chrono::Utc::now();
        let seconds_to_close = market.time_to_close(now);
        if seconds_to_close > config.late_market_window_start_secs
            || seconds_to_close < config.late_market_window_end_secs
        {
            return None;
        }

        if self.emitted.contains(&market.market_id) {
            return None;
        }

        let symbol = symbol_for_question(&market.question)?;
        feed.latest(symbol)?;
        let volatility = feed.volatility(symbol, config.late_market_volatility_window);
        if volatility > config.late_market_max_volatility_pct {
            return None;
        }

        let change_pct = feed_change_pct(feed, symbol)?;
        if change_pct.abs() < config.late_market_min_deviation_pct {
            return None;
        }

        let side = if change_pct >= Decimal::ZERO { "UP" } else { "DOWN" };
        let outcome = market.outcome_named(side)?;
        let best_ask = outcome.orderbook.best_ask()?;

        if best_ask > config.late_market_max_price {
            return None;
        }
        let spread = outcome.orderbook.spread_pct();
        if spread > config.max_spread_late_market {
            return None;
        }

        let size_tokens = if best_ask > Decimal::ZERO {
            config.max_late_position_size / best_ask
        } else {
            Decimal::ZERO
        };
        if !outcome
            .orderbook
            .asks_depth_covers(size_tokens, config.orderbook_depth_levels)
        {
            return None;
        }

        self.emitted.insert(market.market_id.clone());

        Some(TradeSignal {
            strategy: Strategy::LateMarket,
            position_id: PositionId::generate(&market.market_id, "late_market"),
            market_id: market.market_id.clone(),
            question: market.question.clone(),
            legs: vec![SignalLeg {
                outcome: outcome.name.clone(),
                token_id: outcome.token_id.clone(),
                neg_risk: market.neg_risk,
                price: best_ask,
                size_usd: config.max_late_position_size,
                size_tokens,
                spread_pct: spread,
            }],
            total_cost: best_ask * size_tokens,
            expected_payout: size_tokens,
            expected_edge: (Decimal::ONE - best_ask) * Decimal::from(100),
            expires_at: market.expires_at,
            detected_at: now,
            late_market: Some(LateMarketTelemetry {
                symbol: symbol.to_string(),
                change_pct,
                volatility_pct: volatility,
            }),
        })
    }

    fn tick(&mut self) {
        self.processed += 1;
        let idle = self.last_activity.elapsed() >= DEDUP_IDLE_TIMEOUT;
        if self.processed >= DEDUP_RESET_EVERY || idle {
            self.emitted.clear();
            self.processed = 0;
        }
        self.last_activity = Instant::now();
    }
}

impl Default for LateMarketDetector {
    fn default() -> Self {
        Self::new()
    }
}

/// `(newest - oldest) / oldest * 100` over the feed's current ring buffer.
fn feed_change_pct(feed: &PriceFeed, symbol: &str) -> Option<Decimal> {
    let snapshot = feed.history_snapshot(symbol);
    let oldest = *snapshot.first()?;
    let newest = *snapshot.last()?;
    if oldest.is_zero() {
        return None;
    }
    Some((newest - oldest) / oldest * Decimal::from(100))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_generous_late_candidates() {
        assert!(is_late_candidate("Bitcoin Up or Down at 3pm?"));
        assert!(is_late_candidate("ETH up/down next 15 minutes"));
        assert!(!is_late_candidate("Will it rain tomorrow?"));
        assert!(!is_late_candidate("Bitcoin price target $100k"));
    }

    #[test]
    fn symbol_lookup_prefers_first_keyword_match() {
        assert_eq!(symbol_for_question("Bitcoin up or down?"), Some("btcusdt"));
        assert_eq!(symbol_for_question("Solana up or down?"), Some("solusdt"));
        assert_eq!(symbol_for_question("no asset mentioned"), None);
    }
}
