//! Market snapshot types emitted by the scanner and consumed by the signal engine.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::error::DomainError;

use super::ids::{MarketId, TokenId};

/// A single price level in an order book (price, size).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Level {
    pub price: Decimal,
    pub size: Decimal,
}

/// Normalized order book for one outcome's token.
///
/// Built once at the exchange-client boundary so the rest of the pipeline
/// never has to deal with the exchange's raw (and inconsistently shaped)
/// book representation.
#[derive(Debug, Clone, Default)]
pub struct OrderBook {
    asks: Vec<Level>,
    bids: Vec<Level>,
}

impl OrderBook {
    /// Build a normalized book: asks ascending by price, bids descending.
    #[must_use]
    pub fn new(mut asks: Vec<Level>, mut bids: Vec<Level>) -> Self {
        asks.sort_by(|a, b| a.price.cmp(&b.price));
        bids.sort_by(|a, b| b.price.cmp(&a.price));
        Self { asks, bids }
    }

    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn asks(&self) -> &[Level] {
        &self.asks
    }

    #[must_use]
    pub fn bids(&self) -> &[Level] {
        &self.bids
    }

    #[must_use]
    pub fn best_ask(&self) -> Option<Decimal> {
        self.asks.first().map(|l| l.price)
    }

    #[must_use]
    pub fn best_bid(&self) -> Option<Decimal> {
        self.bids.first().map(|l| l.price)
    }

    /// `(best_ask - best_bid) / best_ask * 100`, or 100 when there is no ask.
    #[must_use]
    pub fn spread_pct(&self) -> Decimal {
        let Some(ask) = self.best_ask() else {
            return Decimal::from(100);
        };
        if ask.is_zero() {
            return Decimal::from(100);
        }
        let bid = self.best_bid().unwrap_or(Decimal::ZERO);
        (ask - bid) / ask * Decimal::from(100)
    }

    /// Sum of sizes over the top `levels` ask levels.
    #[must_use]
    pub fn asks_depth(&self, levels: usize) -> Decimal {
        self.asks.iter().take(levels).map(|l| l.size).sum()
    }

    #[must_use]
    pub fn bids_depth(&self, levels: usize) -> Decimal {
        self.bids.iter().take(levels).map(|l| l.size).sum()
    }

    /// True iff the cumulative size over the top `levels` ask levels is at
    /// least `required`. Matches the original validator's "accumulate until
    /// threshold is met" semantics rather than a flat top-of-book check.
    #[must_use]
    pub fn asks_depth_covers(&self, required: Decimal, levels: usize) -> bool {
        let mut cumulative = Decimal::ZERO;
        for level in self.asks.iter().take(levels) {
            cumulative += level.size;
            if cumulative >= required {
                return true;
            }
        }
        false
    }
}

/// One outcome of a market, with its normalized order book.
#[derive(Debug, Clone)]
pub struct Outcome {
    pub name: String,
    pub token_id: TokenId,
    pub orderbook: OrderBook,
}

impl Outcome {
    #[must_use]
    pub fn name_matches(&self, candidate: &str) -> bool {
        self.name.trim().eq_ignore_ascii_case(candidate.trim())
    }
}

/// A market snapshot as enriched by the scanner and handed to the signal
/// engine. See `SPEC_FULL.md` §3 for field semantics.
#[derive(Debug, Clone)]
pub struct Market {
    pub market_id: MarketId,
    pub condition_id: String,
    pub question: String,
    pub expires_at: DateTime<Utc>,
    pub volume: Decimal,
    pub liquidity: Decimal,
    pub neg_risk: bool,
    pub outcomes: Vec<Outcome>,
    pub is_late_candidate: bool,
    pub accepting_orders: bool,
    pub active: bool,
}

impl Market {
    /// Validate and construct a snapshot, enforcing the invariants the
    /// scanner is responsible for before a snapshot ever reaches the queue:
    /// outcome/token-id parity and a minimum outcome count.
    #[allow(clippy::too_many_arguments)]
    pub fn try_new(
        market_id: MarketId,
        condition_id: String,
        question: String,
        expires_at: DateTime<Utc>,
        volume: Decimal,
        liquidity: Decimal,
        neg_risk: bool,
        outcomes: Vec<Outcome>,
        token_ids: &[TokenId],
        is_late_candidate: bool,
        accepting_orders: bool,
        active: bool,
    ) -> Result<Self, DomainError> {
        if outcomes.len() != token_ids.len() {
            return Err(DomainError::OutcomeTokenMismatch {
                outcomes: outcomes.len(),
                tokens: token_ids.len(),
            });
        }
        if outcomes.len() < 2 {
            return Err(DomainError::TooFewOutcomes);
        }
        Ok(Self {
            market_id,
            condition_id,
            question,
            expires_at,
            volume,
            liquidity,
            neg_risk,
            outcomes,
            is_late_candidate,
            accepting_orders,
            active,
        })
    }

    /// Seconds until `expires_at`; negative if already past.
    #[must_use]
    pub fn time_to_close(&self, now: DateTime<Utc>) -> i64 {
        (self.expires_at - now).num_seconds()
    }

    #[must_use]
    pub fn outcome_named(&self, name: &str) -> Option<&Outcome> {
        self.outcomes.iter().find(|o| o.name_matches(name))
    }

    /// True iff exactly two outcomes named `{YES,NO}` (case-insensitive).
    #[must_use]
    pub fn is_binary_yes_no(&self) -> bool {
        self.outcomes.len() == 2
            && self.outcome_named("yes").is_some()
            && self.outcome_named("no").is_some()
    }

    /// True iff exactly two outcomes named `{UP,DOWN}` (case-insensitive).
    #[must_use]
    pub fn is_binary_up_down(&self) -> bool {
        self.outcomes.len() == 2
            && self.outcome_named("up").is_some()
            && self.outcome_named("down").is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn outcome(name: &str, token: &str, best_ask: Decimal, size: Decimal) -> Outcome {
        Outcome {
            name: name.to_string(),
            token_id: TokenId::new(token),
            orderbook: OrderBook::new(
                vec![Level {
                    price: best_ask,
                    size,
                }],
                vec![],
            ),
        }
    }

    #[test]
    fn orderbook_spread_pct_zero_ask_is_100() {
        let book = OrderBook::new(vec![], vec![]);
        assert_eq!(book.spread_pct(), dec!(100));
    }

    #[test]
    fn orderbook_spread_pct_computes_percentage() {
        let book = OrderBook::new(
            vec![Level {
                price: dec!(0.50),
                size: dec!(100),
            }],
            vec![Level {
                price: dec!(0.45),
                size: dec!(100),
            }],
        );
        assert_eq!(book.spread_pct(), dec!(10));
    }

    #[test]
    fn orderbook_depth_accumulates_across_levels() {
        let book = OrderBook::new(
            vec![
                Level {
                    price: dec!(0.50),
                    size: dec!(10),
                },
                Level {
                    price: dec!(0.51),
                    size: dec!(10),
                },
            ],
            vec![],
        );
        assert!(book.asks_depth_covers(dec!(15), 10));
        assert!(!book.asks_depth_covers(dec!(25), 10));
    }

    #[test]
    fn market_try_new_rejects_outcome_token_mismatch() {
        let outcomes = vec![outcome("YES", "t1", dec!(0.5), dec!(100))];
        let err = Market::try_new(
            MarketId::new("m1"),
            "m1".into(),
            "Will it rain?".into(),
            Utc::now(),
            dec!(1000),
            dec!(1000),
            false,
            outcomes,
            &[TokenId::new("t1"), TokenId::new("t2")],
            false,
            true,
            true,
        )
        .unwrap_err();
        assert_eq!(
            err,
            DomainError::OutcomeTokenMismatch {
                outcomes: 1,
                tokens: 2
            }
        );
    }

    #[test]
    fn market_is_binary_yes_no() {
        let outcomes = vec![
            outcome("YES", "t1", dec!(0.45), dec!(1000)),
            outcome("NO", "t2", dec!(0.50), dec!(1000)),
        ];
        let market = Market::try_new(
            MarketId::new("m1"),
            "m1".into(),
            "Yes or no?".into(),
            Utc::now(),
            dec!(1000),
            dec!(1000),
            false,
            outcomes,
            &[TokenId::new("t1"), TokenId::new("t2")],
            false,
            true,
            true,
        )
        .unwrap();
        assert!(market.is_binary_yes_no());
        assert!(!market.is_binary_up_down());
    }
}
