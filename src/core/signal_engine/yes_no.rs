//! Binary arbitrage: buy both sides of a YES/NO or UP/DOWN market when the
//! two asks sum below 1.00.

use rust_decimal::Decimal;

use crate::core::domain::{Market, Outcome, PositionId, SignalLeg, Strategy, TradeSignal};

use super::{min_time_to_close_secs, SignalEngineConfig};

pub(super) fn detect(market: &Market, config: &SignalEngineConfig) -> Option<TradeSignal> {
    let (side_a, side_b) = binary_pair(market)?;

    let now = chrono::Utc::now();
    if market.time_to_close(now) < min_time_to_close_secs(config) {
        return None;
    }

    let ask_a = side_a.orderbook.best_ask()?;
    let ask_b = side_b.orderbook.best_ask()?;

    let spread_a = side_a.orderbook.spread_pct();
    let spread_b = side_b.orderbook.spread_pct();
    if spread_a > config.max_spread_yes_no || spread_b > config.max_spread_yes_no {
        return None;
    }

    let total_cost = ask_a + ask_b;
    let edge = (Decimal::ONE - total_cost) * Decimal::from(100);
    if edge < config.min_arb_edge_pct {
        return None;
    }

    let per_side = config.max_arb_position_size / Decimal::from(2);
    let tokens_a = if ask_a > Decimal::ZERO { per_side / ask_a } else { Decimal::ZERO };
    let tokens_b = if ask_b > Decimal::ZERO { per_side / ask_b } else { Decimal::ZERO };

    if !side_a
        .orderbook
        .asks_depth_covers(tokens_a, config.orderbook_depth_levels)
        || !side_b
            .orderbook
            .asks_depth_covers(tokens_b, config.orderbook_depth_levels)
    {
        return None;
    }

    let legs = vec![
        SignalLeg {
            outcome: side_a.name.clone(),
            token_id: side_a.token_id.clone(),
            neg_risk: market.neg_risk,
            price: ask_a,
            size_usd: per_side,
            size_tokens: tokens_a,
            spread_pct: spread_a,
        },
        SignalLeg {
            outcome: side_b.name.clone(),
            token_id: side_b.token_id.clone(),
            neg_risk: market.neg_risk,
            price: ask_b,
            size_usd: per_side,
            size_tokens: tokens_b,
            spread_pct: spread_b,
        },
    ];

    Some(TradeSignal {
        strategy: Strategy::YesNo,
        position_id: PositionId::generate(&market.market_id, "yes_no"),
        market_id: market.market_id.clone(),
        question: market.question.clone(),
        legs,
        total_cost,
        expected_payout: Decimal::ONE,
        expected_edge: edge,
        expires_at: market.expires_at,
        detected_at: now,
        late_market: None,
    })
}

/// Finds the positive/negative outcome pair for either naming convention.
/// Order is stable (positive side first) so leg ordering is deterministic.
fn binary_pair(market: &Market) -> Option<(&Outcome, &Outcome)> {
    if market.outcomes.len() != 2 {
        return None;
    }
    if market.is_binary_yes_no() {
        return Some((
            market.outcome_named("yes")?,
            market.outcome_named("no")?,
        ));
    }
    if market.is_binary_up_down() {
        return Some((
            market.outcome_named("up")?,
            market.outcome_named("down")?,
        ));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::domain::{Level, MarketId, OrderBook, TokenId};
    use rust_decimal_macros::dec;

    fn outcome(name: &str, ask: Decimal, size: Decimal) -> Outcome {
        Outcome {
            name: name.to_string(),
            token_id: TokenId::new(format!("tok-{name}")),
            orderbook: OrderBook::new(vec![Level { price: ask, size }], vec![]),
        }
    }

    fn config() -> SignalEngineConfig {
        SignalEngineConfig {
            enable_one_of_many: true,
            enable_yes_no: true,
            enable_late_market: true,
            late_market_only: false,
            max_arb_position_size: dec!(30),
            max_late_position_size: dec!(20),
            min_arb_edge_pct: dec!(1),
            min_time_to_close_minutes: 5,
            max_spread_one_of_many: dec!(5),
            max_spread_yes_no: dec!(5),
            max_spread_late_market: dec!(5),
            orderbook_depth_levels: 10,
            late_market_window_start_secs: 180,
            late_market_window_end_secs: 60,
            late_market_min_deviation_pct: dec!(0.5),
            late_market_max_volatility_pct: dec!(5),
            late_market_max_price: dec!(0.9),
            late_market_volatility_window: 30,
        }
    }

    fn market_with(outcomes: Vec<Outcome>) -> Market {
        let token_ids: Vec<_> = outcomes.iter().map(|o| o.token_id.clone()).collect();
        Market::try_new(
            MarketId::new("m1"),
            "m1".into(),
            "Yes or no?".into(),
            chrono::Utc::now() + chrono::Duration::hours(1),
            dec!(10000),
            dec!(10000),
            false,
            outcomes,
            &token_ids,
            false,
            true,
            true,
        )
        .unwrap()
    }

    #[test]
    fn emits_signal_for_yes_no_pair() {
        let market = market_with(vec![
            outcome("YES", dec!(0.45), dec!(1000)),
            outcome("NO", dec!(0.50), dec!(1000)),
        ]);
        let signal = detect(&market, &config()).expect("signal expected");
        assert_eq!(signal.total_cost, dec!(0.95));
        assert_eq!(signal.legs.len(), 2);
    }

    #[test]
    fn emits_signal_for_up_down_pair() {
        let market = market_with(vec![
            outcome("UP", dec!(0.40), dec!(1000)),
            outcome("DOWN", dec!(0.50), dec!(1000)),
        ]);
        assert!(detect(&market, &config()).is_some());
    }

    #[test]
    fn skips_non_binary_naming() {
        let market = market_with(vec![
            outcome("MAYBE", dec!(0.40), dec!(1000)),
            outcome("OTHER", dec!(0.50), dec!(1000)),
        ]);
        assert!(detect(&market, &config()).is_none());
    }

    #[test]
    fn skips_when_spread_too_wide() {
        let market = market_with(vec![
            outcome("YES", dec!(0.45), dec!(1000)),
            Outcome {
                name: "NO".into(),
                token_id: TokenId::new("tok-no"),
                orderbook: OrderBook::new(
                    vec![Level { price: dec!(0.50), size: dec!(1000) }],
                    vec![Level { price: dec!(0.10), size: dec!(1000) }],
                ),
            },
        ]);
        assert!(detect(&market, &config()).is_none());
    }
}
