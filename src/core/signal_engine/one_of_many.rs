//! One-of-many arbitrage: buy every outcome when the asks sum below 1.00.

use rust_decimal::Decimal;

use crate::core::domain::{Market, PositionId, SignalLeg, Strategy, TradeSignal};

use super::{min_time_to_close_secs, SignalEngineConfig};

pub(super) fn detect(market: &Market, config: &SignalEngineConfig) -> Option<TradeSignal> {
    if market.outcomes.len() < 3 {
        return None;
    }

    let now = chrono::Utc::now();
    if market.time_to_close(now) < min_time_to_close_secs(config) {
        return None;
    }

    let outcome_count = Decimal::from(market.outcomes.len());
    let position_size_usd = config.max_arb_position_size / outcome_count;

    let mut legs = Vec::with_capacity(market.outcomes.len());
    let mut total_cost = Decimal::ZERO;

    for outcome in &market.outcomes {
        let best_ask = outcome.orderbook.best_ask()?;

        let spread = outcome.orderbook.spread_pct();
        if spread > config.max_spread_one_of_many {
            return None;
        }

        let required_tokens = if best_ask > Decimal::ZERO {
            position_size_usd / best_ask
        } else {
            Decimal::ZERO
        };

        if !outcome
            .orderbook
            .asks_depth_covers(required_tokens, config.orderbook_depth_levels)
        {
            return None;
        }

        total_cost += best_ask;
        legs.push(SignalLeg {
            outcome: outcome.name.clone(),
            token_id: outcome.token_id.clone(),
            neg_risk: market.neg_risk,
            price: best_ask,
            size_usd: position_size_usd,
            size_tokens: required_tokens,
            spread_pct: spread,
        });
    }

    let edge = (Decimal::ONE - total_cost) * Decimal::from(100);
    if edge < config.min_arb_edge_pct {
        return None;
    }

    Some(TradeSignal {
        strategy: Strategy::OneOfMany,
        position_id: PositionId::generate(&market.market_id, "one_of_many"),
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::domain::{Level, MarketId, OrderBook, Outcome, TokenId};
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
            "Who wins?".into(),
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
    fn emits_signal_when_sum_below_one() {
        let market = market_with(vec![
            outcome("A", dec!(0.30), dec!(1000)),
            outcome("B", dec!(0.30), dec!(1000)),
            outcome("C", dec!(0.30), dec!(1000)),
        ]);
        let signal = detect(&market, &config()).expect("signal expected");
        assert_eq!(signal.total_cost, dec!(0.90));
        assert_eq!(signal.legs.len(), 3);
        assert_eq!(signal.expected_edge, dec!(10.00));
    }

    #[test]
    fn skips_when_edge_below_threshold() {
        let market = market_with(vec![
            outcome("A", dec!(0.34), dec!(1000)),
            outcome("B", dec!(0.34), dec!(1000)),
            outcome("C", dec!(0.34), dec!(1000)),
        ]);
        assert!(detect(&market, &config()).is_none());
    }

    #[test]
    fn skips_when_fewer_than_three_outcomes() {
        let market = market_with(vec![
            outcome("YES", dec!(0.3), dec!(1000)),
            outcome("NO", dec!(0.3), dec!(1000)),
        ]);
        assert!(detect(&market, &config()).is_none());
    }

    #[test]
    fn skips_on_insufficient_depth() {
        let market = market_with(vec![
            outcome("A", dec!(0.30), dec!(1)),
            outcome("B", dec!(0.30), dec!(1000)),
            outcome("C", dec!(0.30), dec!(1000)),
        ]);
        assert!(detect(&market, &config()).is_none());
    }
}
