//! Trade signal types emitted by the signal engine and consumed by the executor.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use super::ids::{MarketId, PositionId, TokenId};

/// The three strategies the signal engine can detect. Kept as a closed,
/// enumerated kind rather than trait-object polymorphism: the set is small
/// and fixed, and the signal shape is identical across strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    OneOfMany,
    YesNo,
    LateMarket,
}

impl Strategy {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::OneOfMany => "one_of_many",
            Self::YesNo => "yes_no",
            Self::LateMarket => "late_market",
        }
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One BUY-side leg of a trade signal.
#[derive(Debug, Clone)]
pub struct SignalLeg {
    pub outcome: String,
    pub token_id: TokenId,
    pub neg_risk: bool,
    pub price: Decimal,
    pub size_usd: Decimal,
    pub size_tokens: Decimal,
    pub spread_pct: Decimal,
}

/// Telemetry captured from the spot-price feed at the moment a late-market
/// signal fired, kept for audit/replay purposes.
#[derive(Debug, Clone)]
pub struct LateMarketTelemetry {
    pub symbol: String,
    pub change_pct: Decimal,
    pub volatility_pct: Decimal,
}

/// A priced, sized trade signal ready for risk validation and execution.
#[derive(Debug, Clone)]
pub struct TradeSignal {
    pub strategy: Strategy,
    pub position_id: PositionId,
    pub market_id: MarketId,
    pub question: String,
    pub legs: Vec<SignalLeg>,
    pub total_cost: Decimal,
    pub expected_payout: Decimal,
    pub expected_edge: Decimal,
    pub expires_at: DateTime<Utc>,
    pub detected_at: DateTime<Utc>,
    pub late_market: Option<LateMarketTelemetry>,
}

impl TradeSignal {
    #[must_use]
    pub fn cap_for_strategy(&self, arb_cap: Decimal, late_cap: Decimal) -> Decimal {
        match self.strategy {
            Strategy::LateMarket => late_cap,
            Strategy::OneOfMany | Strategy::YesNo => arb_cap,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strategy_display_matches_wire_name() {
        assert_eq!(Strategy::OneOfMany.to_string(), "one_of_many");
        assert_eq!(Strategy::YesNo.to_string(), "yes_no");
        assert_eq!(Strategy::LateMarket.to_string(), "late_market");
    }
}
