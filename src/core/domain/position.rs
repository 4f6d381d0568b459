//! Position types: the executor's output and the resolver's input.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::error::DomainError;

use super::ids::{MarketId, PositionId, TokenId};
use super::signal::Strategy;

/// One leg of a position as persisted by the executor.
#[derive(Debug, Clone)]
pub struct PositionLeg {
    pub outcome: String,
    pub token_id: TokenId,
    pub size_tokens: Decimal,
    pub entry_price: Decimal,
}

impl PositionLeg {
    #[must_use]
    pub fn cost(&self) -> Decimal {
        self.size_tokens * self.entry_price
    }
}

/// The fill record for one leg, recorded once the exchange confirms it.
#[derive(Debug, Clone)]
pub struct OrderFill {
    pub token_id: TokenId,
    pub order_id: String,
    pub fill_price: Decimal,
    pub size: Decimal,
    pub slippage_pct: Decimal,
}

/// A position's lifecycle state. Transitions are exactly
/// `Pending -> {Open, Failed}` and `Open -> Closed`; no other transition
/// is reachable through the public API.
#[derive(Debug, Clone)]
pub enum PositionStatus {
    Pending,
    Open,
    Closed {
        closed_at: DateTime<Utc>,
        realized_pnl: Decimal,
        winner: String,
    },
    Failed {
        reason: String,
    },
}

impl PositionStatus {
    #[must_use]
    pub const fn is_open(&self) -> bool {
        matches!(self, Self::Open)
    }

    #[must_use]
    pub const fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Open => "open",
            Self::Closed { .. } => "closed",
            Self::Failed { .. } => "failed",
        }
    }
}

/// A position, from pending materialization through resolution.
#[derive(Debug, Clone)]
pub struct Position {
    pub id: PositionId,
    pub market_id: MarketId,
    pub strategy: Strategy,
    pub legs: Vec<PositionLeg>,
    pub orders: Vec<OrderFill>,
    pub expected_edge: Decimal,
    pub actual_total_cost: Decimal,
    pub opened_at: DateTime<Utc>,
    pub status: PositionStatus,
}

impl Position {
    /// Construct a freshly-materialized `pending` position. `legs` must be
    /// non-empty: a position with no legs cannot express any exposure.
    pub fn try_new_pending(
        id: PositionId,
        market_id: MarketId,
        strategy: Strategy,
        legs: Vec<PositionLeg>,
        expected_edge: Decimal,
        opened_at: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        if legs.is_empty() {
            return Err(DomainError::EmptyLegs);
        }
        let actual_total_cost = legs.iter().map(PositionLeg::cost).sum();
        Ok(Self {
            id,
            market_id,
            strategy,
            legs,
            orders: Vec::new(),
            expected_edge,
            actual_total_cost,
            opened_at,
            status: PositionStatus::Pending,
        })
    }

    /// Transition `pending -> open`, recording the fills and the realized
    /// total cost (which may differ from the sum of leg entry prices once
    /// slippage is accounted for).
    pub fn mark_open(&mut self, orders: Vec<OrderFill>, actual_total_cost: Decimal) {
        self.orders = orders;
        self.actual_total_cost = actual_total_cost;
        self.status = PositionStatus::Open;
    }

    /// Transition `pending -> failed`.
    pub fn mark_failed(&mut self, reason: impl Into<String>) {
        self.status = PositionStatus::Failed {
            reason: reason.into(),
        };
    }

    /// Transition `open -> closed`. Fails if the position is not open.
    pub fn close(
        &mut self,
        closed_at: DateTime<Utc>,
        realized_pnl: Decimal,
        winner: impl Into<String>,
    ) -> Result<(), DomainError> {
        if !self.status.is_open() {
            return Err(DomainError::NotOpen);
        }
        self.status = PositionStatus::Closed {
            closed_at,
            realized_pnl,
            winner: winner.into(),
        };
        Ok(())
    }

    #[must_use]
    pub fn leg_named(&self, outcome: &str) -> Option<&PositionLeg> {
        self.legs
            .iter()
            .find(|leg| leg.outcome.trim().eq_ignore_ascii_case(outcome.trim()))
    }

    #[must_use]
    pub fn realized_pnl(&self) -> Option<Decimal> {
        match &self.status {
            PositionStatus::Closed { realized_pnl, .. } => Some(*realized_pnl),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn leg(outcome: &str, size: Decimal, price: Decimal) -> PositionLeg {
        PositionLeg {
            outcome: outcome.to_string(),
            token_id: TokenId::new(format!("token-{outcome}")),
            size_tokens: size,
            entry_price: price,
        }
    }

    fn pending() -> Position {
        Position::try_new_pending(
            PositionId::new("pos-1"),
            MarketId::new("m1"),
            Strategy::YesNo,
            vec![leg("YES", dec!(111.11), dec!(0.45)), leg("NO", dec!(100), dec!(0.50))],
            dec!(5.0),
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn rejects_empty_legs() {
        let err = Position::try_new_pending(
            PositionId::new("pos-1"),
            MarketId::new("m1"),
            Strategy::YesNo,
            vec![],
            dec!(5.0),
            Utc::now(),
        )
        .unwrap_err();
        assert_eq!(err, DomainError::EmptyLegs);
    }

    #[test]
    fn mark_open_then_close_happy_path() {
        let mut position = pending();
        assert!(position.status.is_pending());

        position.mark_open(vec![], dec!(95.0));
        assert!(position.status.is_open());

        position.close(Utc::now(), dec!(16.11), "Yes").unwrap();
        assert_eq!(position.realized_pnl(), Some(dec!(16.11)));
    }

    #[test]
    fn close_before_open_is_rejected() {
        let mut position = pending();
        let err = position.close(Utc::now(), dec!(1.0), "Yes").unwrap_err();
        assert_eq!(err, DomainError::NotOpen);
    }

    #[test]
    fn leg_named_is_case_insensitive() {
        let position = pending();
        assert!(position.leg_named("yes").is_some());
        assert!(position.leg_named(" YES ").is_some());
        assert!(position.leg_named("no").is_some());
        assert!(position.leg_named("maybe").is_none());
    }
}
