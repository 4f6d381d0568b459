//! Daily profit-and-loss rollup, upserted by the resolver on every resolution.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;

/// The `pnl_daily` document, keyed by ISO date (`YYYY-MM-DD`).
#[derive(Debug, Clone)]
pub struct DailyPnl {
    pub date: NaiveDate,
    pub total_pnl: Decimal,
    pub total_trades: u32,
    pub winning_trades: u32,
    pub strategy_pnl: BTreeMap<String, Decimal>,
    pub updated_at: DateTime<Utc>,
}

impl DailyPnl {
    #[must_use]
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            total_pnl: Decimal::ZERO,
            total_trades: 0,
            winning_trades: 0,
            strategy_pnl: BTreeMap::new(),
            updated_at: Utc::now(),
        }
    }

    /// Win rate as a percent in `[0, 100]`.
    #[must_use]
    pub fn win_rate(&self) -> Decimal {
        if self.total_trades == 0 {
            return Decimal::ZERO;
        }
        Decimal::from(self.winning_trades) / Decimal::from(self.total_trades) * Decimal::from(100)
    }

    /// Return percent relative to `bankroll`.
    #[must_use]
    pub fn return_pct(&self, bankroll: Decimal) -> Decimal {
        if bankroll.is_zero() {
            return Decimal::ZERO;
        }
        self.total_pnl / bankroll * Decimal::from(100)
    }

    /// Apply one resolved trade's PnL to the rollup.
    pub fn record(&mut self, strategy: &str, pnl: Decimal, now: DateTime<Utc>) {
        self.total_pnl += pnl;
        self.total_trades += 1;
        if pnl > Decimal::ZERO {
            self.winning_trades += 1;
        }
        *self
            .strategy_pnl
            .entry(strategy.to_string())
            .or_insert(Decimal::ZERO) += pnl;
        self.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn record_accumulates_totals_and_win_rate() {
        let mut rollup = DailyPnl::new(NaiveDate::from_ymd_opt(2026, 7, 30).unwrap());
        rollup.record("yes_no", dec!(16.11), Utc::now());
        assert_eq!(rollup.total_trades, 1);
        assert_eq!(rollup.winning_trades, 1);
        assert_eq!(rollup.win_rate(), dec!(100));

        rollup.record("yes_no", dec!(-10), Utc::now());
        assert_eq!(rollup.total_trades, 2);
        assert_eq!(rollup.winning_trades, 1);
        assert_eq!(rollup.win_rate(), dec!(50));
        assert_eq!(rollup.total_pnl, dec!(6.11));
        assert_eq!(rollup.strategy_pnl.get("yes_no"), Some(&dec!(6.11)));
    }

    #[test]
    fn return_pct_against_bankroll() {
        let mut rollup = DailyPnl::new(NaiveDate::from_ymd_opt(2026, 7, 30).unwrap());
        rollup.record("one_of_many", dec!(50), Utc::now());
        assert_eq!(rollup.return_pct(dec!(1000)), dec!(5));
    }
}
