//! Risk guard (C6): the stateful gate every trade signal must pass before
//! the executor will act on it.

use chrono::{NaiveDate, Utc};
use parking_lot::RwLock;
use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::core::domain::{DailyPnl, Strategy, TradeSignal};

/// Risk limits, loaded once from configuration.
#[derive(Debug, Clone)]
pub struct RiskLimits {
    pub bankroll: Decimal,
    pub max_arb_position_size: Decimal,
    pub max_late_position_size: Decimal,
    pub max_daily_exposure: Decimal,
    pub max_concurrent_positions: usize,
    pub daily_loss_halt_amount: Decimal,
    pub max_consecutive_fails: u32,
}

/// Reason a signal was rejected by [`RiskGuard::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RiskRejection {
    Halted { reason: String },
    PositionSizeExceeded { cost: Decimal, limit: Decimal },
    TooManyConcurrentPositions { open: usize, limit: usize },
    DailyExposureExceeded { projected: Decimal, limit: Decimal },
    DailyLossHalt,
}

impl std::fmt::Display for RiskRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Halted { reason } => write!(f, "trading halted: {reason}"),
            Self::PositionSizeExceeded { cost, limit } => {
                write!(f, "position size {cost} exceeds limit {limit}")
            }
            Self::TooManyConcurrentPositions { open, limit } => {
                write!(f, "{open} open positions at or above limit {limit}")
            }
            Self::DailyExposureExceeded { projected, limit } => {
                write!(f, "projected exposure {projected} exceeds daily limit {limit}")
            }
            Self::DailyLossHalt => write!(f, "daily loss limit exceeded"),
        }
    }
}

struct HaltState {
    halted: bool,
    reason: String,
    consecutive_failures: u32,
}

/// Mutable risk state, guarded for concurrent access from the executor task.
struct RiskState {
    halt: HaltState,
    open_positions: usize,
    open_exposure: Decimal,
    today: DailyPnl,
}

/// Validates every candidate trade signal and owns the sticky-halt state.
///
/// Per the concurrency model, the guard's mutable state is touched only from
/// the executor task (`validate` before submission, `record_result` after);
/// readers elsewhere (e.g. the `status` CLI command) take a point-in-time
/// snapshot via [`RiskGuard::snapshot`].
pub struct RiskGuard {
    limits: RiskLimits,
    state: RwLock<RiskState>,
}

/// Point-in-time view of the guard's state, safe to hand to a reader.
#[derive(Debug, Clone)]
pub struct RiskSnapshot {
    pub halted: bool,
    pub halt_reason: String,
    pub consecutive_failures: u32,
    pub open_positions: usize,
    pub open_exposure: Decimal,
    pub today_pnl: Decimal,
}

impl RiskGuard {
    #[must_use]
    pub fn new(limits: RiskLimits) -> Self {
        Self {
            limits,
            state: RwLock::new(RiskState {
                halt: HaltState {
                    halted: false,
                    reason: String::new(),
                    consecutive_failures: 0,
                },
                open_positions: 0,
                open_exposure: Decimal::ZERO,
                today: DailyPnl::new(today()),
            }),
        }
    }

    /// Validate a signal. On acceptance, reserves the position slot and
    /// exposure atomically so concurrent validations cannot both pass.
    pub fn validate(&self, signal: &TradeSignal) -> Result<(), RiskRejection> {
        let mut state = self.state.write();

        if state.halt.halted {
            return Err(RiskRejection::Halted {
                reason: state.halt.reason.clone(),
            });
        }

        let cap = match signal.strategy {
            Strategy::LateMarket => self.limits.max_late_position_size,
            Strategy::OneOfMany | Strategy::YesNo => self.limits.max_arb_position_size,
        };
        if signal.total_cost > cap {
            return Err(RiskRejection::PositionSizeExceeded {
                cost: signal.total_cost,
                limit: cap,
            });
        }

        if state.open_positions >= self.limits.max_concurrent_positions {
            return Err(RiskRejection::TooManyConcurrentPositions {
                open: state.open_positions,
                limit: self.limits.max_concurrent_positions,
            });
        }

        let projected = state.open_exposure + signal.total_cost;
        if projected > self.limits.max_daily_exposure {
            return Err(RiskRejection::DailyExposureExceeded {
                projected,
                limit: self.limits.max_daily_exposure,
            });
        }

        if state.today.total_pnl < -self.limits.daily_loss_halt_amount {
            state.halt.halted = true;
            state.halt.reason = "daily loss exceeded".to_string();
            warn!("trading halted: daily loss exceeded");
            return Err(RiskRejection::DailyLossHalt);
        }

        state.open_positions += 1;
        state.open_exposure = projected;
        Ok(())
    }

    /// Release a reservation made by a `validate` call that was never
    /// followed through to a closed position (e.g. the position failed).
    pub fn release(&self, cost: Decimal) {
        let mut state = self.state.write();
        state.open_positions = state.open_positions.saturating_sub(1);
        state.open_exposure = (state.open_exposure - cost).max(Decimal::ZERO);
    }

    /// Record the outcome of an executed (or rejected) signal, advancing the
    /// consecutive-failure counter and, on success, resetting it.
    pub fn record_result(&self, strategy: Strategy, success: bool, pnl: Option<Decimal>) {
        let mut state = self.state.write();

        if success {
            state.halt.consecutive_failures = 0;
        } else {
            state.halt.consecutive_failures += 1;
            if state.halt.consecutive_failures >= self.limits.max_consecutive_fails {
                state.halt.halted = true;
                state.halt.reason = "consecutive failure limit reached".to_string();
                warn!(
                    failures = state.halt.consecutive_failures,
                    "trading halted: consecutive failures"
                );
            }
        }

        if let Some(pnl) = pnl {
            let now = Utc::now();
            if state.today.date != today() {
                state.today = DailyPnl::new(today());
            }
            state.today.record(strategy.as_str(), pnl, now);
        }
    }

    /// Clear a sticky halt. Does not reset the consecutive-failure counter,
    /// which is only cleared by a subsequent success.
    pub fn resume(&self) {
        let mut state = self.state.write();
        state.halt.halted = false;
        state.halt.reason.clear();
        info!("trading resumed");
    }

    /// Seed the halt flag at start-up from a durable record (see
    /// `Store::get_halt_state`), so a halt survives a process restart.
    pub fn seed_halt(&self, reason: String) {
        let mut state = self.state.write();
        state.halt.halted = true;
        state.halt.reason = reason;
    }

    #[must_use]
    pub fn snapshot(&self) -> RiskSnapshot {
        let state = self.state.read();
        RiskSnapshot {
            halted: state.halt.halted,
            halt_reason: state.halt.reason.clone(),
            consecutive_failures: state.halt.consecutive_failures,
            open_positions: state.open_positions,
            open_exposure: state.open_exposure,
            today_pnl: state.today.total_pnl,
        }
    }
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}
