//! Executor (C7): turns a validated trade signal into a position, either by
//! simulating fills (dry run) or placing real orders (live).

use std::time::Duration;

use futures_util::future::join_all;
use rust_decimal::Decimal;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::{error, info, warn};

use crate::core::domain::{OrderFill, Position, PositionLeg, TradeSignal};
use crate::core::exchange::{ExchangeClient, OrderSide, OrderStatus};
use crate::core::risk::RiskGuard;
use crate::core::store::{EventLevel, EventRecord, Store};

/// Dry-run/live toggle and the live-mode timeout and slippage tolerance.
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    pub dry_run: bool,
    pub order_timeout_seconds: u64,
    pub max_slippage_pct: Decimal,
}

/// Drains the signal queue until it closes, executing each signal in turn.
///
/// Signals are processed one at a time (not fanned out): the risk guard's
/// position-slot and exposure reservation must observe each signal's effect
/// before the next is validated, matching the single-writer discipline the
/// concurrency model assigns to position state.
pub async fn run(
    mut signal_rx: mpsc::Receiver<TradeSignal>,
    risk_guard: &RiskGuard,
    exchange: &dyn ExchangeClient,
    store: &dyn Store,
    config: &ExecutorConfig,
) {
    info!(dry_run = config.dry_run, "executor started");
    while let Some(signal) = signal_rx.recv().await {
        execute_signal(&signal, risk_guard, exchange, store, config).await;
    }
    info!("executor stopped");
}

/// Execute one trade signal: risk check, position materialization, then
/// dry-run or live dispatch.
pub async fn execute_signal(
    signal: &TradeSignal,
    risk_guard: &RiskGuard,
    exchange: &dyn ExchangeClient,
    store: &dyn Store,
    config: &ExecutorConfig,
) {
    info!(strategy = %signal.strategy, position_id = %signal.position_id, "executing signal");
    let was_halted = risk_guard.snapshot().halted;

    if let Err(rejection) = risk_guard.validate(signal) {
        warn!(position_id = %signal.position_id, reason = %rejection, "trade rejected by risk guard");
        record_failed_trade(signal, &format!("risk check failed: {rejection}"), store).await;
        persist_halt_if_changed(risk_guard, store, was_halted).await;
        return;
    }

    let mut position = match build_pending_position(signal) {
        Ok(position) => position,
        Err(err) => {
            error!(position_id = %signal.position_id, error = %err, "cannot materialize position");
            risk_guard.release(signal.total_cost);
            risk_guard.record_result(signal.strategy, false, None);
            return;
        }
    };

    if let Err(err) = store.save_position(&position).await {
        error!(position_id = %signal.position_id, error = %err, "failed to persist pending position");
    }

    let success = if config.dry_run {
        execute_dry_run(signal, &mut position, store).await
    } else {
        execute_live(signal, &mut position, exchange, store, config).await
    };

    if !success {
        risk_guard.release(signal.total_cost);
    }
    risk_guard.record_result(signal.strategy, success, None);
    persist_halt_if_changed(risk_guard, store, was_halted).await;
}

/// Mirror a freshly-triggered halt into the durable store, so the `status`
/// and `resume` CLI commands (which run out-of-process) see it.
async fn persist_halt_if_changed(risk_guard: &RiskGuard, store: &dyn Store, was_halted: bool) {
    let snapshot = risk_guard.snapshot();
    if snapshot.halted && !was_halted {
        let event = EventRecord::new(
            "risk_halt",
            EventLevel::Warning,
            serde_json::json!({ "reason": snapshot.halt_reason }),
        );
        if let Err(err) = store.log_event(event).await {
            error!(error = %err, "failed to log risk_halt event");
        }
        if let Err(err) = store.set_halt_state(true, &snapshot.halt_reason).await {
            error!(error = %err, "failed to persist halt state");
        }
    }
}

fn legs_from_signal(signal: &TradeSignal) -> Vec<PositionLeg> {
    signal
        .legs
        .iter()
        .map(|leg| PositionLeg {
            outcome: leg.outcome.clone(),
            token_id: leg.token_id.clone(),
            size_tokens: leg.size_tokens,
            entry_price: leg.price,
        })
        .collect()
}

fn build_pending_position(signal: &TradeSignal) -> Result<Position, crate::error::DomainError> {
    Position::try_new_pending(
        signal.position_id.clone(),
        signal.market_id.clone(),
        signal.strategy,
        legs_from_signal(signal),
        signal.expected_edge,
        signal.detected_at,
    )
}

async fn record_failed_trade(signal: &TradeSignal, reason: &str, store: &dyn Store) {
    match build_pending_position(signal) {
        Ok(mut position) => {
            position.mark_failed(reason);
            if let Err(err) = store.update_position(&position).await {
                error!(position_id = %signal.position_id, error = %err, "failed to persist failed position");
            }
        }
        Err(err) => {
            error!(position_id = %signal.position_id, error = %err, "cannot record failed trade: invalid legs");
        }
    }

    let event = EventRecord::new(
        "trade_failed",
        EventLevel::Error,
        serde_json::json!({
            "module": "executor",
            "position_id": signal.position_id.to_string(),
            "strategy": signal.strategy.as_str(),
            "reason": reason,
        }),
    );
    if let Err(err) = store.log_event(event).await {
        error!(error = %err, "failed to log trade_failed event");
    }
}

/// Simulate zero-slippage fills at each leg's quoted price.
async fn execute_dry_run(signal: &TradeSignal, position: &mut Position, store: &dyn Store) -> bool {
    info!(position_id = %signal.position_id, legs = signal.legs.len(), "dry-run: simulating fills");
    tokio::time::sleep(Duration::from_millis(100)).await;

    let mut orders = Vec::with_capacity(signal.legs.len());
    let mut actual_total_cost = Decimal::ZERO;
    for leg in &signal.legs {
        let fill_price = leg.price;
        let size = leg.size_tokens;
        actual_total_cost += fill_price * size;
        orders.push(OrderFill {
            token_id: leg.token_id.clone(),
            order_id: format!("DRY_RUN_{}_{}", signal.position_id, leg.outcome),
            fill_price,
            size,
            slippage_pct: Decimal::ZERO,
        });
    }

    position.mark_open(orders, actual_total_cost);
    if let Err(err) = store.update_position(position).await {
        error!(position_id = %signal.position_id, error = %err, "failed to persist opened position");
    }

    info!(
        position_id = %signal.position_id,
        cost = %actual_total_cost,
        expected_edge = %signal.expected_edge,
        "dry-run position opened"
    );

    let event = EventRecord::new(
        "dry_run_trade_executed",
        EventLevel::Info,
        serde_json::json!({
            "module": "executor",
            "position_id": signal.position_id.to_string(),
            "strategy": signal.strategy.as_str(),
            "expected_edge": signal.expected_edge.to_string(),
            "total_cost": actual_total_cost.to_string(),
        }),
    );
    if let Err(err) = store.log_event(event).await {
        error!(error = %err, "failed to log dry_run_trade_executed event");
    }

    true
}

async fn cancel_all(order_ids: &[String], exchange: &dyn ExchangeClient) {
    for order_id in order_ids {
        exchange.cancel_order(order_id).await;
    }
}

/// Place every leg concurrently under one umbrella timeout, verify fills and
/// slippage, and cancel everything already placed on any failure.
async fn execute_live(
    signal: &TradeSignal,
    position: &mut Position,
    exchange: &dyn ExchangeClient,
    store: &dyn Store,
    config: &ExecutorConfig,
) -> bool {
    info!(position_id = %signal.position_id, legs = signal.legs.len(), "live: placing orders");

    let placements = signal.legs.iter().map(|leg| {
        exchange.place_order(&leg.token_id, OrderSide::Buy, leg.price, leg.size_tokens, leg.neg_risk)
    });

    let results = match timeout(
        Duration::from_secs(config.order_timeout_seconds),
        join_all(placements),
    )
    .await
    {
        Ok(results) => results,
        Err(_) => {
            error!(position_id = %signal.position_id, "timed out placing orders");
            record_failed_trade(signal, "order timeout", store).await;
            return false;
        }
    };

    let order_ids: Vec<String> = results
        .iter()
        .filter_map(|r| r.as_ref().ok().map(|fill| fill.order_id.clone()))
        .collect();

    if results.iter().any(Result::is_err) {
        error!(position_id = %signal.position_id, "failed to place some orders");
        cancel_all(&order_ids, exchange).await;
        record_failed_trade(signal, "partial fill", store).await;
        return false;
    }

    let mut orders = Vec::with_capacity(results.len());
    let mut total_slippage = Decimal::ZERO;
    let mut all_filled = true;
    for (leg, result) in signal.legs.iter().zip(results) {
        let fill = result.expect("checked for errors above");
        if fill.status != OrderStatus::Filled {
            all_filled = false;
            break;
        }

        let slippage = if leg.price.is_zero() {
            Decimal::ZERO
        } else {
            (fill.fill_price - leg.price) / leg.price * Decimal::from(100)
        };
        total_slippage += slippage;

        if slippage.abs() > config.max_slippage_pct {
            warn!(outcome = %leg.outcome, slippage = %slippage, "excessive slippage");
            all_filled = false;
            break;
        }

        orders.push(OrderFill {
            token_id: leg.token_id.clone(),
            order_id: fill.order_id,
            fill_price: fill.fill_price,
            size: fill.size,
            slippage_pct: slippage,
        });
    }

    if !all_filled || orders.len() != signal.legs.len() {
        error!(position_id = %signal.position_id, "fill verification failed");
        cancel_all(&order_ids, exchange).await;
        record_failed_trade(signal, "fill verification failed", store).await;
        return false;
    }

    let actual_total_cost: Decimal = orders.iter().map(|o| o.fill_price * o.size).sum();
    let actual_edge = (signal.expected_payout - actual_total_cost) * Decimal::from(100);
    let avg_slippage = total_slippage / Decimal::from(orders.len() as i64);

    position.mark_open(orders, actual_total_cost);
    if let Err(err) = store.update_position(position).await {
        error!(position_id = %signal.position_id, error = %err, "failed to persist opened position");
    }

    info!(
        position_id = %signal.position_id,
        cost = %actual_total_cost,
        edge = %actual_edge,
        avg_slippage = %avg_slippage,
        "live position filled"
    );

    let event = EventRecord::new(
        "trade_executed",
        EventLevel::Info,
        serde_json::json!({
            "module": "executor",
            "position_id": signal.position_id.to_string(),
            "strategy": signal.strategy.as_str(),
            "actual_total_cost": actual_total_cost.to_string(),
            "actual_edge": actual_edge.to_string(),
            "avg_slippage_pct": avg_slippage.to_string(),
        }),
    );
    if let Err(err) = store.log_event(event).await {
        error!(error = %err, "failed to log trade_executed event");
    }

    true
}
