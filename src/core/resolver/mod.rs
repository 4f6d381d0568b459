//! Position resolver (C8): polls open positions against the metadata client
//! and closes out whichever ones have settled, crediting realized P&L.

use std::time::Duration;

use chrono::Utc;
use rust_decimal::Decimal;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::core::domain::{DailyPnl, Position};
use crate::core::metadata::MetadataClient;
use crate::core::risk::RiskGuard;
use crate::core::store::{EventLevel, EventRecord, Store};

/// Poll cadence for the resolver loop.
#[derive(Debug, Clone, Copy)]
pub struct ResolverConfig {
    pub poll_interval_seconds: u64,
}

/// Runs the resolver loop until `shutdown` fires.
pub async fn run(
    config: ResolverConfig,
    metadata: &dyn MetadataClient,
    store: &dyn Store,
    risk_guard: &RiskGuard,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(Duration::from_secs(config.poll_interval_seconds));
    info!(interval_secs = config.poll_interval_seconds, "position resolver started");
    loop {
        tokio::select! {
            _ = ticker.tick() => {},
            _ = shutdown.changed() => break,
        }
        if *shutdown.borrow() {
            break;
        }

        if let Err(err) = resolve_open_positions(metadata, store, risk_guard).await {
            error!(error = %err, "resolver tick failed");
        }
    }
    info!("position resolver stopped");
}

async fn resolve_open_positions(
    metadata: &dyn MetadataClient,
    store: &dyn Store,
    risk_guard: &RiskGuard,
) -> crate::error::Result<()> {
    let open_positions = store.open_positions().await?;
    if open_positions.is_empty() {
        debug!("no open positions to resolve");
        return Ok(());
    }
    debug!(count = open_positions.len(), "checking open positions for resolution");

    for position in open_positions {
        if let Err(err) = check_and_resolve(&position, metadata, store, risk_guard).await {
            warn!(position_id = %position.id, error = %err, "error resolving position");
        }
    }
    Ok(())
}

async fn check_and_resolve(
    position: &Position,
    metadata: &dyn MetadataClient,
    store: &dyn Store,
    risk_guard: &RiskGuard,
) -> crate::error::Result<()> {
    let resolution = metadata.get_market(position.market_id.as_str()).await?;
    if !resolution.resolved {
        return Ok(());
    }
    let Some(winner) = resolution.winner else {
        debug!(market_id = %position.market_id, "market resolved but no winner field yet");
        return Ok(());
    };

    let pnl = calculate_pnl(position, &winner);
    let now = Utc::now();

    let mut closed = position.clone();
    closed.close(now, pnl, winner.clone())?;
    store.update_position(&closed).await?;
    risk_guard.release(position.actual_total_cost);

    update_daily_pnl(store, position.strategy.as_str(), pnl, now).await?;
    risk_guard.record_result(position.strategy, pnl >= Decimal::ZERO, Some(pnl));

    let sign = if pnl >= Decimal::ZERO { "+" } else { "" };
    info!(
        position_id = %position.id,
        strategy = %position.strategy,
        winner = %winner,
        pnl = %pnl,
        "resolved: {sign}{pnl}"
    );

    let event = EventRecord::new(
        "position_resolved",
        if pnl >= Decimal::ZERO { EventLevel::Info } else { EventLevel::Warning },
        serde_json::json!({
            "module": "position_resolver",
            "position_id": position.id.to_string(),
            "strategy": position.strategy.as_str(),
            "winner": winner,
            "realized_pnl": pnl.to_string(),
        }),
    );
    store.log_event(event).await?;

    Ok(())
}

/// Realized P&L for a resolved position.
///
/// `one_of_many` / `yes_no`: every outcome was bought, exactly one pays
/// $1/token and the rest expire worthless - profit is the winning leg's
/// tokens minus the total cost across all legs. `late_market`: a single
/// leg was bought; it either pays $1/token or expires worthless.
fn calculate_pnl(position: &Position, winner: &str) -> Decimal {
    let Some(winning_leg) = position.leg_named(winner) else {
        warn!(
            position_id = %position.id,
            winner,
            "no leg matched the winning outcome, treating as total loss"
        );
        return -position.actual_total_cost;
    };
    winning_leg.size_tokens - position.actual_total_cost
}

async fn update_daily_pnl(
    store: &dyn Store,
    strategy: &str,
    pnl: Decimal,
    now: chrono::DateTime<Utc>,
) -> crate::error::Result<()> {
    let today = now.date_naive();
    let mut rollup = store.get_daily_pnl(today).await?.unwrap_or_else(|| DailyPnl::new(today));
    rollup.record(strategy, pnl, now);
    store.upsert_daily_pnl(&rollup).await
}
