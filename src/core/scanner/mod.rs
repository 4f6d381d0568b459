//! Scanner (C4): the three cooperating loops that turn exchange listings
//! into enriched market snapshots on the market queue.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use parking_lot::RwLock;
use rust_decimal::Decimal;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

use crate::core::domain::{Market, MarketId, Outcome, TokenId};
use crate::core::exchange::ExchangeClient;
use crate::core::metadata::{MarketSummary, MetadataClient};
use crate::core::signal_engine::is_late_candidate;
use crate::core::store::Store;

/// Cadences and thresholds the scanner's three loops run under.
#[derive(Debug, Clone)]
pub struct ScannerConfig {
    pub min_market_volume: Decimal,
    pub min_time_to_close_minutes: i64,
    pub scanner_interval_seconds: u64,
    pub watchlist_feeder_interval_seconds: u64,
    pub watchlist_horizon_seconds: i64,
    pub hot_loop_interval_ms: u64,
    pub late_market_window_start_secs: i64,
    pub late_market_window_end_secs: i64,
    pub enable_late_market: bool,
    pub market_queue_capacity: usize,
}

type WatchlistMap = Arc<RwLock<HashMap<MarketId, Market>>>;

/// Spawns the arb-scan loop, and (if late-market trading is enabled) the
/// watch-list feeder and hot loop, wiring all three onto one market queue.
pub fn spawn(
    config: ScannerConfig,
    metadata: Arc<dyn MetadataClient>,
    exchange: Arc<dyn ExchangeClient>,
    store: Arc<dyn Store>,
    shutdown: watch::Receiver<bool>,
) -> mpsc::Receiver<Market> {
    let (tx, rx) = mpsc::channel(config.market_queue_capacity);

    tokio::spawn(arb_scan_loop(
        config.clone(),
        metadata.clone(),
        exchange.clone(),
        store.clone(),
        tx.clone(),
        shutdown.clone(),
    ));

    if config.enable_late_market {
        let watchlist: WatchlistMap = Arc::new(RwLock::new(HashMap::new()));
        tokio::spawn(watchlist_feeder_loop(
            config.clone(),
            metadata,
            exchange.clone(),
            store,
            watchlist.clone(),
            shutdown.clone(),
        ));
        tokio::spawn(hot_loop(config, exchange, watchlist, tx, shutdown));
    }

    rx
}

async fn arb_scan_loop(
    config: ScannerConfig,
    metadata: Arc<dyn MetadataClient>,
    exchange: Arc<dyn ExchangeClient>,
    store: Arc<dyn Store>,
    market_tx: mpsc::Sender<Market>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(Duration::from_secs(config.scanner_interval_seconds));
    info!("arb scan loop started");
    loop {
        tokio::select! {
            _ = ticker.tick() => {},
            _ = shutdown.changed() => break,
        }
        if *shutdown.borrow() {
            break;
        }

        match metadata.list_markets(config.min_market_volume, 100).await {
            Ok(summaries) => {
                let mut passed = 0usize;
                for summary in summaries {
                    if !passes_basic_filters(&summary, &config) {
                        continue;
                    }
                    passed += 1;
                    let Some(market) = enrich(&summary, exchange.as_ref()).await else {
                        continue;
                    };
                    if let Err(err) = store.upsert_market(&market).await {
                        warn!(market_id = %market.market_id, error = %err, "failed to upsert market snapshot");
                    }
                    if market_tx.try_send(market).is_err() {
                        warn!("market queue full, dropping snapshot");
                    }
                }
                debug!(passed, "arb scan tick complete");
            }
            Err(err) => warn!(error = %err, "list_markets failed"),
        }
    }
    info!("arb scan loop stopped");
}

async fn watchlist_feeder_loop(
    config: ScannerConfig,
    metadata: Arc<dyn MetadataClient>,
    exchange: Arc<dyn ExchangeClient>,
    store: Arc<dyn Store>,
    watchlist: WatchlistMap,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker =
        tokio::time::interval(Duration::from_secs(config.watchlist_feeder_interval_seconds));
    info!(horizon_secs = config.watchlist_horizon_seconds, "watch-list feeder started");
    loop {
        tokio::select! {
            _ = ticker.tick() => {},
            _ = shutdown.changed() => break,
        }
        if *shutdown.borrow() {
            break;
        }

        let summaries = match metadata.list_markets(Decimal::ZERO, 100).await {
            Ok(summaries) => summaries,
            Err(err) => {
                warn!(error = %err, "watch-list metadata fetch failed");
                continue;
            }
        };

        let mut seen = std::collections::HashSet::new();
        for summary in &summaries {
            if !is_late_candidate(&summary.question) || !summary.active || !summary.accepting_orders {
                continue;
            }
            let Some(expires_at) = summary.expires_at else {
                continue;
            };
            let secs = (expires_at - Utc::now()).num_seconds();
            if !(0 < secs && secs <= config.watchlist_horizon_seconds) {
                continue;
            }
            let market_id = MarketId::new(summary.market_id.clone());
            seen.insert(market_id.clone());

            if !watchlist.read().contains_key(&market_id) {
                if let Some(market) = enrich(summary, exchange.as_ref()).await {
                    if let Err(err) = store.upsert_market(&market).await {
                        warn!(market_id = %market.market_id, error = %err, "failed to upsert market snapshot");
                    }
                    info!(question = %summary.question, secs_to_close = secs, "watch-list +add");
                    watchlist.write().insert(market_id, market);
                }
            }
        }

        watchlist.write().retain(|id, _| {
            let keep = seen.contains(id);
            if !keep {
                debug!(market_id = %id, "watch-list -remove");
            }
            keep
        });
    }
    info!("watch-list feeder stopped");
}

async fn hot_loop(
    config: ScannerConfig,
    exchange: Arc<dyn ExchangeClient>,
    watchlist: WatchlistMap,
    market_tx: mpsc::Sender<Market>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(Duration::from_millis(config.hot_loop_interval_ms));
    info!("hot loop started");
    loop {
        tokio::select! {
            _ = ticker.tick() => {},
            _ = shutdown.changed() => break,
        }
        if *shutdown.borrow() {
            break;
        }

        let candidates: Vec<(MarketId, Market)> = watchlist
            .read()
            .iter()
            .map(|(id, m)| (id.clone(), m.clone()))
            .collect();

        for (market_id, market) in candidates {
            let now = Utc::now();
            let secs = market.time_to_close(now);
            if secs <= 0 {
                watchlist.write().remove(&market_id);
                continue;
            }
            if !(config.late_market_window_end_secs..=config.late_market_window_start_secs)
                .contains(&secs)
            {
                continue;
            }

            let refreshed = refresh_orderbooks(&market, exchange.as_ref()).await;
            watchlist.write().insert(market_id, refreshed.clone());
            if market_tx.try_send(refreshed).is_err() {
                warn!("market queue full, dropping hot-loop snapshot");
            }
        }
    }
    info!("hot loop stopped");
}

fn passes_basic_filters(summary: &MarketSummary, config: &ScannerConfig) -> bool {
    if !summary.active {
        return false;
    }
    if summary.volume < config.min_market_volume {
        return false;
    }
    let Some(expires_at) = summary.expires_at else {
        return false;
    };
    let seconds_to_close = (expires_at - Utc::now()).num_seconds();
    if seconds_to_close < config.min_time_to_close_minutes * 60 {
        return false;
    }
    summary.outcomes.len() >= 2
}

async fn enrich(summary: &MarketSummary, exchange: &dyn ExchangeClient) -> Option<Market> {
    if summary.outcomes.len() != summary.token_ids.len() {
        debug!(
            market_id = summary.market_id,
            outcomes = summary.outcomes.len(),
            tokens = summary.token_ids.len(),
            "dropping market: outcome/token-id mismatch"
        );
        return None;
    }

    let mut outcomes = Vec::with_capacity(summary.outcomes.len());
    let mut token_ids = Vec::with_capacity(summary.outcomes.len());
    for (name, token_id) in summary.outcomes.iter().zip(&summary.token_ids) {
        let token_id = TokenId::new(token_id.clone());
        let orderbook = exchange.orderbook(&token_id).await;
        token_ids.push(token_id.clone());
        outcomes.push(Outcome {
            name: name.clone(),
            token_id,
            orderbook,
        });
    }

    let expires_at = summary.expires_at?;
    let is_late_candidate = is_late_candidate(&summary.question);

    Market::try_new(
        MarketId::new(summary.market_id.clone()),
        summary.condition_id.clone(),
        summary.question.clone(),
        expires_at,
        summary.volume,
        summary.liquidity,
        summary.neg_risk,
        outcomes,
        &token_ids,
        is_late_candidate,
        summary.accepting_orders,
        summary.active,
    )
    .map_err(|err| {
        debug!(market_id = summary.market_id, error = %err, "dropping malformed snapshot");
        err
    })
    .ok()
}

async fn refresh_orderbooks(market: &Market, exchange: &dyn ExchangeClient) -> Market {
    let mut refreshed = market.clone();
    for outcome in &mut refreshed.outcomes {
        outcome.orderbook = exchange.orderbook(&outcome.token_id).await;
    }
    refreshed
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn config() -> ScannerConfig {
        ScannerConfig {
            min_market_volume: dec!(1000),
            min_time_to_close_minutes: 5,
            scanner_interval_seconds: 5,
            watchlist_feeder_interval_seconds: 10,
            watchlist_horizon_seconds: 300,
            hot_loop_interval_ms: 500,
            late_market_window_start_secs: 180,
            late_market_window_end_secs: 60,
            enable_late_market: true,
            market_queue_capacity: 1000,
        }
    }

    fn summary() -> MarketSummary {
        MarketSummary {
            market_id: "m1".into(),
            condition_id: "m1".into(),
            question: "Will it rain?".into(),
            volume: dec!(5000),
            liquidity: dec!(5000),
            expires_at: Some(Utc::now() + chrono::Duration::hours(1)),
            neg_risk: false,
            active: true,
            accepting_orders: true,
            outcomes: vec!["Yes".into(), "No".into()],
            token_ids: vec!["t1".into(), "t2".into()],
        }
    }

    #[test]
    fn rejects_inactive_market() {
        let mut s = summary();
        s.active = false;
        assert!(!passes_basic_filters(&s, &config()));
    }

    #[test]
    fn rejects_low_volume() {
        let mut s = summary();
        s.volume = dec!(10);
        assert!(!passes_basic_filters(&s, &config()));
    }

    #[test]
    fn rejects_closing_too_soon() {
        let mut s = summary();
        s.expires_at = Some(Utc::now() + chrono::Duration::seconds(10));
        assert!(!passes_basic_filters(&s, &config()));
    }

    #[test]
    fn accepts_well_formed_summary() {
        assert!(passes_basic_filters(&summary(), &config()));
    }
}
