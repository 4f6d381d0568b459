//! App orchestration: wires C1-C8 together and runs them until shutdown.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tracing::info;

use crate::app::config::Config;
use crate::core::db;
use crate::core::exchange::polymarket::PolymarketExchange;
use crate::core::exchange::ExchangeClient;
use crate::core::executor;
use crate::core::feed::{self, PriceFeed};
use crate::core::metadata::{HttpMetadataClient, MetadataClient};
use crate::core::resolver;
use crate::core::risk::RiskGuard;
use crate::core::scanner;
use crate::core::signal_engine::{self, SignalEngine};
use crate::core::store::{SqliteStore, Store};
use crate::error::Result;

/// Bounded capacity of the signal queue (engine -> executor). The market
/// queue capacity is configurable (`scanner.market_queue_capacity`); this one
/// is not, since signals are already post-filter and much rarer.
const SIGNAL_QUEUE_CAPACITY: usize = 100;

/// Owns nothing itself; `run`/`run_with_shutdown` build every component in
/// dependency order and hand them off to their own tasks.
pub struct Orchestrator;

impl Orchestrator {
    /// Runs until a `SIGINT`/`SIGTERM` is wired up by the caller through the
    /// returned shutdown sender, or forever if none ever fires.
    pub async fn run(config: Config) -> Result<()> {
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        Self::run_with_shutdown(config, shutdown_rx).await
    }

    pub async fn run_with_shutdown(config: Config, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        info!(dry_run = config.dry_run, "starting arbiter");

        let db_url = format!("sqlite://{}", config.store.database_url);
        let pool = db::create_pool(&db_url)?;
        let store: Arc<dyn Store> = Arc::new(SqliteStore::new(pool));
        info!(database = %config.store.database_url, "store initialized");

        let exchange: Arc<dyn ExchangeClient> =
            Arc::new(PolymarketExchange::new(config.exchange.clob_base_url.clone()));
        let metadata: Arc<dyn MetadataClient> =
            Arc::new(HttpMetadataClient::new(config.exchange.metadata_base_url.clone()));

        let risk_guard = Arc::new(RiskGuard::new(config.risk_limits()));
        let durable_halt = store.get_halt_state().await?;
        if durable_halt.halted {
            risk_guard.seed_halt(durable_halt.reason.clone());
            info!(reason = %durable_halt.reason, "resuming with a halt carried over from the last run");
        }
        info!("risk guard initialized");

        let feed = PriceFeed::new();
        {
            let feed = feed.clone();
            let ws_url = config.feed.ws_url.clone();
            let shutdown = shutdown.clone();
            tokio::spawn(async move {
                feed::run(feed, &ws_url, shutdown).await;
            });
        }

        let market_rx = scanner::spawn(
            config.scanner_config(),
            metadata.clone(),
            exchange.clone(),
            store.clone(),
            shutdown.clone(),
        );
        info!("scanner started");

        let (signal_tx, signal_rx) = mpsc::channel(SIGNAL_QUEUE_CAPACITY);
        let engine = SignalEngine::new(config.signal_engine_config());
        tokio::spawn(signal_engine::run(engine, feed, market_rx, signal_tx));
        info!("signal engine started");

        {
            let executor_config = config.executor_config();
            let risk_guard = risk_guard.clone();
            let exchange = exchange.clone();
            let store = store.clone();
            tokio::spawn(async move {
                executor::run(
                    signal_rx,
                    risk_guard.as_ref(),
                    exchange.as_ref(),
                    store.as_ref(),
                    &executor_config,
                )
                .await;
            });
        }
        info!("executor started");

        {
            let resolver_config = config.resolver_config();
            let metadata = metadata.clone();
            let store = store.clone();
            let risk_guard = risk_guard.clone();
            let shutdown = shutdown.clone();
            tokio::spawn(async move {
                resolver::run(
                    resolver_config,
                    metadata.as_ref(),
                    store.as_ref(),
                    risk_guard.as_ref(),
                    shutdown,
                )
                .await;
            });
        }
        info!("position resolver started");

        info!("all components running, awaiting shutdown signal");
        let _ = shutdown.changed().await;
        info!("shutdown signal received, draining");

        Ok(())
    }
}
