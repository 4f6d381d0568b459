//! End-to-end: a trade signal moves through the risk guard and executor into
//! the store, then the resolver closes it out once the market settles.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use arbiter::core::domain::{
    MarketId, OrderBook, PositionId, PositionStatus, SignalLeg, Strategy, TokenId, TradeSignal,
};
use arbiter::core::exchange::{ExchangeClient, Fill, OrderSide, OrderStatus};
use arbiter::core::executor::{execute_signal, ExecutorConfig};
use arbiter::core::metadata::{MarketResolution, MarketSummary, MetadataClient};
use arbiter::core::resolver::{self, ResolverConfig};
use arbiter::core::risk::{RiskGuard, RiskLimits};
use arbiter::core::store::{MemoryStore, Store};
use arbiter::error::Result;
use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tokio::sync::watch;

struct FillsAtQuote;

#[async_trait]
impl ExchangeClient for FillsAtQuote {
    async fn orderbook(&self, _token_id: &TokenId) -> OrderBook {
        OrderBook::empty()
    }

    async fn place_order(
        &self,
        _token_id: &TokenId,
        _side: OrderSide,
        price: Decimal,
        size: Decimal,
        _neg_risk: bool,
    ) -> Result<Fill> {
        Ok(Fill { order_id: "ord".into(), status: OrderStatus::Filled, fill_price: price, size })
    }

    async fn cancel_order(&self, _order_id: &str) {}
}

/// Rejects every order placed for one token id, so a signal referencing it
/// always fails execution.
struct RejectsToken {
    token: &'static str,
}

#[async_trait]
impl ExchangeClient for RejectsToken {
    async fn orderbook(&self, _token_id: &TokenId) -> OrderBook {
        OrderBook::empty()
    }

    async fn place_order(
        &self,
        token_id: &TokenId,
        _side: OrderSide,
        price: Decimal,
        size: Decimal,
        _neg_risk: bool,
    ) -> Result<Fill> {
        if token_id.as_str() == self.token {
            return Err(arbiter::error::Error::Exchange("rejected".into()));
        }
        Ok(Fill { order_id: "ord".into(), status: OrderStatus::Filled, fill_price: price, size })
    }

    async fn cancel_order(&self, _order_id: &str) {}
}

/// Reports the market unresolved until told otherwise, mimicking a resolver
/// tick that lands before settlement and one that lands after.
struct SettlesOnCommand {
    resolved: AtomicBool,
}

#[async_trait]
impl MetadataClient for SettlesOnCommand {
    async fn list_markets(&self, _min_volume: Decimal, _limit: usize) -> Result<Vec<MarketSummary>> {
        Ok(vec![])
    }

    async fn get_market(&self, _condition_id: &str) -> Result<MarketResolution> {
        if self.resolved.load(Ordering::SeqCst) {
            Ok(MarketResolution { resolved: true, winner: Some("YES".to_string()) })
        } else {
            Ok(MarketResolution { resolved: false, winner: None })
        }
    }
}

fn signal() -> TradeSignal {
    TradeSignal {
        strategy: Strategy::YesNo,
        position_id: PositionId::new("p-e2e"),
        market_id: MarketId::new("m-e2e"),
        question: "will it resolve yes".into(),
        legs: vec![
            SignalLeg {
                outcome: "YES".into(),
                token_id: TokenId::new("t-yes"),
                neg_risk: false,
                price: dec!(0.40),
                size_usd: dec!(40),
                size_tokens: dec!(100),
                spread_pct: dec!(1),
            },
            SignalLeg {
                outcome: "NO".into(),
                token_id: TokenId::new("t-no"),
                neg_risk: false,
                price: dec!(0.55),
                size_usd: dec!(55),
                size_tokens: dec!(100),
                spread_pct: dec!(1),
            },
        ],
        total_cost: dec!(95),
        expected_payout: dec!(100),
        expected_edge: dec!(5),
        expires_at: Utc::now() + chrono::Duration::hours(1),
        detected_at: Utc::now(),
        late_market: None,
    }
}

fn guard() -> RiskGuard {
    RiskGuard::new(RiskLimits {
        bankroll: dec!(1000),
        max_arb_position_size: dec!(200),
        max_late_position_size: dec!(100),
        max_daily_exposure: dec!(1000),
        max_concurrent_positions: 5,
        daily_loss_halt_amount: dec!(500),
        max_consecutive_fails: 5,
    })
}

#[tokio::test]
async fn signal_opens_a_position_and_resolver_closes_it_with_realized_pnl() {
    let store = MemoryStore::new();
    let exchange = FillsAtQuote;
    let guard = guard();
    let executor_config = ExecutorConfig { dry_run: false, order_timeout_seconds: 5, max_slippage_pct: dec!(1) };

    execute_signal(&signal(), &guard, &exchange, &store, &executor_config).await;

    let position = store.get_position(&PositionId::new("p-e2e")).await.unwrap().unwrap();
    assert!(position.status.is_open());
    assert_eq!(position.actual_total_cost, dec!(95));
    assert_eq!(guard.snapshot().open_positions, 1);
    assert_eq!(guard.snapshot().open_exposure, dec!(95));

    let metadata = SettlesOnCommand { resolved: AtomicBool::new(true) };
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);
    let resolver_config = ResolverConfig { poll_interval_seconds: 1 };

    // The interval ticks immediately on the first poll; race it against a
    // short sleep rather than waiting for a shutdown signal that never comes.
    tokio::select! {
        () = resolver::run(resolver_config, &metadata, &store, &guard, shutdown_rx) => {},
        () = tokio::time::sleep(Duration::from_millis(1500)) => {},
    }

    let resolved = store.get_position(&PositionId::new("p-e2e")).await.unwrap().unwrap();
    assert!(matches!(resolved.status, PositionStatus::Closed { .. }));
    assert_eq!(resolved.realized_pnl(), Some(dec!(5)));

    let pnl = store.get_daily_pnl(Utc::now().date_naive()).await.unwrap().unwrap();
    assert_eq!(pnl.total_trades, 1);
    assert_eq!(pnl.winning_trades, 1);

    // The resolver must free the risk guard's reservation on close, or the
    // slot and exposure leak forever even though the position is settled.
    let snapshot = guard.snapshot();
    assert_eq!(snapshot.open_positions, 0);
    assert_eq!(snapshot.open_exposure, dec!(0));
}

#[tokio::test]
async fn risk_guard_sticky_halt_blocks_subsequent_signals() {
    let store = MemoryStore::new();
    let exchange = RejectsToken { token: "t-no" };
    let guard = RiskGuard::new(RiskLimits {
        bankroll: dec!(1000),
        max_arb_position_size: dec!(200),
        max_late_position_size: dec!(100),
        max_daily_exposure: dec!(1000),
        max_concurrent_positions: 5,
        daily_loss_halt_amount: dec!(500),
        max_consecutive_fails: 1,
    });
    let mut failing_signal = signal();
    failing_signal.position_id = PositionId::new("p-fail");
    let executor_config = ExecutorConfig { dry_run: false, order_timeout_seconds: 5, max_slippage_pct: dec!(1) };

    execute_signal(&failing_signal, &guard, &exchange, &store, &executor_config).await;
    assert!(guard.snapshot().halted);
    assert!(store.get_halt_state().await.unwrap().halted);

    let mut second_signal = signal();
    second_signal.position_id = PositionId::new("p-blocked");
    execute_signal(&second_signal, &guard, &exchange, &store, &executor_config).await;

    let blocked = store.get_position(&PositionId::new("p-blocked")).await.unwrap().unwrap();
    assert!(matches!(blocked.status, PositionStatus::Failed { .. }));
}
