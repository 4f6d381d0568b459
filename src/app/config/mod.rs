//! Application configuration loading and validation.
//!
//! Configuration is loaded from a TOML file, with environment variable
//! overrides applied afterwards for values that should never live in a
//! checked-in file (exchange API credentials), followed by an explicit
//! [`Config::validate`] pass.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;
use std::path::Path;

use crate::core::executor::ExecutorConfig as CoreExecutorConfig;
use crate::core::resolver::ResolverConfig as CoreResolverConfig;
use crate::core::risk::RiskLimits;
use crate::core::scanner::ScannerConfig as CoreScannerConfig;
use crate::core::signal_engine::SignalEngineConfig as CoreSignalEngineConfig;
use crate::error::{ConfigError, Result};

mod logging;
mod polymarket;

pub use logging::LoggingConfig;
pub use polymarket::Environment;

/// Exchange connectivity: CLOB REST base URL (orders/orderbook) and the
/// market-metadata API base URL, plus credentials for live trading.
#[derive(Debug, Clone, Deserialize)]
pub struct ExchangeConfig {
    #[serde(default)]
    pub environment: Environment,
    #[serde(default = "default_clob_base_url")]
    pub clob_base_url: String,
    #[serde(default = "default_metadata_base_url")]
    pub metadata_base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub api_secret: Option<String>,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            environment: Environment::default(),
            clob_base_url: default_clob_base_url(),
            metadata_base_url: default_metadata_base_url(),
            api_key: None,
            api_secret: None,
        }
    }
}

fn default_clob_base_url() -> String {
    "https://clob.polymarket.com".into()
}

fn default_metadata_base_url() -> String {
    "https://gamma-api.polymarket.com".into()
}

/// SQLite-backed store location.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_database_url")]
    pub database_url: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_url: default_database_url(),
        }
    }
}

fn default_database_url() -> String {
    "arbiter.db".to_string()
}

/// Spot price feed (C1) connectivity.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    #[serde(default = "default_feed_ws_url")]
    pub ws_url: String,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            ws_url: default_feed_ws_url(),
        }
    }
}

fn default_feed_ws_url() -> String {
    "wss://stream.binance.com:9443/stream".into()
}

/// Risk limits as an operator edits them: percentages of bankroll rather
/// than absolute dollar figures. [`RiskConfig::to_limits`] derives the
/// [`RiskLimits`] the risk guard actually enforces.
#[derive(Debug, Clone, Deserialize)]
pub struct RiskConfig {
    pub bankroll: Decimal,
    #[serde(default = "default_max_arb_position_pct")]
    pub max_arb_position_pct: Decimal,
    #[serde(default = "default_max_late_position_pct")]
    pub max_late_position_pct: Decimal,
    #[serde(default = "default_max_daily_exposure_pct")]
    pub max_daily_exposure_pct: Decimal,
    #[serde(default = "default_max_concurrent_positions")]
    pub max_concurrent_positions: usize,
    #[serde(default = "default_daily_loss_halt_pct")]
    pub daily_loss_halt_pct: Decimal,
    #[serde(default = "default_max_consecutive_fails")]
    pub max_consecutive_fails: u32,
}

fn default_max_arb_position_pct() -> Decimal {
    dec!(10)
}
fn default_max_late_position_pct() -> Decimal {
    dec!(5)
}
fn default_max_daily_exposure_pct() -> Decimal {
    dec!(50)
}
const fn default_max_concurrent_positions() -> usize {
    10
}
fn default_daily_loss_halt_pct() -> Decimal {
    dec!(20)
}
const fn default_max_consecutive_fails() -> u32 {
    3
}

impl RiskConfig {
    #[must_use]
    pub fn to_limits(&self) -> RiskLimits {
        RiskLimits {
            bankroll: self.bankroll,
            max_arb_position_size: self.bankroll * self.max_arb_position_pct / dec!(100),
            max_late_position_size: self.bankroll * self.max_late_position_pct / dec!(100),
            max_daily_exposure: self.bankroll * self.max_daily_exposure_pct / dec!(100),
            max_concurrent_positions: self.max_concurrent_positions,
            daily_loss_halt_amount: self.bankroll * self.daily_loss_halt_pct / dec!(100),
            max_consecutive_fails: self.max_consecutive_fails,
        }
    }
}

/// Per-detector thresholds and feature flags for the signal engine (C5).
#[derive(Debug, Clone, Deserialize)]
pub struct StrategiesConfig {
    #[serde(default = "default_true")]
    pub enable_one_of_many: bool,
    #[serde(default = "default_true")]
    pub enable_yes_no: bool,
    #[serde(default = "default_true")]
    pub enable_late_market: bool,
    #[serde(default)]
    pub late_market_only: bool,

    #[serde(default = "default_min_arb_edge_pct")]
    pub min_arb_edge_pct: Decimal,
    #[serde(default = "default_max_spread_one_of_many")]
    pub max_spread_one_of_many: Decimal,
    #[serde(default = "default_max_spread_yes_no")]
    pub max_spread_yes_no: Decimal,
    #[serde(default = "default_max_spread_late_market")]
    pub max_spread_late_market: Decimal,
    #[serde(default = "default_orderbook_depth_levels")]
    pub orderbook_depth_levels: usize,

    #[serde(default = "default_late_market_window_start_secs")]
    pub late_market_window_start_secs: i64,
    #[serde(default = "default_late_market_window_end_secs")]
    pub late_market_window_end_secs: i64,
    #[serde(default = "default_late_market_min_deviation_pct")]
    pub late_market_min_deviation_pct: Decimal,
    #[serde(default = "default_late_market_max_volatility_pct")]
    pub late_market_max_volatility_pct: Decimal,
    #[serde(default = "default_late_market_max_price")]
    pub late_market_max_price: Decimal,
    #[serde(default = "default_late_market_volatility_window")]
    pub late_market_volatility_window: usize,
}

const fn default_true() -> bool {
    true
}
fn default_min_arb_edge_pct() -> Decimal {
    dec!(2)
}
fn default_max_spread_one_of_many() -> Decimal {
    dec!(5)
}
fn default_max_spread_yes_no() -> Decimal {
    dec!(5)
}
fn default_max_spread_late_market() -> Decimal {
    dec!(5)
}
const fn default_orderbook_depth_levels() -> usize {
    10
}
const fn default_late_market_window_start_secs() -> i64 {
    180
}
const fn default_late_market_window_end_secs() -> i64 {
    60
}
fn default_late_market_min_deviation_pct() -> Decimal {
    dec!(0.1)
}
fn default_late_market_max_volatility_pct() -> Decimal {
    dec!(1)
}
fn default_late_market_max_price() -> Decimal {
    dec!(0.9)
}
const fn default_late_market_volatility_window() -> usize {
    30
}

impl Default for StrategiesConfig {
    fn default() -> Self {
        Self {
            enable_one_of_many: true,
            enable_yes_no: true,
            enable_late_market: true,
            late_market_only: false,
            min_arb_edge_pct: default_min_arb_edge_pct(),
            max_spread_one_of_many: default_max_spread_one_of_many(),
            max_spread_yes_no: default_max_spread_yes_no(),
            max_spread_late_market: default_max_spread_late_market(),
            orderbook_depth_levels: default_orderbook_depth_levels(),
            late_market_window_start_secs: default_late_market_window_start_secs(),
            late_market_window_end_secs: default_late_market_window_end_secs(),
            late_market_min_deviation_pct: default_late_market_min_deviation_pct(),
            late_market_max_volatility_pct: default_late_market_max_volatility_pct(),
            late_market_max_price: default_late_market_max_price(),
            late_market_volatility_window: default_late_market_volatility_window(),
        }
    }
}

/// Scanner (C4) cadences, filters, and watch-list horizon.
#[derive(Debug, Clone, Deserialize)]
pub struct ScannerSettingsConfig {
    #[serde(default = "default_min_market_volume")]
    pub min_market_volume: Decimal,
    #[serde(default = "default_min_time_to_close_minutes")]
    pub min_time_to_close_minutes: i64,
    #[serde(default = "default_scanner_interval_seconds")]
    pub scanner_interval_seconds: u64,
    #[serde(default = "default_watchlist_feeder_interval_seconds")]
    pub watchlist_feeder_interval_seconds: u64,
    #[serde(default = "default_watchlist_horizon_seconds")]
    pub watchlist_horizon_seconds: i64,
    #[serde(default = "default_hot_loop_interval_ms")]
    pub hot_loop_interval_ms: u64,
    #[serde(default = "default_market_queue_capacity")]
    pub market_queue_capacity: usize,
}

fn default_min_market_volume() -> Decimal {
    dec!(1000)
}
const fn default_min_time_to_close_minutes() -> i64 {
    5
}
const fn default_scanner_interval_seconds() -> u64 {
    5
}
const fn default_watchlist_feeder_interval_seconds() -> u64 {
    10
}
const fn default_watchlist_horizon_seconds() -> i64 {
    300
}
const fn default_hot_loop_interval_ms() -> u64 {
    500
}
const fn default_market_queue_capacity() -> usize {
    1000
}

impl Default for ScannerSettingsConfig {
    fn default() -> Self {
        Self {
            min_market_volume: default_min_market_volume(),
            min_time_to_close_minutes: default_min_time_to_close_minutes(),
            scanner_interval_seconds: default_scanner_interval_seconds(),
            watchlist_feeder_interval_seconds: default_watchlist_feeder_interval_seconds(),
            watchlist_horizon_seconds: default_watchlist_horizon_seconds(),
            hot_loop_interval_ms: default_hot_loop_interval_ms(),
            market_queue_capacity: default_market_queue_capacity(),
        }
    }
}

/// Executor (C7) settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ExecutorSettingsConfig {
    #[serde(default = "default_order_timeout_seconds")]
    pub order_timeout_seconds: u64,
    #[serde(default = "default_max_slippage_pct")]
    pub max_slippage_pct: Decimal,
}

const fn default_order_timeout_seconds() -> u64 {
    5
}
fn default_max_slippage_pct() -> Decimal {
    dec!(0.3)
}

impl Default for ExecutorSettingsConfig {
    fn default() -> Self {
        Self {
            order_timeout_seconds: default_order_timeout_seconds(),
            max_slippage_pct: default_max_slippage_pct(),
        }
    }
}

/// Position resolver (C8) settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ResolverSettingsConfig {
    #[serde(default = "default_resolver_interval_seconds")]
    pub resolver_interval_seconds: u64,
}

const fn default_resolver_interval_seconds() -> u64 {
    60
}

impl Default for ResolverSettingsConfig {
    fn default() -> Self {
        Self {
            resolver_interval_seconds: default_resolver_interval_seconds(),
        }
    }
}

/// Main application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub exchange: ExchangeConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub feed: FeedConfig,
    pub risk: RiskConfig,
    #[serde(default)]
    pub strategies: StrategiesConfig,
    #[serde(default)]
    pub scanner: ScannerSettingsConfig,
    #[serde(default)]
    pub executor: ExecutorSettingsConfig,
    #[serde(default)]
    pub resolver: ResolverSettingsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Detect opportunities and record positions, but never submit live
    /// orders to the exchange.
    #[serde(default)]
    pub dry_run: bool,
}

impl Config {
    #[allow(clippy::result_large_err)]
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        let mut config: Self = toml::from_str(&content).map_err(ConfigError::Parse)?;

        if let Ok(key) = std::env::var("EXCHANGE_API_KEY") {
            config.exchange.api_key = Some(key);
        }
        if let Ok(secret) = std::env::var("EXCHANGE_API_SECRET") {
            config.exchange.api_secret = Some(secret);
        }

        config.validate()?;
        Ok(config)
    }

    #[allow(clippy::result_large_err)]
    fn validate(&self) -> Result<()> {
        if self.exchange.clob_base_url.is_empty() {
            return Err(ConfigError::MissingField { field: "exchange.clob_base_url" }.into());
        }
        if self.exchange.metadata_base_url.is_empty() {
            return Err(ConfigError::MissingField { field: "exchange.metadata_base_url" }.into());
        }
        if self.feed.ws_url.is_empty() {
            return Err(ConfigError::MissingField { field: "feed.ws_url" }.into());
        }
        if self.store.database_url.is_empty() {
            return Err(ConfigError::MissingField { field: "store.database_url" }.into());
        }

        if self.risk.bankroll <= Decimal::ZERO {
            return Err(ConfigError::InvalidValue {
                field: "risk.bankroll",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        for (field, pct) in [
            ("risk.max_arb_position_pct", self.risk.max_arb_position_pct),
            ("risk.max_late_position_pct", self.risk.max_late_position_pct),
            ("risk.max_daily_exposure_pct", self.risk.max_daily_exposure_pct),
            ("risk.daily_loss_halt_pct", self.risk.daily_loss_halt_pct),
        ] {
            if pct <= Decimal::ZERO || pct > dec!(100) {
                return Err(ConfigError::InvalidValue {
                    field,
                    reason: "must be between 0 (exclusive) and 100".to_string(),
                }
                .into());
            }
        }
        if self.risk.max_concurrent_positions == 0 {
            return Err(ConfigError::InvalidValue {
                field: "risk.max_concurrent_positions",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if self.risk.max_consecutive_fails == 0 {
            return Err(ConfigError::InvalidValue {
                field: "risk.max_consecutive_fails",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }

        if self.strategies.min_arb_edge_pct < Decimal::ZERO {
            return Err(ConfigError::InvalidValue {
                field: "strategies.min_arb_edge_pct",
                reason: "must be 0 or greater".to_string(),
            }
            .into());
        }
        if self.strategies.late_market_window_end_secs >= self.strategies.late_market_window_start_secs {
            return Err(ConfigError::InvalidValue {
                field: "strategies.late_market_window_start_secs",
                reason: "must be greater than late_market_window_end_secs".to_string(),
            }
            .into());
        }

        if self.scanner.scanner_interval_seconds == 0 {
            return Err(ConfigError::InvalidValue {
                field: "scanner.scanner_interval_seconds",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if self.scanner.market_queue_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                field: "scanner.market_queue_capacity",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }

        if self.executor.order_timeout_seconds == 0 {
            return Err(ConfigError::InvalidValue {
                field: "executor.order_timeout_seconds",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if self.executor.max_slippage_pct < Decimal::ZERO {
            return Err(ConfigError::InvalidValue {
                field: "executor.max_slippage_pct",
                reason: "must be 0 or greater".to_string(),
            }
            .into());
        }

        if self.resolver.resolver_interval_seconds == 0 {
            return Err(ConfigError::InvalidValue {
                field: "resolver.resolver_interval_seconds",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }

        Ok(())
    }

    /// Derives the absolute [`RiskLimits`] from the percentage-based
    /// configuration and the configured bankroll.
    #[must_use]
    pub fn risk_limits(&self) -> RiskLimits {
        self.risk.to_limits()
    }

    #[must_use]
    pub fn signal_engine_config(&self) -> CoreSignalEngineConfig {
        let limits = self.risk_limits();
        CoreSignalEngineConfig {
            enable_one_of_many: self.strategies.enable_one_of_many,
            enable_yes_no: self.strategies.enable_yes_no,
            enable_late_market: self.strategies.enable_late_market,
            late_market_only: self.strategies.late_market_only,
            max_arb_position_size: limits.max_arb_position_size,
            max_late_position_size: limits.max_late_position_size,
            min_arb_edge_pct: self.strategies.min_arb_edge_pct,
            min_time_to_close_minutes: self.scanner.min_time_to_close_minutes,
            max_spread_one_of_many: self.strategies.max_spread_one_of_many,
            max_spread_yes_no: self.strategies.max_spread_yes_no,
            max_spread_late_market: self.strategies.max_spread_late_market,
            orderbook_depth_levels: self.strategies.orderbook_depth_levels,
            late_market_window_start_secs: self.strategies.late_market_window_start_secs,
            late_market_window_end_secs: self.strategies.late_market_window_end_secs,
            late_market_min_deviation_pct: self.strategies.late_market_min_deviation_pct,
            late_market_max_volatility_pct: self.strategies.late_market_max_volatility_pct,
            late_market_max_price: self.strategies.late_market_max_price,
            late_market_volatility_window: self.strategies.late_market_volatility_window,
        }
    }

    #[must_use]
    pub fn scanner_config(&self) -> CoreScannerConfig {
        CoreScannerConfig {
            min_market_volume: self.scanner.min_market_volume,
            min_time_to_close_minutes: self.scanner.min_time_to_close_minutes,
            scanner_interval_seconds: self.scanner.scanner_interval_seconds,
            watchlist_feeder_interval_seconds: self.scanner.watchlist_feeder_interval_seconds,
            watchlist_horizon_seconds: self.scanner.watchlist_horizon_seconds,
            hot_loop_interval_ms: self.scanner.hot_loop_interval_ms,
            late_market_window_start_secs: self.strategies.late_market_window_start_secs,
            late_market_window_end_secs: self.strategies.late_market_window_end_secs,
            enable_late_market: self.strategies.enable_late_market,
            market_queue_capacity: self.scanner.market_queue_capacity,
        }
    }

    #[must_use]
    pub fn executor_config(&self) -> CoreExecutorConfig {
        CoreExecutorConfig {
            dry_run: self.dry_run,
            order_timeout_seconds: self.executor.order_timeout_seconds,
            max_slippage_pct: self.executor.max_slippage_pct,
        }
    }

    #[must_use]
    pub fn resolver_config(&self) -> CoreResolverConfig {
        CoreResolverConfig {
            poll_interval_seconds: self.resolver.resolver_interval_seconds,
        }
    }

    /// Initialize logging with the configured settings.
    pub fn init_logging(&self) {
        self.logging.init();
    }
}
