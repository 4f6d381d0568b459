//! Persistence layer: positions, the daily PnL rollup, and the append-only
//! event log the executor and resolver write to and the CLI reads from.

pub mod memory;
pub mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::core::domain::{DailyPnl, Market, Position, PositionId};
use crate::error::Result;

/// Severity of a logged event, mirrored 1:1 onto a `tracing` level at the
/// call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventLevel {
    Info,
    Warning,
    Error,
}

impl EventLevel {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
        }
    }
}

/// One row appended to the event log, the audit trail of trade lifecycle
/// events (`trade_executed`, `trade_failed`, `position_resolved`, `risk_halt`, ...).
#[derive(Debug, Clone)]
pub struct EventRecord {
    pub timestamp: DateTime<Utc>,
    pub event_type: String,
    pub level: EventLevel,
    pub details: serde_json::Value,
}

impl EventRecord {
    #[must_use]
    pub fn new(event_type: impl Into<String>, level: EventLevel, details: serde_json::Value) -> Self {
        Self {
            timestamp: Utc::now(),
            event_type: event_type.into(),
            level,
            details,
        }
    }
}

/// Serializable mirror of [`crate::core::domain::PositionLeg`] for the
/// `legs_json` column - the domain type stays free of serde so it can keep
/// evolving independently of the on-disk shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LegDto {
    pub outcome: String,
    pub token_id: String,
    pub size_tokens: Decimal,
    pub entry_price: Decimal,
}

/// Serializable mirror of [`crate::core::domain::OrderFill`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderFillDto {
    pub token_id: String,
    pub order_id: String,
    pub fill_price: Decimal,
    pub size: Decimal,
    pub slippage_pct: Decimal,
}

/// Durable mirror of the risk guard's sticky-halt flag. The guard's own
/// state lives in-process; this is the copy the `status`/`resume` CLI
/// commands read and clear out-of-process.
#[derive(Debug, Clone, Default)]
pub struct HaltRecord {
    pub halted: bool,
    pub reason: String,
}

/// Storage backend for positions, the daily PnL rollup, and the event log.
///
/// Implemented by [`SqliteStore`] (production) and [`MemoryStore`] (tests
/// and dry-run-only deployments that don't need durability across restarts).
#[async_trait]
pub trait Store: Send + Sync {
    async fn save_position(&self, position: &Position) -> Result<()>;
    async fn update_position(&self, position: &Position) -> Result<()>;
    async fn get_position(&self, id: &PositionId) -> Result<Option<Position>>;
    async fn open_positions(&self) -> Result<Vec<Position>>;
    async fn count_open_positions(&self) -> Result<usize>;

    async fn get_daily_pnl(&self, date: NaiveDate) -> Result<Option<DailyPnl>>;
    async fn upsert_daily_pnl(&self, pnl: &DailyPnl) -> Result<()>;

    async fn log_event(&self, event: EventRecord) -> Result<()>;

    /// Persist a market snapshot for audit/replay. Best-effort: a snapshot
    /// is never read back by the trading pipeline itself.
    async fn upsert_market(&self, market: &Market) -> Result<()>;

    async fn get_halt_state(&self) -> Result<HaltRecord>;
    async fn set_halt_state(&self, halted: bool, reason: &str) -> Result<()>;
}
