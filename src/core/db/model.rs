//! Database row types for Diesel ORM, mapped to and from the domain layer
//! by the store implementations in `crate::core::store`.

use diesel::prelude::*;

use super::schema::{events_log, halt_state, markets, pnl_daily, positions};

/// Row for a scanned market snapshot (audit trail only; the scanner never
/// reads markets back out of the store).
#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = markets)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct MarketRow {
    pub market_id: String,
    pub condition_id: String,
    pub question: String,
    pub expires_at: String,
    pub volume: String,
    pub liquidity: String,
    pub active: bool,
    pub last_scanned_at: String,
}

/// Row for a position. Legs and fills are stored as JSON text; every other
/// money/decimal field is stored as text to avoid float round-tripping.
#[derive(Queryable, Selectable, Insertable, AsChangeset, Debug, Clone)]
#[diesel(table_name = positions)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct PositionRow {
    pub id: String,
    pub market_id: String,
    pub strategy: String,
    pub legs_json: String,
    pub orders_json: String,
    pub expected_edge: String,
    pub actual_total_cost: String,
    pub opened_at: String,
    pub status: String,
    pub closed_at: Option<String>,
    pub realized_pnl: Option<String>,
    pub winner: Option<String>,
    pub failure_reason: Option<String>,
}

/// Row for the daily PnL rollup.
#[derive(Queryable, Selectable, Insertable, AsChangeset, Debug, Clone)]
#[diesel(table_name = pnl_daily)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct PnlDailyRow {
    pub date: String,
    pub total_pnl: String,
    pub total_trades: i32,
    pub winning_trades: i32,
    pub strategy_pnl_json: String,
    pub updated_at: String,
}

/// Row for an append-only event (insertable; `id` is autoincrement).
#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = events_log)]
pub struct NewEventRow {
    pub timestamp: String,
    pub event_type: String,
    pub level: String,
    pub details_json: String,
}

/// Row for an event as read back out.
#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = events_log)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct EventRow {
    pub id: Option<i32>,
    pub timestamp: String,
    pub event_type: String,
    pub level: String,
    pub details_json: String,
}

/// Singleton row (`id` always 0) mirroring the risk guard's sticky-halt
/// flag, so `status`/`resume` can read and clear it without talking to a
/// running process.
#[derive(Queryable, Selectable, Insertable, AsChangeset, Debug, Clone)]
#[diesel(table_name = halt_state)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct HaltStateRow {
    pub id: i32,
    pub halted: bool,
    pub reason: String,
}
