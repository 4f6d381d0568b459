//! SQLite store implementation using Diesel.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use rust_decimal::Decimal;

use super::{EventRecord, HaltRecord, LegDto, OrderFillDto, Store};
use crate::core::db::model::{HaltStateRow, MarketRow, NewEventRow, PnlDailyRow, PositionRow};
use crate::core::db::schema::{events_log, halt_state, markets, pnl_daily, positions};
use crate::core::db::DbPool;
use crate::core::domain::{
    DailyPnl, Market, OrderFill, Position, PositionId, PositionLeg, PositionStatus, Strategy,
    TokenId,
};
use crate::error::{Error, Result};

/// SQLite-backed store.
pub struct SqliteStore {
    pool: DbPool,
}

impl SqliteStore {
    #[must_use]
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn strategy_from_str(value: &str) -> Result<Strategy> {
        match value {
            "one_of_many" => Ok(Strategy::OneOfMany),
            "yes_no" => Ok(Strategy::YesNo),
            "late_market" => Ok(Strategy::LateMarket),
            other => Err(Error::Store(format!("unknown strategy '{other}' in store row"))),
        }
    }

    fn position_to_row(position: &Position) -> Result<PositionRow> {
        let legs: Vec<LegDto> = position
            .legs
            .iter()
            .map(|leg| LegDto {
                outcome: leg.outcome.clone(),
                token_id: leg.token_id.as_str().to_string(),
                size_tokens: leg.size_tokens,
                entry_price: leg.entry_price,
            })
            .collect();
        let orders: Vec<OrderFillDto> = position
            .orders
            .iter()
            .map(|fill| OrderFillDto {
                token_id: fill.token_id.as_str().to_string(),
                order_id: fill.order_id.clone(),
                fill_price: fill.fill_price,
                size: fill.size,
                slippage_pct: fill.slippage_pct,
            })
            .collect();

        let (status, closed_at, realized_pnl, winner, failure_reason) = match &position.status {
            PositionStatus::Pending => ("pending", None, None, None, None),
            PositionStatus::Open => ("open", None, None, None, None),
            PositionStatus::Closed {
                closed_at,
                realized_pnl,
                winner,
            } => (
                "closed",
                Some(closed_at.to_rfc3339()),
                Some(realized_pnl.to_string()),
                Some(winner.clone()),
                None,
            ),
            PositionStatus::Failed { reason } => ("failed", None, None, None, Some(reason.clone())),
        };

        Ok(PositionRow {
            id: position.id.to_string(),
            market_id: position.market_id.to_string(),
            strategy: position.strategy.as_str().to_string(),
            legs_json: serde_json::to_string(&legs)?,
            orders_json: serde_json::to_string(&orders)?,
            expected_edge: position.expected_edge.to_string(),
            actual_total_cost: position.actual_total_cost.to_string(),
            opened_at: position.opened_at.to_rfc3339(),
            status: status.to_string(),
            closed_at,
            realized_pnl,
            winner,
            failure_reason,
        })
    }

    fn row_to_position(row: PositionRow) -> Result<Position> {
        let legs: Vec<LegDto> = serde_json::from_str(&row.legs_json)?;
        let orders: Vec<OrderFillDto> = serde_json::from_str(&row.orders_json)?;
        let strategy = Self::strategy_from_str(&row.strategy)?;
        let opened_at = parse_rfc3339(&row.opened_at)?;

        let legs = legs
            .into_iter()
            .map(|dto| PositionLeg {
                outcome: dto.outcome,
                token_id: TokenId::new(dto.token_id),
                size_tokens: dto.size_tokens,
                entry_price: dto.entry_price,
            })
            .collect();
        let orders = orders
            .into_iter()
            .map(|dto| OrderFill {
                token_id: TokenId::new(dto.token_id),
                order_id: dto.order_id,
                fill_price: dto.fill_price,
                size: dto.size,
                slippage_pct: dto.slippage_pct,
            })
            .collect();

        let actual_total_cost: Decimal = row
            .actual_total_cost
            .parse()
            .map_err(|_| Error::Store("invalid actual_total_cost in store row".into()))?;
        let expected_edge: Decimal = row
            .expected_edge
            .parse()
            .map_err(|_| Error::Store("invalid expected_edge in store row".into()))?;

        let status = match row.status.as_str() {
            "pending" => PositionStatus::Pending,
            "open" => PositionStatus::Open,
            "closed" => {
                let closed_at = parse_rfc3339(row.closed_at.as_deref().unwrap_or_default())?;
                let realized_pnl: Decimal = row
                    .realized_pnl
                    .as_deref()
                    .unwrap_or("0")
                    .parse()
                    .map_err(|_| Error::Store("invalid realized_pnl in store row".into()))?;
                PositionStatus::Closed {
                    closed_at,
                    realized_pnl,
                    winner: row.winner.unwrap_or_default(),
                }
            }
            "failed" => PositionStatus::Failed {
                reason: row.failure_reason.unwrap_or_default(),
            },
            other => return Err(Error::Store(format!("unknown position status '{other}'"))),
        };

        Ok(Position {
            id: PositionId::new(row.id),
            market_id: crate::core::domain::MarketId::new(row.market_id),
            strategy,
            legs,
            orders,
            expected_edge,
            actual_total_cost,
            opened_at,
            status,
        })
    }

    fn pnl_to_row(pnl: &DailyPnl) -> Result<PnlDailyRow> {
        Ok(PnlDailyRow {
            date: pnl.date.format("%Y-%m-%d").to_string(),
            total_pnl: pnl.total_pnl.to_string(),
            total_trades: i32::try_from(pnl.total_trades).unwrap_or(i32::MAX),
            winning_trades: i32::try_from(pnl.winning_trades).unwrap_or(i32::MAX),
            strategy_pnl_json: serde_json::to_string(&pnl.strategy_pnl)?,
            updated_at: pnl.updated_at.to_rfc3339(),
        })
    }

    fn row_to_pnl(row: PnlDailyRow) -> Result<DailyPnl> {
        let date = NaiveDate::parse_from_str(&row.date, "%Y-%m-%d")
            .map_err(|_| Error::Store("invalid date in pnl_daily row".into()))?;
        let total_pnl: Decimal = row
            .total_pnl
            .parse()
            .map_err(|_| Error::Store("invalid total_pnl in pnl_daily row".into()))?;
        let strategy_pnl = serde_json::from_str(&row.strategy_pnl_json)?;
        Ok(DailyPnl {
            date,
            total_pnl,
            total_trades: u32::try_from(row.total_trades).unwrap_or_default(),
            winning_trades: u32::try_from(row.winning_trades).unwrap_or_default(),
            strategy_pnl,
            updated_at: parse_rfc3339(&row.updated_at)?,
        })
    }
}

fn parse_rfc3339(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| Error::Store(format!("invalid timestamp '{value}' in store row")))
}

#[async_trait]
impl Store for SqliteStore {
    async fn save_position(&self, position: &Position) -> Result<()> {
        let row = Self::position_to_row(position)?;
        let mut conn = self.pool.get()?;
        diesel::replace_into(positions::table)
            .values(&row)
            .execute(&mut conn)?;
        Ok(())
    }

    async fn update_position(&self, position: &Position) -> Result<()> {
        let row = Self::position_to_row(position)?;
        let mut conn = self.pool.get()?;
        diesel::replace_into(positions::table)
            .values(&row)
            .execute(&mut conn)?;
        Ok(())
    }

    async fn get_position(&self, id: &PositionId) -> Result<Option<Position>> {
        let mut conn = self.pool.get()?;
        let row: Option<PositionRow> = positions::table
            .find(id.as_str())
            .first(&mut conn)
            .optional()?;
        row.map(Self::row_to_position).transpose()
    }

    async fn open_positions(&self) -> Result<Vec<Position>> {
        let mut conn = self.pool.get()?;
        let rows: Vec<PositionRow> = positions::table
            .filter(positions::status.eq("open"))
            .load(&mut conn)?;
        rows.into_iter().map(Self::row_to_position).collect()
    }

    async fn count_open_positions(&self) -> Result<usize> {
        let mut conn = self.pool.get()?;
        let count: i64 = positions::table
            .filter(positions::status.eq("open"))
            .count()
            .get_result(&mut conn)?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    async fn get_daily_pnl(&self, date: NaiveDate) -> Result<Option<DailyPnl>> {
        let mut conn = self.pool.get()?;
        let key = date.format("%Y-%m-%d").to_string();
        let row: Option<PnlDailyRow> = pnl_daily::table.find(key).first(&mut conn).optional()?;
        row.map(Self::row_to_pnl).transpose()
    }

    async fn upsert_daily_pnl(&self, pnl: &DailyPnl) -> Result<()> {
        let row = Self::pnl_to_row(pnl)?;
        let mut conn = self.pool.get()?;
        diesel::replace_into(pnl_daily::table)
            .values(&row)
            .execute(&mut conn)?;
        Ok(())
    }

    async fn log_event(&self, event: EventRecord) -> Result<()> {
        let row = NewEventRow {
            timestamp: event.timestamp.to_rfc3339(),
            event_type: event.event_type,
            level: event.level.as_str().to_string(),
            details_json: serde_json::to_string(&event.details)?,
        };
        let mut conn = self.pool.get()?;
        diesel::insert_into(events_log::table)
            .values(&row)
            .execute(&mut conn)?;
        Ok(())
    }

    async fn upsert_market(&self, market: &Market) -> Result<()> {
        let row = MarketRow {
            market_id: market.market_id.to_string(),
            condition_id: market.condition_id.clone(),
            question: market.question.clone(),
            expires_at: market.expires_at.to_rfc3339(),
            volume: market.volume.to_string(),
            liquidity: market.liquidity.to_string(),
            active: market.active,
            last_scanned_at: Utc::now().to_rfc3339(),
        };
        let mut conn = self.pool.get()?;
        diesel::replace_into(markets::table)
            .values(&row)
            .execute(&mut conn)?;
        Ok(())
    }

    async fn get_halt_state(&self) -> Result<HaltRecord> {
        let mut conn = self.pool.get()?;
        let row: Option<HaltStateRow> = halt_state::table.find(0).first(&mut conn).optional()?;
        Ok(row.map_or_else(HaltRecord::default, |row| HaltRecord {
            halted: row.halted,
            reason: row.reason,
        }))
    }

    async fn set_halt_state(&self, halted: bool, reason: &str) -> Result<()> {
        let row = HaltStateRow {
            id: 0,
            halted,
            reason: reason.to_string(),
        };
        let mut conn = self.pool.get()?;
        diesel::replace_into(halt_state::table)
            .values(&row)
            .execute(&mut conn)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::db::create_pool;
    use crate::core::domain::{MarketId, PositionLeg, Strategy, TokenId};
    use rust_decimal_macros::dec;

    fn setup() -> SqliteStore {
        let pool = create_pool(":memory:").expect("pool");
        SqliteStore::new(pool)
    }

    fn position() -> Position {
        Position::try_new_pending(
            PositionId::new("p1"),
            MarketId::new("m1"),
            Strategy::YesNo,
            vec![PositionLeg {
                outcome: "YES".into(),
                token_id: TokenId::new("t1"),
                size_tokens: dec!(100),
                entry_price: dec!(0.45),
            }],
            dec!(5),
            Utc::now(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn position_roundtrips_through_store() {
        let store = setup();
        store.save_position(&position()).await.unwrap();
        let loaded = store
            .get_position(&PositionId::new("p1"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(loaded.legs.len(), 1);
        assert_eq!(loaded.legs[0].outcome, "YES");
        assert!(loaded.status.is_pending());
    }

    #[tokio::test]
    async fn open_positions_reflects_status_transition() {
        let store = setup();
        let mut pos = position();
        store.save_position(&pos).await.unwrap();
        assert_eq!(store.count_open_positions().await.unwrap(), 0);

        pos.mark_open(vec![], dec!(45));
        store.update_position(&pos).await.unwrap();
        assert_eq!(store.count_open_positions().await.unwrap(), 1);

        pos.close(Utc::now(), dec!(16.11), "Yes").unwrap();
        store.update_position(&pos).await.unwrap();
        assert_eq!(store.count_open_positions().await.unwrap(), 0);

        let loaded = store
            .get_position(&PositionId::new("p1"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(loaded.realized_pnl(), Some(dec!(16.11)));
    }

    #[tokio::test]
    async fn daily_pnl_roundtrips() {
        let store = setup();
        let date = NaiveDate::from_ymd_opt(2026, 7, 30).unwrap();
        let mut pnl = DailyPnl::new(date);
        pnl.record("yes_no", dec!(16.11), Utc::now());
        store.upsert_daily_pnl(&pnl).await.unwrap();

        let loaded = store.get_daily_pnl(date).await.unwrap().unwrap();
        assert_eq!(loaded.total_pnl, dec!(16.11));
        assert_eq!(loaded.strategy_pnl.get("yes_no"), Some(&dec!(16.11)));
    }

    #[tokio::test]
    async fn halt_state_defaults_clear_and_persists_after_set() {
        let store = setup();
        assert!(!store.get_halt_state().await.unwrap().halted);

        store.set_halt_state(true, "daily loss exceeded").await.unwrap();
        let halt = store.get_halt_state().await.unwrap();
        assert!(halt.halted);
        assert_eq!(halt.reason, "daily loss exceeded");

        store.set_halt_state(false, "").await.unwrap();
        assert!(!store.get_halt_state().await.unwrap().halted);
    }
}
