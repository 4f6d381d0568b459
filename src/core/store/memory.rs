//! In-memory store implementation, for tests and dry-run-only runs.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use parking_lot::RwLock;

use super::{EventRecord, HaltRecord, Store};
use crate::core::domain::{DailyPnl, Market, MarketId, Position, PositionId};
use crate::error::Result;

#[derive(Default)]
pub struct MemoryStore {
    positions: RwLock<HashMap<PositionId, Position>>,
    pnl_daily: RwLock<HashMap<NaiveDate, DailyPnl>>,
    events: RwLock<Vec<EventRecord>>,
    markets: RwLock<HashMap<MarketId, Market>>,
    halt: RwLock<HaltRecord>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn save_position(&self, position: &Position) -> Result<()> {
        self.positions
            .write()
            .insert(position.id.clone(), position.clone());
        Ok(())
    }

    async fn update_position(&self, position: &Position) -> Result<()> {
        self.positions
            .write()
            .insert(position.id.clone(), position.clone());
        Ok(())
    }

    async fn get_position(&self, id: &PositionId) -> Result<Option<Position>> {
        Ok(self.positions.read().get(id).cloned())
    }

    async fn open_positions(&self) -> Result<Vec<Position>> {
        Ok(self
            .positions
            .read()
            .values()
            .filter(|p| p.status.is_open())
            .cloned()
            .collect())
    }

    async fn count_open_positions(&self) -> Result<usize> {
        Ok(self
            .positions
            .read()
            .values()
            .filter(|p| p.status.is_open())
            .count())
    }

    async fn get_daily_pnl(&self, date: NaiveDate) -> Result<Option<DailyPnl>> {
        Ok(self.pnl_daily.read().get(&date).cloned())
    }

    async fn upsert_daily_pnl(&self, pnl: &DailyPnl) -> Result<()> {
        self.pnl_daily.write().insert(pnl.date, pnl.clone());
        Ok(())
    }

    async fn log_event(&self, event: EventRecord) -> Result<()> {
        self.events.write().push(event);
        Ok(())
    }

    async fn upsert_market(&self, market: &Market) -> Result<()> {
        self.markets
            .write()
            .insert(market.market_id.clone(), market.clone());
        Ok(())
    }

    async fn get_halt_state(&self) -> Result<HaltRecord> {
        Ok(self.halt.read().clone())
    }

    async fn set_halt_state(&self, halted: bool, reason: &str) -> Result<()> {
        let mut halt = self.halt.write();
        halt.halted = halted;
        halt.reason = reason.to_string();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::domain::{PositionLeg, Strategy, TokenId};
    use chrono::Utc;
    use rust_decimal_macros::dec;

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
    async fn save_then_get_roundtrips() {
        let store = MemoryStore::new();
        store.save_position(&position()).await.unwrap();
        let loaded = store.get_position(&PositionId::new("p1")).await.unwrap();
        assert!(loaded.is_some());
    }

    #[tokio::test]
    async fn open_positions_filters_by_status() {
        let store = MemoryStore::new();
        let mut pos = position();
        store.save_position(&pos).await.unwrap();
        assert_eq!(store.open_positions().await.unwrap().len(), 0);

        pos.mark_open(vec![], dec!(45));
        store.update_position(&pos).await.unwrap();
        assert_eq!(store.open_positions().await.unwrap().len(), 1);
        assert_eq!(store.count_open_positions().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn daily_pnl_upsert_overwrites() {
        let store = MemoryStore::new();
        let date = NaiveDate::from_ymd_opt(2026, 7, 30).unwrap();
        let mut pnl = DailyPnl::new(date);
        pnl.record("yes_no", dec!(10), Utc::now());
        store.upsert_daily_pnl(&pnl).await.unwrap();

        let loaded = store.get_daily_pnl(date).await.unwrap().unwrap();
        assert_eq!(loaded.total_pnl, dec!(10));
    }

    #[tokio::test]
    async fn halt_state_roundtrips() {
        let store = MemoryStore::new();
        assert!(!store.get_halt_state().await.unwrap().halted);
        store.set_halt_state(true, "consecutive failures").await.unwrap();
        let halt = store.get_halt_state().await.unwrap();
        assert!(halt.halted);
        assert_eq!(halt.reason, "consecutive failures");
    }
}
