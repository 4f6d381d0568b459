//! Handler for the `status` command.
//!
//! Reads directly from the store; there is no RPC to a running process.

use std::path::Path;

use chrono::Utc;
use owo_colors::OwoColorize;

use crate::app::Config;
use crate::core::db;
use crate::core::store::{SqliteStore, Store};
use crate::error::Result;

/// Execute the `status` command.
pub async fn execute(config_path: &Path) -> Result<()> {
    let config = Config::load(config_path)?;
    let db_url = format!("sqlite://{}", config.store.database_url);
    let pool = db::create_pool(&db_url)?;
    let store = SqliteStore::new(pool);

    let halt = store.get_halt_state().await?;
    let open_positions = store.count_open_positions().await?;
    let today = store.get_daily_pnl(Utc::now().date_naive()).await?;

    println!();
    println!("{} {}", "arbiter".bold(), env!("CARGO_PKG_VERSION").dimmed());
    if halt.halted {
        println!("Status:      {} ({})", "halted".red().bold(), halt.reason);
    } else {
        println!("Status:      {}", "running".green().bold());
    }
    println!("Positions:   {open_positions} open");
    match today {
        Some(pnl) => {
            println!(
                "Today:       {} trades, {} wins, {} realized P&L",
                pnl.total_trades, pnl.winning_trades, pnl.total_pnl
            );
        }
        None => println!("Today:       no trades yet"),
    }
    println!();

    Ok(())
}
