//! Handler for the `resume` command.

use std::path::Path;

use tracing::info;

use crate::app::Config;
use crate::core::db;
use crate::core::store::{SqliteStore, Store};
use crate::error::Result;

/// Clear a sticky halt recorded in the store. Does not affect a separately
/// running process; the cleared state takes effect the next time `run`
/// starts (or is picked up by a deployment that restarts on halt).
pub async fn execute(config_path: &Path) -> Result<()> {
    let config = Config::load(config_path)?;
    let db_url = format!("sqlite://{}", config.store.database_url);
    let pool = db::create_pool(&db_url)?;
    let store = SqliteStore::new(pool);

    let halt = store.get_halt_state().await?;
    if !halt.halted {
        println!("not halted");
        return Ok(());
    }

    store.set_halt_state(false, "").await?;
    info!(previous_reason = %halt.reason, "halt cleared");
    println!("halt cleared (was: {})", halt.reason);
    Ok(())
}
