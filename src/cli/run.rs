//! Handler for the `run` command.

use std::path::Path;

use tokio::signal;
use tokio::sync::watch;
use tracing::{error, info};

use crate::app::{Config, Orchestrator};
use crate::cli::{banner, RunArgs};
use crate::error::{Error, Result};

fn map_run_result(result: std::result::Result<Result<()>, tokio::task::JoinError>) -> Result<()> {
    match result {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => {
            error!(error = %e, "application exited with error");
            Err(e)
        }
        Err(e) => {
            error!(error = %e, "application task join failed");
            Err(Error::Store(e.to_string()))
        }
    }
}

/// Execute the `run` command: load config, start every component, and block
/// until `SIGINT`/`SIGTERM`.
pub async fn execute(config_path: &Path, args: &RunArgs) -> Result<()> {
    let mut config = Config::load(config_path)?;

    if let Some(ref level) = args.log_level {
        config.logging.level = level.clone();
    }
    if args.json_logs {
        config.logging.format = "json".to_string();
    }
    if args.dry_run {
        config.dry_run = true;
    }

    config.init_logging();

    if !args.no_banner {
        banner::print_banner();
    }

    info!(dry_run = config.dry_run, environment = %config.exchange.environment, "arbiter starting");

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut run_handle = tokio::spawn(Orchestrator::run_with_shutdown(config, shutdown_rx));

    tokio::select! {
        result = &mut run_handle => {
            map_run_result(result)?;
        }
        _ = signal::ctrl_c() => {
            info!("shutdown signal received (ctrl+c)");
            let _ = shutdown_tx.send(true);
            map_run_result(run_handle.await)?;
        }
    }

    info!("arbiter stopped");
    Ok(())
}
