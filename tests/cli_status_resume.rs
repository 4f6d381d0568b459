//! Exercises the `status`/`resume` commands as a user would: against a
//! config file and store on disk, with no running `arbiter run` process.

use std::io::Write;

use assert_cmd::Command;
use predicates::str::contains;
use tempfile::tempdir;

fn write_config(dir: &std::path::Path) -> std::path::PathBuf {
    let db_path = dir.join("arbiter.db");
    let config_path = dir.join("config.toml");
    let mut file = std::fs::File::create(&config_path).unwrap();
    write!(
        file,
        r#"
[store]
database_url = "{db}"

[risk]
bankroll = 1000
"#,
        db = db_path.display(),
    )
    .unwrap();
    config_path
}

#[test]
fn status_reports_running_with_no_trades_on_a_fresh_store() {
    let dir = tempdir().unwrap();
    let config_path = write_config(dir.path());

    Command::cargo_bin("arbiter")
        .unwrap()
        .args(["--config", config_path.to_str().unwrap(), "status"])
        .assert()
        .success()
        .stdout(contains("running"))
        .stdout(contains("no trades yet"));
}

#[test]
fn resume_on_a_non_halted_store_reports_not_halted() {
    let dir = tempdir().unwrap();
    let config_path = write_config(dir.path());

    Command::cargo_bin("arbiter")
        .unwrap()
        .args(["--config", config_path.to_str().unwrap(), "resume"])
        .assert()
        .success()
        .stdout(contains("not halted"));
}

#[test]
fn status_reflects_a_halt_recorded_directly_in_the_store() {
    let dir = tempdir().unwrap();
    let config_path = write_config(dir.path());

    // Drive a halt into the store the same way the executor would,
    // through the public Config/Store surface rather than touching
    // SQLite directly.
    let rt = tokio::runtime::Runtime::new().unwrap();
    rt.block_on(async {
        let config = arbiter::app::Config::load(&config_path).unwrap();
        let db_url = format!("sqlite://{}", config.store.database_url);
        let pool = arbiter::core::db::create_pool(&db_url).unwrap();
        let store = arbiter::core::store::SqliteStore::new(pool);
        arbiter::core::store::Store::set_halt_state(&store, true, "consecutive failures")
            .await
            .unwrap();
    });

    Command::cargo_bin("arbiter")
        .unwrap()
        .args(["--config", config_path.to_str().unwrap(), "status"])
        .assert()
        .success()
        .stdout(contains("halted"))
        .stdout(contains("consecutive failures"));

    Command::cargo_bin("arbiter")
        .unwrap()
        .args(["--config", config_path.to_str().unwrap(), "resume"])
        .assert()
        .success()
        .stdout(contains("halt cleared"));

    Command::cargo_bin("arbiter")
        .unwrap()
        .args(["--config", config_path.to_str().unwrap(), "status"])
        .assert()
        .success()
        .stdout(contains("running"));
}
