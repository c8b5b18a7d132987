//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `engagement_core` linkage, config loading and database bootstrap.
//! - Keep output deterministic for quick local sanity checks.
//!
//! Usage: `engagement_cli [config.toml]`

use engagement_core::db::migrations::latest_version;
use engagement_core::db::{open_db, open_db_in_memory};
use engagement_core::{init_logging, EngagementConfig, ShareableKind};
use log::info;
use std::process::ExitCode;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("engagement_cli: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), String> {
    let mut config = match std::env::args().nth(1) {
        Some(path) => EngagementConfig::load(&path).map_err(|err| err.to_string())?,
        None => EngagementConfig::default(),
    };
    config.apply_env_overrides().map_err(|err| err.to_string())?;
    let logging = init_logging(&config.logging).map_err(|err| err.to_string())?;

    let storage = match config.storage.db_path.as_deref() {
        Some(path) => {
            open_db(path).map_err(|err| err.to_string())?;
            path.display().to_string()
        }
        None => {
            open_db_in_memory().map_err(|err| err.to_string())?;
            ":memory:".to_string()
        }
    };
    info!("event=cli_start module=cli status=ok storage={storage}");

    println!("engagement_core version={}", engagement_core::core_version());
    println!("schema_version={} storage={storage}", latest_version());
    for kind in ShareableKind::JOINABLE {
        if let Some(limit) = config.limits.limit_for(kind) {
            println!("limit.{kind}={limit}");
        }
    }
    println!(
        "inbox.default_limit={} inbox.max_limit={}",
        config.inbox.default_limit, config.inbox.max_limit
    );
    match logging {
        Some(settings) => println!("logging {settings}"),
        None => println!("logging off"),
    }
    Ok(())
}
