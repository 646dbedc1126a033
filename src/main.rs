//! mention-monitor binary entrypoint.
//! Loads configuration, wires the fixture search collaborator and in-memory sinks,
//! then runs one cycle (`--once`) or the scheduler until Ctrl-C.

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use mention_monitor::config::{
    interval_minutes_from_env, load_config_default, monitor::resolve_config_path,
    start_hot_reload_thread, ConfigHandle,
};
use mention_monitor::monitor::providers::FixtureSearch;
use mention_monitor::monitor::sinks::{MemoryLog, MemoryResults};
use mention_monitor::{Monitor, Scheduler};

const ENV_FIXTURE_PATH: &str = "MONITOR_FIXTURE_PATH";
const DEFAULT_FIXTURE_PATH: &str = "fixtures/search.json";

/// Compact logs by default; JSON lines when MONITOR_LOG_JSON=1.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("mention_monitor=info,monitor=info,warn"));

    let json = std::env::var("MONITOR_LOG_JSON")
        .ok()
        .is_some_and(|v| v == "1");

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().compact())
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    let once = std::env::args().skip(1).any(|a| a == "--once");

    let cfg = load_config_default().context("loading monitor config")?;
    let handle = ConfigHandle::new(cfg);
    if let Some(path) = resolve_config_path() {
        start_hot_reload_thread(handle.clone(), path);
    }

    let fixture_path = std::env::var(ENV_FIXTURE_PATH)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_FIXTURE_PATH));
    let search = FixtureSearch::from_path(&fixture_path)?;
    tracing::info!(posts = search.len(), path = %fixture_path.display(), "search fixture loaded");

    let results = Arc::new(MemoryResults::default());
    let log = Arc::new(MemoryLog::default());
    let monitor = Monitor::new(
        Arc::new(search),
        results.clone(),
        log.clone(),
        Arc::new(handle),
    );
    let scheduler = Scheduler::with_interval(monitor, interval_minutes_from_env());

    if once {
        let summary = scheduler.run_cycle().await;
        for c in results.found() {
            println!("{}", serde_json::to_string(&c)?);
        }
        tracing::info!(reported = summary.reported(), "single cycle done");
        return Ok(());
    }

    scheduler.start();
    tokio::signal::ctrl_c()
        .await
        .context("waiting for ctrl-c")?;
    scheduler.stop();
    tracing::info!(found = results.len(), "shutting down");
    Ok(())
}
