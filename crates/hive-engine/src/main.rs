//! Colony engine binary for the Hive colony agent.
//!
//! Wires configuration, logging, the starting colony, and the bounded tick
//! loop together.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `hive-config.yaml` (defaults if absent)
//! 2. Initialize structured logging (tracing)
//! 3. Create the starting colony from the configured seed
//! 4. Restore the bank from its snapshot, if one was saved
//! 5. Issue the standing room jobs: reserve, claim, scout
//! 6. Run the tick loop until the tick bound or Ctrl-C
//! 7. Save the bank snapshot and log the result

mod error;

use std::path::Path;
use std::sync::Arc;

use anyhow::Context as _;
use tracing::info;
use tracing_subscriber::EnvFilter;

use hive_core::{ColonyConfig, ColonyState, LogFormat, NoOpCallback, RunControl, runner};
use hive_ledger::BankSnapshot;

use crate::error::EngineError;

/// Configuration file looked up relative to the working directory.
const CONFIG_FILE: &str = "hive-config.yaml";

/// Application entry point.
///
/// # Errors
///
/// Returns an error if any initialization step, the run, or the snapshot
/// save fails.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Load configuration.
    let config = load_config().context("loading configuration")?;

    // 2. Initialize structured logging.
    init_logging(&config);
    info!(
        colony = config.colony.name,
        seed = config.colony.seed,
        tick_interval_ms = config.colony.tick_interval_ms,
        max_ticks = config.colony.max_ticks,
        "hive-engine starting"
    );

    // 3. Create the starting colony.
    let (world, ids) = hive_world::create_starting_colony(config.colony.seed)
        .map_err(EngineError::from)
        .context("creating starting colony")?;
    info!(home = %ids.home, spawn = %ids.spawn, creeps = ids.creeps.len(), "starting colony created");

    // 4. Restore the bank.
    let snapshot_path = config.colony.bank_snapshot_path.clone();
    let snapshot = match snapshot_path.as_deref() {
        Some(path) => load_snapshot(path).context("restoring bank")?,
        None => None,
    };
    let mut colony = ColonyState::new(&config, world, snapshot);

    // 5. Standing room jobs.
    let reserve = colony.reserve(&ids.remote);
    let claim = colony.claim(&ids.expansion);
    let scout = colony.scout(&ids.frontier);
    info!(?reserve, ?claim, ?scout, "room jobs issued");

    // 6. Run.
    let control = Arc::new(RunControl::from_config(&config.colony));
    {
        let control = Arc::clone(&control);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("interrupt received, stopping after this tick");
                control.request_stop();
            }
        });
    }
    let result = runner::run_colony(&mut colony, &control, &mut NoOpCallback)
        .await
        .map_err(EngineError::from)?;

    // 7. Save and report.
    if let Some(path) = snapshot_path.as_deref() {
        save_snapshot(path, &colony.ledger.bank_snapshot()).context("saving bank")?;
    }
    runner::log_run_end(&result);
    info!(
        end_reason = ?result.end_reason,
        total_ticks = result.total_ticks,
        "hive-engine shutdown complete"
    );

    Ok(())
}

/// Install the tracing subscriber. `RUST_LOG` overrides `logging.level`.
fn init_logging(config: &ColonyConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    match config.logging.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}

/// Load the colony configuration from `hive-config.yaml`.
fn load_config() -> Result<ColonyConfig, EngineError> {
    let config_path = Path::new(CONFIG_FILE);
    if config_path.exists() {
        Ok(ColonyConfig::from_file(config_path)?)
    } else {
        let mut config = ColonyConfig::default();
        config.colony.apply_env_overrides();
        Ok(config)
    }
}

/// Read a saved bank. A missing file means a fresh bank.
fn load_snapshot(path: &Path) -> Result<Option<BankSnapshot>, EngineError> {
    if !path.exists() {
        info!(path = %path.display(), "no bank snapshot, starting fresh");
        return Ok(None);
    }
    let contents = std::fs::read_to_string(path).map_err(|source| EngineError::SnapshotIo {
        path: path.to_path_buf(),
        source,
    })?;
    let snapshot: BankSnapshot = serde_json::from_str(&contents)?;
    info!(path = %path.display(), "bank snapshot restored");
    Ok(Some(snapshot))
}

fn save_snapshot(path: &Path, snapshot: &BankSnapshot) -> Result<(), EngineError> {
    let json = serde_json::to_string_pretty(snapshot)?;
    std::fs::write(path, json).map_err(|source| EngineError::SnapshotIo {
        path: path.to_path_buf(),
        source,
    })?;
    info!(path = %path.display(), "bank snapshot saved");
    Ok(())
}
