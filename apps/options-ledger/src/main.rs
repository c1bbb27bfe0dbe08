//! Options Ledger Binary
//!
//! Loads a ledger snapshot, refreshes trade statuses and prints a JSON report
//! per account (trades, P&L summary and open allocation).
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin options-ledger
//! ```
//!
//! # Environment Variables
//!
//! - `LEDGER_CONFIG`: Path to the YAML config (default: config.yaml; defaults
//!   apply when the file does not exist)
//! - `RUST_LOG`: Log filter (overrides `observability.logging.level`)

use std::path::Path;

use anyhow::Context;
use options_ledger::application::dto::AccountReportDto;
use options_ledger::application::ports::SystemClock;
use options_ledger::config::{Config, load_config};
use options_ledger::infrastructure::config::Container;
use options_ledger::infrastructure::persistence::{InMemoryLedgerStore, LedgerSnapshot};
use options_ledger::observability::init_tracing;

/// Default config file path.
const DEFAULT_CONFIG_PATH: &str = "config.yaml";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_dotenv();

    let config_path =
        std::env::var("LEDGER_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let config_found = Path::new(&config_path).exists();
    let config = if config_found {
        load_config(Some(&config_path))
            .with_context(|| format!("failed to load config from {config_path}"))?
    } else {
        Config::default()
    };

    init_tracing(&config.observability.logging).context("failed to initialize tracing")?;
    tracing::info!(
        config = %config_path,
        config_found,
        "Starting options ledger"
    );

    let store = load_store(&config)?;
    let container = Container::in_memory(store, config.ledger.clone());

    let reports = build_reports(&container).await?;
    println!(
        "{}",
        serde_json::to_string_pretty(&reports).context("failed to serialize reports")?
    );

    if let Some(path) = config.persistence.save_target() {
        container
            .store()
            .snapshot()
            .save(path)
            .with_context(|| format!("failed to save snapshot to {path}"))?;
        tracing::info!(path, "Snapshot saved");
    }

    tracing::info!(accounts = reports.len(), "Options ledger finished");
    Ok(())
}

/// Build the store, importing the configured snapshot when it exists.
fn load_store(config: &Config) -> anyhow::Result<InMemoryLedgerStore> {
    let Some(path) = config.persistence.snapshot_path.as_deref() else {
        tracing::info!("No snapshot configured, starting with an empty ledger");
        return Ok(InMemoryLedgerStore::new());
    };
    if !Path::new(path).exists() {
        tracing::warn!(path, "Snapshot not found, starting with an empty ledger");
        return Ok(InMemoryLedgerStore::new());
    }

    let snapshot =
        LedgerSnapshot::load(path).with_context(|| format!("failed to load snapshot {path}"))?;
    tracing::info!(
        path,
        accounts = snapshot.accounts.len(),
        trades = snapshot.trades.len(),
        stock_positions = snapshot.stock_positions.len(),
        "Snapshot loaded"
    );
    Ok(InMemoryLedgerStore::from_snapshot(snapshot))
}

/// One report per account, each produced on behalf of its owner.
async fn build_reports(
    container: &Container<InMemoryLedgerStore, SystemClock>,
) -> anyhow::Result<Vec<AccountReportDto>> {
    let reporting = container.reporting_use_case();
    let accounts = container.store().snapshot().accounts;

    let mut reports = Vec::with_capacity(accounts.len());
    for account in &accounts {
        let report = reporting
            .account_report(account.owner(), account.id())
            .await
            .with_context(|| format!("failed to report on account {}", account.id()))?;
        reports.push(report);
    }
    Ok(reports)
}

/// Load .env file from current directory or any ancestor directory.
fn load_dotenv() {
    if dotenvy::dotenv().is_ok() {
        return;
    }

    if let Ok(cwd) = std::env::current_dir() {
        let mut dir = cwd.as_path();
        while let Some(parent) = dir.parent() {
            let env_path = parent.join(".env");
            if env_path.exists() {
                let _ = dotenvy::from_path(&env_path);
                return;
            }
            dir = parent;
        }
    }
}
