//! # Deskbell — alarm scheduling and delivery daemon
//!
//! Loads configuration, opens the alarm store, arms timers for every
//! pending future alarm, and runs the two sweep loops until ctrl-c.
//!
//! Usage:
//!   deskbell                          # Run with ~/.deskbell/config.toml
//!   deskbell --config ./dev.toml      # Alternate config file
//!   deskbell --db ./alarms.db -v      # Override DB path, debug logging

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use deskbell_alarm::sweep::{run_reconcile_loop, run_retention_loop};
use deskbell_alarm::{AlarmService, AlarmStore, AlarmTimer, ReconcileSweeper, RetentionSweeper};
use deskbell_core::DeskbellConfig;

#[derive(Parser)]
#[command(
    name = "deskbell",
    version,
    about = "🔔 Deskbell — office alarm scheduling and delivery"
)]
struct Cli {
    /// Config file path (default: ~/.deskbell/config.toml)
    #[arg(short, long)]
    config: Option<String>,

    /// Alarm database path (overrides config)
    #[arg(long)]
    db: Option<String>,

    /// Firing worker pool size (overrides config)
    #[arg(long)]
    workers: Option<usize>,

    /// Notification mode: sms, push, email, noop (overrides config)
    #[arg(long)]
    notify: Option<String>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "deskbell=debug,deskbell_alarm=debug,deskbell_notify=debug"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_target(false)
        .init();

    let mut config = match &cli.config {
        Some(path) => DeskbellConfig::load_from(std::path::Path::new(path))?,
        None => DeskbellConfig::load()?,
    };
    if let Some(db) = cli.db {
        config.store.db_path = db;
    }
    if let Some(workers) = cli.workers {
        config.scheduler.workers = workers;
    }
    if let Some(notify) = cli.notify {
        config.notify.mode = notify;
    }

    let store = Arc::new(AlarmStore::open(std::path::Path::new(&config.store.db_path))?);
    let notifier = deskbell_notify::notifier_from_config(&config.notify);
    tracing::info!(
        "🔔 Deskbell starting: db={}, workers={}, notify={}",
        config.store.db_path,
        config.scheduler.workers,
        notifier.name()
    );

    let timer = Arc::new(AlarmTimer::new(
        Arc::clone(&store),
        notifier,
        config.scheduler.workers,
    ));
    let service = Arc::new(AlarmService::new(Arc::clone(&store), Arc::clone(&timer)));

    // Re-arm whatever the previous process left pending; overdue
    // records are picked up by the first reconciliation pass.
    service.restore()?;
    tracing::info!("📋 {} active alarms in store", store.count_active()?);

    let reconcile = Arc::new(ReconcileSweeper::new(Arc::clone(&store), Arc::clone(&timer)));
    let retention = Arc::new(RetentionSweeper::new(
        Arc::clone(&store),
        config.sweep.retention_days,
    ));
    tokio::spawn(run_reconcile_loop(
        reconcile,
        config.sweep.reconcile_interval_secs,
    ));
    tokio::spawn(run_retention_loop(
        retention,
        config.sweep.retention_interval_secs,
    ));

    tokio::signal::ctrl_c().await?;
    tracing::info!("🔔 Deskbell shutting down");
    timer.shutdown();
    Ok(())
}
