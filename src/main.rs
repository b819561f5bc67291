//! upsmon: battery telemetry for INA219-based UPS HATs.
//!
//! Run with:  `RUST_LOG=info upsmon`
//!
//! Each snapshot is written to stdout as one JSON line.

use anyhow::{Context, Result};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;
use ups_config::{ConfigWatcher, UpsConfig};
use ups_core::{Message, Telemetry};
use ups_sampler::{EstimatorConfig, HwmonPowerMonitor};

#[tokio::main]
async fn main() -> Result<()> {
    // Structured logging on stderr; RUST_LOG controls verbosity (default: info).
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("upsmon v{} starting", env!("CARGO_PKG_VERSION"));

    let path = ups_config::default_path();
    let config = ups_config::load(&path)
        .with_context(|| format!("loading '{}'", path.display()))?;
    let estimator = EstimatorConfig::try_from(&config)?;

    let driver = match &config.monitor.hwmon_path {
        Some(dir) => HwmonPowerMonitor::new(dir),
        None => HwmonPowerMonitor::discover().context("locating the INA219")?,
    };
    tracing::info!("Reading power monitor at {}", driver.path().display());

    let (reload_tx, reload_rx) = mpsc::channel(1);
    let mut rx = ups_sampler::spawn_monitor(
        driver,
        estimator,
        Duration::from_millis(config.monitor.scan_interval_ms),
        reload_rx,
    )?;

    let (watcher, mut changes) = ConfigWatcher::spawn(&path);
    tokio::spawn(async move {
        while changes.recv().await.is_some() {
            match reload(watcher.path(), &config) {
                Ok(next) => {
                    if reload_tx.send(next).await.is_err() {
                        break;
                    }
                }
                Err(e) => tracing::error!("Ignoring config change: {e:#}"),
            }
        }
    });

    loop {
        tokio::select! {
            message = rx.recv() => match message {
                Some(Message::Snapshot(snapshot)) => {
                    println!("{}", serde_json::to_string(&Telemetry::from(&snapshot))?);
                }
                Some(Message::TickSkipped(_)) => {}
                Some(Message::ConfigReloaded) => tracing::info!("Config reloaded"),
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutting down");
                break;
            }
        }
    }

    Ok(())
}

/// Re-read the config file. Sampling cadence and driver location are fixed
/// for the process lifetime; only estimator settings are applied live.
fn reload(path: &std::path::Path, running: &UpsConfig) -> Result<EstimatorConfig> {
    let next = ups_config::load(path)?;
    if next.monitor.scan_interval_ms != running.monitor.scan_interval_ms
        || next.monitor.hwmon_path != running.monitor.hwmon_path
    {
        tracing::warn!("scan_interval_ms and hwmon_path changes need a restart");
    }
    Ok(EstimatorConfig::try_from(&next)?)
}
