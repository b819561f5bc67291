pub mod driver;
pub mod engine;
pub mod estimator;
pub mod window;

pub use driver::{HwmonPowerMonitor, PowerMonitor};
pub use engine::SampleBuffer;
pub use estimator::{Estimator, EstimatorConfig};
pub use window::SampleWindow;

use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time;
use tracing::{debug, error, info, warn};
use ups_core::{Message, Reading, Result, Snapshot};

/// Sample windows plus the estimator that reads them.
#[derive(Debug, Clone)]
pub struct Sampler {
    buffer:    SampleBuffer,
    estimator: Estimator,
}

impl Sampler {
    pub fn new(config: EstimatorConfig) -> Result<Self> {
        let estimator = Estimator::new(config);
        Ok(Self {
            buffer: estimator.buffer()?,
            estimator,
        })
    }

    /// Push one reading and derive the snapshot for it.
    pub fn tick(&mut self, reading: Reading) -> Result<Snapshot> {
        self.buffer.record(reading);
        self.estimator.estimate(&self.buffer)
    }

    /// Swap in a new estimator config and drop the sample history. Windows
    /// are reused when `sample_count` is unchanged.
    pub fn reconfigure(&mut self, config: EstimatorConfig) -> Result<()> {
        if config.sample_count() == self.estimator.config().sample_count() {
            self.buffer.clear();
        } else {
            self.buffer = SampleBuffer::new(config.sample_count())?;
        }
        self.estimator = Estimator::new(config);
        Ok(())
    }

    pub fn buffer(&self) -> &SampleBuffer {
        &self.buffer
    }

    pub fn estimator(&self) -> &Estimator {
        &self.estimator
    }
}

/// Spawn a background Tokio task that reads `driver` every `interval` and
/// forwards a [`Message::Snapshot`] per tick through the returned channel.
///
/// A failed read skips the tick without touching the windows. A config sent
/// on `reload` replaces the estimator and restarts the sample history.
/// The task stops automatically when the receiver is dropped.
pub fn spawn_monitor<D>(
    mut driver: D,
    config: EstimatorConfig,
    interval: Duration,
    mut reload: mpsc::Receiver<EstimatorConfig>,
) -> Result<mpsc::Receiver<Message>>
where
    D: PowerMonitor + Send + 'static,
{
    let mut sampler = Sampler::new(config)?;
    let (tx, rx) = mpsc::channel(4);

    tokio::spawn(async move {
        let mut ticker = time::interval(interval);
        info!(
            interval_ms = interval.as_millis() as u64,
            sample_count = sampler.estimator().config().sample_count(),
            "battery monitor started"
        );

        loop {
            let message = tokio::select! {
                _ = ticker.tick() => match driver.read() {
                    Ok(reading) => match sampler.tick(reading) {
                        Ok(snapshot) => {
                            debug!(
                                soc = snapshot.soc_percent,
                                current_ma = snapshot.current_ma,
                                online = snapshot.online,
                                "snapshot"
                            );
                            Message::Snapshot(snapshot)
                        }
                        Err(e) => {
                            error!("Cannot estimate battery state: {e}");
                            continue;
                        }
                    },
                    Err(e) => {
                        warn!("Power monitor read failed; skipping tick: {e}");
                        Message::TickSkipped(e.to_string())
                    }
                },
                Some(config) = reload.recv() => match sampler.reconfigure(config) {
                    Ok(()) => {
                        info!("battery monitor reconfigured; sample history cleared");
                        Message::ConfigReloaded
                    }
                    Err(e) => {
                        error!("Keeping previous configuration: {e}");
                        continue;
                    }
                },
            };

            if tx.send(message).await.is_err() {
                break; // all receivers dropped
            }
        }
    });

    Ok(rx)
}
