use crate::window::SampleWindow;
use std::num::NonZeroUsize;
use ups_core::{Channel, Reading, Result, UpsError};

/// Long windows hold this many times `sample_count` samples.
pub const LONG_WINDOW_FACTOR: usize = 2;

/// Per-channel moving-average windows fed once per tick.
///
/// Bus voltage and current keep `2 * sample_count` samples so they can be
/// averaged at two granularities; shunt voltage and power keep
/// `sample_count`.
#[derive(Debug, Clone)]
pub struct SampleBuffer {
    bus_voltage:   SampleWindow,
    shunt_voltage: SampleWindow,
    current:       SampleWindow,
    power:         SampleWindow,
}

impl SampleBuffer {
    pub fn new(sample_count: usize) -> Result<Self> {
        let short = NonZeroUsize::new(sample_count).ok_or_else(|| {
            UpsError::InvalidConfig("sample_count must be at least 1".into())
        })?;
        let long = sample_count
            .checked_mul(LONG_WINDOW_FACTOR)
            .and_then(NonZeroUsize::new)
            .ok_or_else(|| UpsError::InvalidConfig(format!("sample_count {sample_count} is too large")))?;

        Ok(Self {
            bus_voltage:   SampleWindow::new(long),
            shunt_voltage: SampleWindow::new(short),
            current:       SampleWindow::new(long),
            power:         SampleWindow::new(short),
        })
    }

    /// Append one raw sample to every channel.
    pub fn push(&mut self, bus_v: f64, shunt_mv: f64, current_ma: f64, power_w: f64) {
        self.bus_voltage.push(bus_v);
        self.shunt_voltage.push(shunt_mv);
        self.current.push(current_ma);
        self.power.push(power_w);
    }

    pub fn record(&mut self, reading: Reading) {
        self.push(
            reading.bus_voltage_v,
            reading.shunt_voltage_mv,
            reading.current_ma,
            reading.power_w,
        );
    }

    pub fn window(&self, channel: Channel) -> &SampleWindow {
        match channel {
            Channel::BusVoltage   => &self.bus_voltage,
            Channel::ShuntVoltage => &self.shunt_voltage,
            Channel::Current      => &self.current,
            Channel::Power        => &self.power,
        }
    }

    /// Mean of every sample currently held for `channel`.
    pub fn mean(&self, channel: Channel) -> Result<f64> {
        self.window(channel)
            .mean()
            .ok_or(UpsError::EmptyWindow { channel })
    }

    /// Mean over the most recent `len / divisor + 1` samples of `channel`.
    pub fn mean_tail(&self, channel: Channel, divisor: usize) -> Result<f64> {
        let divisor = NonZeroUsize::new(divisor).ok_or(UpsError::InvalidDivisor)?;
        self.window(channel)
            .mean_tail(divisor)
            .ok_or(UpsError::EmptyWindow { channel })
    }

    pub fn median(&self, channel: Channel) -> Result<f64> {
        self.window(channel)
            .median()
            .ok_or(UpsError::EmptyWindow { channel })
    }

    pub fn median_tail(&self, channel: Channel, divisor: usize) -> Result<f64> {
        let divisor = NonZeroUsize::new(divisor).ok_or(UpsError::InvalidDivisor)?;
        self.window(channel)
            .median_tail(divisor)
            .ok_or(UpsError::EmptyWindow { channel })
    }

    pub fn is_filled(&self, channel: Channel) -> bool {
        self.window(channel).is_full()
    }

    /// `true` once every window has reached its capacity.
    pub fn is_warmed_up(&self) -> bool {
        Channel::ALL.iter().all(|&c| self.is_filled(c))
    }

    /// Drop all history; the next aggregate needs a fresh push.
    pub fn clear(&mut self) {
        self.bus_voltage.clear();
        self.shunt_voltage.clear();
        self.current.clear();
        self.power.clear();
    }
}
