use crate::engine::SampleBuffer;
use tracing::debug;
use ups_config::{BatteryConfig, CalibrationConfig, MonitorConfig, UpsConfig};
use ups_core::{Channel, Result, Snapshot, UpsError};

/// Validated, immutable settings for one [`Estimator`].
#[derive(Debug, Clone, PartialEq)]
pub struct EstimatorConfig {
    sample_count:         usize,
    max_soc_percent:      f64,
    battery_capacity_mah: Option<f64>,
    cell_count:           u32,
    calibration:          CalibrationConfig,
}

impl EstimatorConfig {
    /// Build a config with the default calibration.
    pub fn new(
        sample_count: usize,
        max_soc_percent: f64,
        battery_capacity_mah: Option<f64>,
        cell_count: u32,
    ) -> Result<Self> {
        Self::try_from(&UpsConfig {
            monitor: MonitorConfig {
                sample_count,
                ..MonitorConfig::default()
            },
            battery: BatteryConfig {
                max_soc_percent,
                battery_capacity_mah,
                cell_count,
            },
            calibration: CalibrationConfig::default(),
        })
    }

    pub fn with_calibration(mut self, calibration: CalibrationConfig) -> Result<Self> {
        self.calibration = calibration;
        self.to_ups_config().validate()?;
        Ok(self)
    }

    pub fn sample_count(&self) -> usize {
        self.sample_count
    }

    pub fn max_soc_percent(&self) -> f64 {
        self.max_soc_percent
    }

    pub fn battery_capacity_mah(&self) -> Option<f64> {
        self.battery_capacity_mah
    }

    pub fn cell_count(&self) -> u32 {
        self.cell_count
    }

    pub fn calibration(&self) -> &CalibrationConfig {
        &self.calibration
    }

    /// Pack voltage read as 0 % (C1).
    pub fn empty_voltage(&self) -> f64 {
        self.calibration.empty_cell_voltage * f64::from(self.cell_count)
    }

    /// Pack voltage span between empty and full (C2).
    pub fn voltage_span(&self) -> f64 {
        self.calibration.cell_voltage_span * f64::from(self.cell_count)
    }

    fn to_ups_config(&self) -> UpsConfig {
        UpsConfig {
            monitor: MonitorConfig {
                sample_count: self.sample_count,
                ..MonitorConfig::default()
            },
            battery: BatteryConfig {
                max_soc_percent:      self.max_soc_percent,
                battery_capacity_mah: self.battery_capacity_mah,
                cell_count:           self.cell_count,
            },
            calibration: self.calibration.clone(),
        }
    }
}

impl TryFrom<&UpsConfig> for EstimatorConfig {
    type Error = UpsError;

    fn try_from(config: &UpsConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            sample_count:         config.monitor.sample_count,
            max_soc_percent:      config.battery.max_soc_percent,
            battery_capacity_mah: config.battery.battery_capacity_mah,
            cell_count:           config.battery.cell_count,
            calibration:          config.calibration.clone(),
        })
    }
}

/// Turns window aggregates into a battery [`Snapshot`].
///
/// Holds no per-tick state: the same buffer contents always give the same
/// snapshot.
#[derive(Debug, Clone)]
pub struct Estimator {
    config: EstimatorConfig,
}

impl Estimator {
    pub fn new(config: EstimatorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EstimatorConfig {
        &self.config
    }

    /// Empty buffer sized for this estimator's `sample_count`.
    pub fn buffer(&self) -> Result<SampleBuffer> {
        SampleBuffer::new(self.config.sample_count)
    }

    pub fn estimate(&self, buffer: &SampleBuffer) -> Result<Snapshot> {
        let cal = &self.config.calibration;

        let bus_voltage_v    = buffer.mean(Channel::BusVoltage)?;
        let shunt_voltage_mv = buffer.mean(Channel::ShuntVoltage)?;
        let current_ma       = buffer.mean(Channel::Current)?;
        let power_w          = buffer.mean(Channel::Power)?;

        let smoothed_bus_voltage_v = buffer.mean_tail(Channel::BusVoltage, cal.tail_divisor)?;
        let smoothed_current_ma    = buffer.mean_tail(Channel::Current, cal.tail_divisor)?;

        let real_soc_percent = self.real_soc(smoothed_bus_voltage_v);
        let mut soc_percent  = self.soc(smoothed_bus_voltage_v);

        let online            = current_ma > cal.min_online_current_ma;
        let charging          = current_ma > cal.min_charging_current_ma;
        let low_battery       = online && soc_percent < cal.low_battery_percent;
        let battery_connected = power_w > cal.min_battery_connected_power_w;

        // A missing pack reports as empty.
        if cal.zero_soc_without_battery && !battery_connected {
            soc_percent = 0.0;
        }

        let remaining_capacity_mah = self
            .config
            .battery_capacity_mah
            .map(|capacity| real_soc_percent / 100.0 * capacity);

        let remaining_minutes = match remaining_capacity_mah {
            Some(capacity) if !online => {
                match remaining_minutes(capacity, smoothed_current_ma) {
                    Ok(minutes) => Some(minutes),
                    Err(e) => {
                        debug!("{e}");
                        None
                    }
                }
            }
            _ => None,
        };

        Ok(Snapshot {
            bus_voltage_v,
            shunt_voltage_mv,
            current_ma,
            power_w,
            smoothed_bus_voltage_v,
            smoothed_current_ma,
            psu_voltage_v: bus_voltage_v + shunt_voltage_mv / 1000.0,
            power_calculated_w: bus_voltage_v * (current_ma / 1000.0),
            soc_percent,
            real_soc_percent,
            online,
            charging,
            low_battery,
            battery_connected,
            remaining_capacity_mah,
            remaining_minutes,
        })
    }

    /// SoC against the nominal voltage span; may leave `[0, 100]`.
    pub fn real_soc(&self, bus_voltage_v: f64) -> f64 {
        (bus_voltage_v - self.config.empty_voltage()) / self.config.voltage_span() * 100.0
    }

    /// SoC against the configured charge ceiling, clamped to `[0, 100]`.
    pub fn soc(&self, bus_voltage_v: f64) -> f64 {
        let span = self.config.voltage_span() * (self.config.max_soc_percent / 100.0);
        let soc = (bus_voltage_v - self.config.empty_voltage()) / span * 100.0;
        soc.clamp(0.0, 100.0)
    }
}

/// Minutes until `capacity_mah` is drained at `current_ma`, rounded to whole
/// minutes. A positive current projects a negative runtime; zero has none.
pub fn remaining_minutes(capacity_mah: f64, current_ma: f64) -> Result<f64> {
    if current_ma.is_nan() || current_ma == 0.0 {
        return Err(UpsError::UndefinedRuntime { current_ma });
    }
    let minutes = (capacity_mah / -current_ma * 60.0).round_ties_even();
    if minutes.is_finite() {
        Ok(minutes)
    } else {
        Err(UpsError::UndefinedRuntime { current_ma })
    }
}
