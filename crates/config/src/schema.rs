use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use ups_core::{Result, UpsError};

/// Root configuration structure parsed from `upsmon.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct UpsConfig {
    /// Sampling cadence and driver location.
    pub monitor: MonitorConfig,
    /// Battery pack description.
    pub battery: BatteryConfig,
    /// Chemistry and threshold constants for the estimator.
    pub calibration: CalibrationConfig,
}

impl UpsConfig {
    /// Reject values the estimator cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.monitor.sample_count < 1 {
            return Err(invalid("monitor.sample_count must be at least 1"));
        }
        if self.monitor.scan_interval_ms == 0 {
            return Err(invalid("monitor.scan_interval_ms must be positive"));
        }
        if !(1.0..=100.0).contains(&self.battery.max_soc_percent) {
            return Err(invalid(format!(
                "battery.max_soc_percent must be within 1..=100, got {}",
                self.battery.max_soc_percent
            )));
        }
        if self.battery.cell_count < 1 {
            return Err(invalid("battery.cell_count must be at least 1"));
        }
        if let Some(capacity) = self.battery.battery_capacity_mah {
            if !(capacity.is_finite() && capacity > 0.0) {
                return Err(invalid(format!(
                    "battery.battery_capacity_mah must be positive, got {capacity}"
                )));
            }
        }
        self.calibration.validate()
    }
}

/// Sampling settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Moving-average length `N`; bus voltage and current keep `2N` samples.
    pub sample_count: usize,
    /// Delay between two driver reads, in milliseconds.
    pub scan_interval_ms: u64,
    /// hwmon directory of the INA219; discovered when unset.
    pub hwmon_path: Option<PathBuf>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            sample_count:     5,
            scan_interval_ms: 2000,
            hwmon_path:       None,
        }
    }
}

/// Battery pack settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatteryConfig {
    /// Charge ceiling the pack is allowed to reach, reported as 100 %.
    pub max_soc_percent: f64,
    /// Nominal capacity; remaining capacity and runtime need it.
    pub battery_capacity_mah: Option<f64>,
    /// Cells in series.
    pub cell_count: u32,
}

impl Default for BatteryConfig {
    fn default() -> Self {
        Self {
            max_soc_percent:      100.0,
            battery_capacity_mah: None,
            cell_count:           2,
        }
    }
}

/// Voltage-to-SoC calibration and classification thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationConfig {
    /// Per-cell voltage treated as 0 % (V).
    pub empty_cell_voltage: f64,
    /// Per-cell voltage span between empty and full (V).
    pub cell_voltage_span: f64,
    /// Current above which mains is considered present (mA).
    pub min_online_current_ma: f64,
    /// Current above which the battery is charging (mA).
    pub min_charging_current_ma: f64,
    /// SoC below which an online pack is flagged low (%).
    pub low_battery_percent: f64,
    /// Power above which a battery is considered attached (W).
    pub min_battery_connected_power_w: f64,
    /// Fraction of the long window used for the smoothed aggregates.
    pub tail_divisor: usize,
    /// Report 0 % SoC while no battery is detected.
    pub zero_soc_without_battery: bool,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            empty_cell_voltage:            3.0,
            cell_voltage_span:             1.2,
            min_online_current_ma:         -100.0,
            min_charging_current_ma:       1.0,
            low_battery_percent:           20.0,
            min_battery_connected_power_w: 0.1,
            tail_divisor:                  2,
            zero_soc_without_battery:      false,
        }
    }
}

impl CalibrationConfig {
    fn validate(&self) -> Result<()> {
        if !(self.cell_voltage_span.is_finite() && self.cell_voltage_span > 0.0) {
            return Err(invalid("calibration.cell_voltage_span must be positive"));
        }
        if !self.empty_cell_voltage.is_finite() {
            return Err(invalid("calibration.empty_cell_voltage must be finite"));
        }
        if self.tail_divisor < 1 {
            return Err(invalid("calibration.tail_divisor must be at least 1"));
        }
        Ok(())
    }
}

fn invalid(msg: impl Into<String>) -> UpsError {
    UpsError::InvalidConfig(msg.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(UpsConfig::default().validate().is_ok());
    }

    #[test]
    fn partial_toml_falls_back_to_defaults() {
        let cfg: UpsConfig = toml::from_str(
            r#"
            [battery]
            battery_capacity_mah = 3000
            cell_count = 3
            "#,
        )
        .unwrap();
        assert_eq!(cfg.battery.cell_count, 3);
        assert_eq!(cfg.battery.battery_capacity_mah, Some(3000.0));
        assert_eq!(cfg.monitor, MonitorConfig::default());
        assert_eq!(cfg.calibration, CalibrationConfig::default());
        assert!(!cfg.calibration.zero_soc_without_battery);
    }

    #[test]
    fn parses_zero_soc_flag() {
        let cfg: UpsConfig = toml::from_str(
            r#"
            [calibration]
            zero_soc_without_battery = true
            "#,
        )
        .unwrap();
        assert!(cfg.calibration.zero_soc_without_battery);
        assert_eq!(cfg.calibration.tail_divisor, 2);
    }

    #[test]
    fn rejects_zero_sample_count() {
        let mut cfg = UpsConfig::default();
        cfg.monitor.sample_count = 0;
        assert!(matches!(cfg.validate(), Err(UpsError::InvalidConfig(_))));
    }

    #[test]
    fn rejects_max_soc_out_of_range() {
        for bad in [0.0, 0.5, 100.5, 250.0] {
            let mut cfg = UpsConfig::default();
            cfg.battery.max_soc_percent = bad;
            assert!(cfg.validate().is_err(), "{bad} accepted");
        }
        let mut cfg = UpsConfig::default();
        cfg.battery.max_soc_percent = 1.0;
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn rejects_zero_cells_and_bad_capacity() {
        let mut cfg = UpsConfig::default();
        cfg.battery.cell_count = 0;
        assert!(cfg.validate().is_err());

        let mut cfg = UpsConfig::default();
        cfg.battery.battery_capacity_mah = Some(0.0);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_zero_tail_divisor() {
        let mut cfg = UpsConfig::default();
        cfg.calibration.tail_divisor = 0;
        assert!(cfg.validate().is_err());
    }
}
