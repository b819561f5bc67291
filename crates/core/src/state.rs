use serde::{Deserialize, Serialize};
use std::fmt;

/// A quantity measured by the power monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    BusVoltage,
    ShuntVoltage,
    Current,
    Power,
}

impl Channel {
    pub const ALL: [Channel; 4] = [
        Channel::BusVoltage,
        Channel::ShuntVoltage,
        Channel::Current,
        Channel::Power,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Channel::BusVoltage   => "bus_voltage",
            Channel::ShuntVoltage => "shunt_voltage",
            Channel::Current      => "current",
            Channel::Power        => "power",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One raw read of the power monitor.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Reading {
    /// Voltage on the load side of the shunt, in volts.
    pub bus_voltage_v: f64,
    /// Voltage across the shunt, in millivolts.
    pub shunt_voltage_mv: f64,
    /// Signed current in milliamps; negative while the battery discharges.
    pub current_ma: f64,
    /// Power register value, in watts.
    pub power_w: f64,
}

/// Battery state derived from one tick's window aggregates.
///
/// Produced whole by the estimator and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Full-window mean bus voltage (V).
    pub bus_voltage_v: f64,
    /// Full-window mean shunt voltage (mV).
    pub shunt_voltage_mv: f64,
    /// Full-window mean current (mA).
    pub current_ma: f64,
    /// Full-window mean power as reported by the chip (W).
    pub power_w: f64,
    /// Tail-slice mean bus voltage (V).
    pub smoothed_bus_voltage_v: f64,
    /// Tail-slice mean current (mA).
    pub smoothed_current_ma: f64,
    /// Supply-side voltage: bus plus shunt drop (V).
    pub psu_voltage_v: f64,
    /// Bus voltage times current, independent of the power register (W).
    pub power_calculated_w: f64,
    /// State of charge relative to the configured ceiling, in `[0, 100]`.
    pub soc_percent: f64,
    /// Unclamped state of charge against the nominal voltage span.
    pub real_soc_percent: f64,
    pub online: bool,
    pub charging: bool,
    pub low_battery: bool,
    pub battery_connected: bool,
    /// `None` when no battery capacity is configured.
    pub remaining_capacity_mah: Option<f64>,
    /// `None` while online, without a configured capacity, or when undefined.
    pub remaining_minutes: Option<f64>,
}

/// Display-rounded view of a [`Snapshot`], in the units a dashboard shows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Telemetry {
    /// Supply voltage (V), 2 decimals.
    pub voltage: f64,
    /// Current (A), 5 decimals.
    pub current: f64,
    /// Calculated power (W), 2 decimals.
    pub power: f64,
    /// State of charge (%), 1 decimal.
    pub soc: f64,
    /// Remaining capacity (mAh), whole numbers.
    pub remaining_battery_capacity: Option<f64>,
    /// Remaining runtime in minutes.
    pub remaining_time: Option<f64>,
    pub online: bool,
    pub charging: bool,
    pub low_battery: bool,
}

impl From<&Snapshot> for Telemetry {
    fn from(s: &Snapshot) -> Self {
        Self {
            voltage:                    round_to(s.psu_voltage_v, 2),
            current:                    round_to(s.current_ma / 1000.0, 5),
            power:                      round_to(s.power_calculated_w, 2),
            soc:                        round_to(s.soc_percent, 1),
            remaining_battery_capacity: s.remaining_capacity_mah.map(|c| round_to(c, 0)),
            remaining_time:             s.remaining_minutes,
            online:                     s.online,
            charging:                   s.charging,
            low_battery:                s.low_battery,
        }
    }
}

/// Round to `digits` decimals, ties to even.
pub fn round_to(value: f64, digits: i32) -> f64 {
    let scale = 10f64.powi(digits);
    (value * scale).round_ties_even() / scale
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn snapshot() -> Snapshot {
        Snapshot {
            bus_voltage_v:          7.2,
            shunt_voltage_mv:       12.0,
            current_ma:             -523.456_78,
            power_w:                3.77,
            smoothed_bus_voltage_v: 7.21,
            smoothed_current_ma:    -520.0,
            psu_voltage_v:          7.212,
            power_calculated_w:     -3.768_888,
            soc_percent:            50.04,
            real_soc_percent:       50.04,
            online:                 false,
            charging:               false,
            low_battery:            false,
            battery_connected:      true,
            remaining_capacity_mah: Some(1501.2),
            remaining_minutes:      Some(173.0),
        }
    }

    #[test]
    fn telemetry_rounds_for_display() {
        let t = Telemetry::from(&snapshot());
        assert_abs_diff_eq!(t.voltage, 7.21);
        assert_abs_diff_eq!(t.current, -0.52346);
        assert_abs_diff_eq!(t.power, -3.77);
        assert_abs_diff_eq!(t.soc, 50.0);
        assert_eq!(t.remaining_battery_capacity, Some(1501.0));
        assert_eq!(t.remaining_time, Some(173.0));
        assert!(!t.online);
    }

    #[test]
    fn telemetry_keeps_absent_values_absent() {
        let mut s = snapshot();
        s.remaining_capacity_mah = None;
        s.remaining_minutes = None;
        let t = Telemetry::from(&s);
        assert_eq!(t.remaining_battery_capacity, None);
        assert_eq!(t.remaining_time, None);
    }

    #[test]
    fn round_to_breaks_ties_to_even() {
        assert_abs_diff_eq!(round_to(2.5, 0), 2.0);
        assert_abs_diff_eq!(round_to(3.5, 0), 4.0);
    }

    #[test]
    fn channel_serializes_snake_case() {
        let json = serde_json::to_string(&Channel::BusVoltage).unwrap();
        assert_eq!(json, "\"bus_voltage\"");
        assert_eq!(Channel::ShuntVoltage.to_string(), "shunt_voltage");
    }
}
