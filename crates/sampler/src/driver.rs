use std::path::{Path, PathBuf};
use ups_core::{Reading, Result, UpsError};

/// Source of raw power-monitor readings.
pub trait PowerMonitor {
    /// Read all four quantities once.
    fn read(&mut self) -> Result<Reading>;
}

impl<T: PowerMonitor + ?Sized> PowerMonitor for Box<T> {
    fn read(&mut self) -> Result<Reading> {
        (**self).read()
    }
}

const HWMON_ROOT: &str = "/sys/class/hwmon";

/// INA219 exposed by the Linux `ina2xx` hwmon driver.
///
/// Attribute units: `in0_input` shunt mV, `in1_input` bus mV,
/// `curr1_input` mA, `power1_input` µW.
#[derive(Debug, Clone)]
pub struct HwmonPowerMonitor {
    base: PathBuf,
}

impl HwmonPowerMonitor {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    /// Find the first hwmon device whose `name` is `ina219`.
    pub fn discover() -> Result<Self> {
        Self::discover_in(HWMON_ROOT)
    }

    pub fn discover_in(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        let mut dirs: Vec<PathBuf> = std::fs::read_dir(root)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .collect();
        dirs.sort();

        for dir in dirs {
            let Ok(name) = std::fs::read_to_string(dir.join("name")) else {
                continue;
            };
            if name.trim() == "ina219" {
                tracing::info!("Found INA219 at {}", dir.display());
                return Ok(Self::new(dir));
            }
        }
        Err(UpsError::Driver(format!(
            "no ina219 hwmon device under '{}'",
            root.display()
        )))
    }

    pub fn path(&self) -> &Path {
        &self.base
    }

    fn attr(&self, name: &str) -> Result<f64> {
        let path = self.base.join(name);
        let raw = std::fs::read_to_string(&path)
            .map_err(|e| UpsError::Driver(format!("cannot read '{}': {e}", path.display())))?;
        raw.trim()
            .parse::<f64>()
            .map_err(|e| UpsError::Driver(format!("bad value {:?} in '{}': {e}", raw.trim(), path.display())))
    }
}

impl PowerMonitor for HwmonPowerMonitor {
    fn read(&mut self) -> Result<Reading> {
        Ok(Reading {
            bus_voltage_v:    self.attr("in1_input")? / 1000.0,
            shunt_voltage_mv: self.attr("in0_input")?,
            current_ma:       self.attr("curr1_input")?,
            power_w:          self.attr("power1_input")? / 1_000_000.0,
        })
    }
}
