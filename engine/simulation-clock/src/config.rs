//! Configuration for the clock driver

use crate::{error::ClockError, DEFAULT_PERIOD_NS, DEFAULT_RESET_HOLD_CYCLES};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration for the ClockDriver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClockConfig {
    /// Clock period in device time units (ns). Must be even so the half-period is exact.
    pub period_ns: u64,

    /// Cycles reset stays asserted before release
    pub reset_hold_cycles: u32,

    /// Write a value-change dump here when set
    pub trace_path: Option<PathBuf>,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            period_ns: DEFAULT_PERIOD_NS,
            reset_hold_cycles: DEFAULT_RESET_HOLD_CYCLES,
            trace_path: None,
        }
    }
}

impl ClockConfig {
    pub fn validate(&self) -> Result<(), ClockError> {
        if self.period_ns == 0 || self.period_ns % 2 != 0 {
            return Err(ClockError::Config(format!(
                "period_ns must be even and non-zero, got {}",
                self.period_ns
            )));
        }
        if self.reset_hold_cycles == 0 {
            return Err(ClockError::Config("reset_hold_cycles must be at least 1".into()));
        }
        Ok(())
    }

    /// Simulated clock frequency in MHz
    pub fn frequency_mhz(&self) -> f64 {
        1000.0 / self.period_ns as f64
    }

    /// Convert a cycle count into device nanoseconds
    #[inline]
    pub fn cycles_to_ns(&self, cycles: u64) -> u64 {
        cycles * self.period_ns
    }

    /// Load configuration from TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ClockError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ClockError::Config(format!("{}: {e}", path.as_ref().display())))?;
        let config: ClockConfig =
            toml::from_str(&content).map_err(|e| ClockError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn to_file(&self, path: impl AsRef<Path>) -> Result<(), ClockError> {
        let content =
            toml::to_string_pretty(self).map_err(|e| ClockError::Config(e.to_string()))?;
        std::fs::write(path.as_ref(), content)
            .map_err(|e| ClockError::Config(format!("{}: {e}", path.as_ref().display())))
    }
}
