//! Error types for the clock driver

use dut_model::DeviceError;
use thiserror::Error;

/// Errors that can occur while driving a device
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClockError {
    #[error("Device error: {0}")]
    Device(#[from] DeviceError),

    /// A previous evaluation failed to converge; the device state is undefined
    #[error("Clock halted after a fatal device fault")]
    Halted,

    #[error("Device is still in reset")]
    InReset,

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ClockError {
    /// Whether the error ends the session for this device instance
    pub fn is_fatal(&self) -> bool {
        match self {
            ClockError::Device(e) => e.is_fatal(),
            ClockError::Halted => true,
            _ => false,
        }
    }
}
