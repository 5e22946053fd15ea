//! Error types for device models

use thiserror::Error;

/// Errors reported by a device model
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeviceError {
    #[error("Device {device} has no port named {port}")]
    UnknownPort { device: &'static str, port: String },

    #[error("Port {port} is not an input")]
    NotAnInput { port: String },

    #[error("Port {port} is not an output")]
    NotAnOutput { port: String },

    #[error("Value {value:#x} does not fit in {width}-bit port {port}")]
    ValueTooWide { port: String, width: u8, value: u64 },

    /// The model's evaluation did not become quiescent within its iteration bound.
    /// A device that reports this is malformed; the harness cannot recover it.
    #[error("{region} region did not converge after {iterations} iterations")]
    Convergence { region: &'static str, iterations: u32 },
}

impl DeviceError {
    /// Whether this error leaves the device in an unusable state
    pub fn is_fatal(&self) -> bool {
        matches!(self, DeviceError::Convergence { .. })
    }
}
