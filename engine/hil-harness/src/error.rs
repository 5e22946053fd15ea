//! Error types for the harness

use simulation_clock::ClockError;
use thiserror::Error;

/// Structural harness failures. Response timeouts are not errors; they surface as
/// `None` from the collector.
#[derive(Error, Debug)]
pub enum HarnessError {
    #[error("Clock error: {0}")]
    Clock(#[from] ClockError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("CSV line {line}: {reason}")]
    Csv { line: usize, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl HarnessError {
    /// Whether the device instance is unusable after this error
    pub fn is_fatal(&self) -> bool {
        matches!(self, HarnessError::Clock(e) if e.is_fatal())
    }
}

impl From<config::ConfigError> for HarnessError {
    fn from(err: config::ConfigError) -> Self {
        HarnessError::Config(err.to_string())
    }
}
