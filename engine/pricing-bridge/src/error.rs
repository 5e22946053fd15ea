//! Error types for the pricing bridge

use simulation_clock::ClockError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BridgeError {
    /// Calculation requested before `init` or after `cleanup`
    #[error("Pricing device is not initialized")]
    NotInitialized,

    #[error("No result within {cycles} cycles")]
    Timeout { cycles: u32 },

    #[error("Clock error: {0}")]
    Clock(#[from] ClockError),
}

impl BridgeError {
    /// Status word reported across the C ABI
    pub fn status_code(&self) -> i32 {
        -1
    }
}
