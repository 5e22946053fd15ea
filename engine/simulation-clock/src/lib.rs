//! # SimulationClock
//!
//! Drives logical time for a device under test.
//!
//! One call to [`ClockDriver::advance_cycle`] is one full clock period: the clock is driven
//! low and the device evaluated, then driven high and evaluated again. The cycle counter
//! is the only time base the harness uses for correctness; wall-clock time only ever
//! appears in reports.

pub mod clock;
pub mod config;
pub mod error;
pub mod trace;

#[cfg(test)]
mod tests;

pub use clock::ClockDriver;
pub use config::ClockConfig;
pub use error::ClockError;
pub use trace::{MemoryTrace, SignalSample, VcdWriter, WaveformSink};

/// Re-export the device boundary so callers need a single dependency
pub use dut_model::{Device, DeviceError};

/// Current version of the SimulationClock
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default clock period (4ns = 250MHz)
pub const DEFAULT_PERIOD_NS: u64 = 4;

/// Cycles reset is held asserted before release
pub const DEFAULT_RESET_HOLD_CYCLES: u32 = 5;
