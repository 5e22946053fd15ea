//! # dut-model
//!
//! The boundary between the test harness and the hardware design being exercised.
//!
//! A device under test is an opaque, edge-triggered state machine. The harness can only
//! drive its declared input ports, read its declared output ports and ask it to evaluate.
//! Anything that satisfies [`Device`] (a generated simulation model, a co-simulation shim,
//! or one of the behavioural reference devices in this crate) can be plugged into the
//! clock driver.

pub mod device;
pub mod error;
pub mod pipeline;
pub mod ports;
pub mod pricing;
pub mod settle;

pub use device::{Device, PortDirection, PortSpec};
pub use error::DeviceError;
pub use pipeline::{PipelineConfig, TradingPipelineModel};
pub use pricing::{PricingModel, PricingParams};
pub use settle::{settle, SETTLE_LIMIT};
