//! # pricing-bridge
//!
//! Exposes the cycle-stepped pricing device as a blocking call. A request writes the
//! inputs, raises `calculate_en` and clocks the device until `calculation_done` rises or
//! the cycle bound runs out. Only one request is ever in flight because the bridge holds
//! the sole handle to its device.
//!
//! [`global`] wraps a process-wide bridge over the reference pricing model and [`ffi`]
//! exports it through a C ABI.

pub mod bridge;
pub mod codec;
pub mod error;
pub mod ffi;
pub mod global;

pub use bridge::{PricingBridge, PricingRequest, PricingResult, MAX_CALCULATION_CYCLES};
pub use codec::{bits_to_f64, f64_to_bits};
pub use error::BridgeError;
