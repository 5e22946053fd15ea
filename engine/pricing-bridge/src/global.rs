//! Process-wide pricing bridge over the reference pricing model
//!
//! At most one device handle exists per process. `init` creates it on first use and is a
//! no-op afterwards; `cleanup` drops it so a later `init` starts over.

use dut_model::PricingModel;
use parking_lot::{const_mutex, Mutex};
use simulation_clock::ClockConfig;

use crate::bridge::{PricingBridge, PricingRequest, PricingResult};
use crate::error::BridgeError;

static BRIDGE: Mutex<Option<PricingBridge<PricingModel>>> = const_mutex(None);

pub fn init() -> Result<(), BridgeError> {
    BRIDGE
        .lock()
        .get_or_insert_with(|| PricingBridge::new(PricingModel::new, ClockConfig::default()))
        .init()
}

pub fn is_initialized() -> bool {
    BRIDGE.lock().as_ref().is_some_and(PricingBridge::is_initialized)
}

pub fn calculate(request: PricingRequest) -> Result<PricingResult, BridgeError> {
    BRIDGE.lock().as_mut().ok_or(BridgeError::NotInitialized)?.calculate(request)
}

pub fn cleanup() {
    if let Some(bridge) = BRIDGE.lock().as_mut() {
        bridge.cleanup();
    }
}
