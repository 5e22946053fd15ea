//! C ABI over the process-wide bridge
//!
//! Every call returns `0` on success and `-1` on any failure, matching
//! [`BridgeError::status_code`](crate::BridgeError::status_code).

use crate::bridge::PricingRequest;
use crate::global;

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PricingResultC {
    pub bid: f64,
    pub ask: f64,
    pub latency_ns: u32,
}

#[no_mangle]
pub extern "C" fn pricing_init() -> i32 {
    match global::init() {
        Ok(()) => 0,
        Err(e) => {
            tracing::error!("pricing_init failed: {}", e);
            e.status_code()
        }
    }
}

/// # Safety
///
/// `result` must be null or point to writable memory for one `PricingResultC`.
#[no_mangle]
pub unsafe extern "C" fn pricing_calculate(
    mid_price: f64,
    inventory: i32,
    volatility: f64,
    result: *mut PricingResultC,
) -> i32 {
    if result.is_null() {
        return -1;
    }
    match global::calculate(PricingRequest { mid_price, inventory, volatility }) {
        Ok(r) => {
            // SAFETY: non-null and writable per the caller contract above
            unsafe {
                result.write(PricingResultC { bid: r.bid, ask: r.ask, latency_ns: r.latency_nanos })
            };
            0
        }
        Err(e) => e.status_code(),
    }
}

#[no_mangle]
pub extern "C" fn pricing_cleanup() {
    global::cleanup();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::global::test_support::serial;
    use std::ptr;

    #[test]
    fn test_c_entry_points() {
        let _guard = serial();
        pricing_cleanup();

        let mut out = PricingResultC::default();
        assert_eq!(unsafe { pricing_calculate(150.0, 0, 0.02, &mut out) }, -1);

        assert_eq!(pricing_init(), 0);
        assert_eq!(pricing_init(), 0);
        assert_eq!(unsafe { pricing_calculate(150.0, 0, 0.02, ptr::null_mut()) }, -1);
        assert_eq!(unsafe { pricing_calculate(150.0, 0, 0.02, &mut out) }, 0);
        assert!(out.bid < 150.0 && 150.0 < out.ask);
        assert_eq!(out.latency_ns, 16);

        pricing_cleanup();
        assert_eq!(unsafe { pricing_calculate(150.0, 0, 0.02, &mut out) }, -1);
    }
}
