//! Synchronous calculation bridge

use dut_model::ports::pricing::{
    CALCULATE_EN, CALCULATION_DONE, INVENTORY, LATENCY_CYCLES, MID_PRICE, OPTIMAL_ASK,
    OPTIMAL_BID, VOLATILITY,
};
use serde::{Deserialize, Serialize};
use simulation_clock::{ClockConfig, ClockDriver, Device};

use crate::codec::{bits_to_f64, f64_to_bits, i32_to_word};
use crate::error::BridgeError;

/// Upper bound on cycles spent waiting for `calculation_done`
pub const MAX_CALCULATION_CYCLES: u32 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricingRequest {
    pub mid_price: f64,
    pub inventory: i32,
    pub volatility: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricingResult {
    pub bid: f64,
    pub ask: f64,
    /// Device-reported calculation latency converted at the clock period
    pub latency_nanos: u32,
}

/// Blocking front end for a single pricing device.
///
/// The device is built lazily by `init` and dropped by `cleanup`; `init` on a live bridge
/// is a no-op. Holding `&mut self` for the length of a calculation is what keeps requests
/// from overlapping.
pub struct PricingBridge<D: Device> {
    factory: fn() -> D,
    clock_config: ClockConfig,
    clock: Option<ClockDriver<D>>,
}

impl<D: Device> PricingBridge<D> {
    pub fn new(factory: fn() -> D, clock_config: ClockConfig) -> Self {
        Self { factory, clock_config, clock: None }
    }

    /// Create and reset the device unless it already exists
    pub fn init(&mut self) -> Result<(), BridgeError> {
        if self.clock.is_some() {
            return Ok(());
        }
        let mut clock = ClockDriver::new((self.factory)(), self.clock_config.clone())?;
        clock.reset()?;
        tracing::info!(device = clock.device().name(), "Pricing bridge initialized");
        self.clock = Some(clock);
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.clock.is_some()
    }

    /// Run one calculation to completion.
    ///
    /// On timeout `calculate_en` is left asserted; the device may still be working on the
    /// request and the caller must not assume it is idle.
    pub fn calculate(&mut self, request: PricingRequest) -> Result<PricingResult, BridgeError> {
        let clock = self.clock.as_mut().ok_or(BridgeError::NotInitialized)?;

        clock.set_input(MID_PRICE, f64_to_bits(request.mid_price))?;
        clock.set_input(INVENTORY, i32_to_word(request.inventory))?;
        clock.set_input(VOLATILITY, f64_to_bits(request.volatility))?;
        clock.set_input(CALCULATE_EN, 1)?;

        let mut waited = 0u32;
        while clock.get_output(CALCULATION_DONE)? == 0 && waited < MAX_CALCULATION_CYCLES {
            clock.advance_cycle()?;
            waited += 1;
        }

        if clock.get_output(CALCULATION_DONE)? == 0 {
            tracing::warn!(
                mid_price = request.mid_price,
                inventory = request.inventory,
                "Pricing calculation timed out after {} cycles",
                waited
            );
            return Err(BridgeError::Timeout { cycles: waited });
        }

        let latency_cycles = clock.get_output(LATENCY_CYCLES)?;
        let result = PricingResult {
            bid: bits_to_f64(clock.get_output(OPTIMAL_BID)?),
            ask: bits_to_f64(clock.get_output(OPTIMAL_ASK)?),
            latency_nanos: clock.config().cycles_to_ns(latency_cycles).min(u64::from(u32::MAX))
                as u32,
        };

        clock.set_input(CALCULATE_EN, 0)?;
        if !Self::drain(clock)? {
            tracing::warn!(
                "calculation_done still high after {} drain cycles, next request may read a stale result",
                MAX_CALCULATION_CYCLES
            );
        }

        tracing::debug!(
            bid = result.bid,
            ask = result.ask,
            latency_nanos = result.latency_nanos,
            waited,
            "Pricing calculation complete"
        );
        Ok(result)
    }

    /// Clock until `calculation_done` falls so the next request starts from idle.
    /// Returns `false` if it is still high after the cycle bound.
    fn drain(clock: &mut ClockDriver<D>) -> Result<bool, BridgeError> {
        let mut waited = 0u32;
        while clock.get_output(CALCULATION_DONE)? != 0 {
            if waited == MAX_CALCULATION_CYCLES {
                return Ok(false);
            }
            clock.advance_cycle()?;
            waited += 1;
        }
        Ok(true)
    }

    /// Release the device. A later `init` builds a fresh one.
    pub fn cleanup(&mut self) {
        if let Some(clock) = self.clock.take() {
            tracing::info!(cycles = clock.cycle(), "Pricing bridge released");
            drop(clock.into_device());
        }
    }

    /// Cycle count of the live device, if any
    pub fn cycle(&self) -> Option<u64> {
        self.clock.as_ref().map(|c| c.cycle())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dut_model::{DeviceError, PortSpec, PricingModel};

    fn bridge() -> PricingBridge<PricingModel> {
        PricingBridge::new(PricingModel::new, ClockConfig::default())
    }

    /// Pricing unit that never raises `calculation_done`
    struct Stalled(PricingModel);

    impl Device for Stalled {
        fn name(&self) -> &'static str {
            "stalled"
        }
        fn ports(&self) -> &'static [PortSpec] {
            self.0.ports()
        }
        fn set_input(&mut self, port: &str, value: u64) -> Result<(), DeviceError> {
            self.0.set_input(port, value)
        }
        fn get_output(&self, port: &str) -> Result<u64, DeviceError> {
            match port {
                CALCULATION_DONE => Ok(0),
                _ => self.0.get_output(port),
            }
        }
        fn probe(&self, port: &str) -> Result<u64, DeviceError> {
            self.0.probe(port)
        }
        fn evaluate(&mut self) -> Result<(), DeviceError> {
            self.0.evaluate()
        }
    }

    /// Pricing unit whose `calculation_done` never falls once raised
    struct Latched {
        inner: PricingModel,
        done: bool,
    }

    impl Device for Latched {
        fn name(&self) -> &'static str {
            "latched"
        }
        fn ports(&self) -> &'static [PortSpec] {
            self.inner.ports()
        }
        fn set_input(&mut self, port: &str, value: u64) -> Result<(), DeviceError> {
            self.inner.set_input(port, value)
        }
        fn get_output(&self, port: &str) -> Result<u64, DeviceError> {
            match port {
                CALCULATION_DONE if self.done => Ok(1),
                _ => self.inner.get_output(port),
            }
        }
        fn probe(&self, port: &str) -> Result<u64, DeviceError> {
            self.inner.probe(port)
        }
        fn evaluate(&mut self) -> Result<(), DeviceError> {
            self.inner.evaluate()?;
            self.done |= self.inner.get_output(CALCULATION_DONE)? != 0;
            Ok(())
        }
    }

    #[test]
    fn test_quote_brackets_mid_price() {
        let mut bridge = bridge();
        bridge.init().unwrap();

        let result = bridge
            .calculate(PricingRequest { mid_price: 150.0, inventory: 0, volatility: 0.02 })
            .unwrap();
        assert!(result.bid < 150.0 && 150.0 < result.ask, "{result:?}");
        assert_eq!(result.latency_nanos % 4, 0);
        assert_eq!(result.latency_nanos, 16);
    }

    #[test]
    fn test_inventory_skews_quotes() {
        let mut bridge = bridge();
        bridge.init().unwrap();

        let flat = bridge
            .calculate(PricingRequest { mid_price: 100.0, inventory: 0, volatility: 0.5 })
            .unwrap();
        let long = bridge
            .calculate(PricingRequest { mid_price: 100.0, inventory: 10, volatility: 0.5 })
            .unwrap();
        let short = bridge
            .calculate(PricingRequest { mid_price: 100.0, inventory: -10, volatility: 0.5 })
            .unwrap();

        assert!(long.bid < flat.bid && long.ask < flat.ask);
        assert!(short.bid > flat.bid && short.ask > flat.ask);
        let spread = |r: PricingResult| r.ask - r.bid;
        assert!((spread(long) - spread(flat)).abs() < 1e-9);
    }

    #[test]
    fn test_back_to_back_requests_start_from_idle() {
        let mut bridge = bridge();
        bridge.init().unwrap();

        let first = bridge
            .calculate(PricingRequest { mid_price: 150.0, inventory: 0, volatility: 0.02 })
            .unwrap();
        let second = bridge
            .calculate(PricingRequest { mid_price: 300.0, inventory: 0, volatility: 0.02 })
            .unwrap();
        assert!(second.bid > first.ask);
    }

    #[test]
    fn test_calculate_requires_init() {
        let mut bridge = bridge();
        let request = PricingRequest { mid_price: 1.0, inventory: 0, volatility: 0.0 };
        assert_eq!(bridge.calculate(request), Err(BridgeError::NotInitialized));

        bridge.init().unwrap();
        bridge.cleanup();
        assert!(!bridge.is_initialized());
        assert_eq!(bridge.calculate(request), Err(BridgeError::NotInitialized));
        assert_eq!(BridgeError::NotInitialized.status_code(), -1);
    }

    #[test]
    fn test_init_is_idempotent() {
        let mut bridge = bridge();
        bridge.init().unwrap();
        let after_first = bridge.cycle();
        bridge.init().unwrap();
        assert_eq!(bridge.cycle(), after_first);
        assert_eq!(after_first, Some(6));

        let clock = bridge.clock.as_ref().unwrap();
        assert_eq!(clock.get_output(CALCULATION_DONE).unwrap(), 0);
        assert_eq!(clock.get_output(LATENCY_CYCLES).unwrap(), 0);
    }

    #[test]
    fn test_timeout_leaves_enable_asserted() {
        let mut bridge = PricingBridge::new(|| Stalled(PricingModel::new()), ClockConfig::default());
        bridge.init().unwrap();

        let err = bridge
            .calculate(PricingRequest { mid_price: 150.0, inventory: 0, volatility: 0.02 })
            .unwrap_err();
        assert_eq!(err, BridgeError::Timeout { cycles: MAX_CALCULATION_CYCLES });
        assert_eq!(bridge.cycle(), Some(6 + u64::from(MAX_CALCULATION_CYCLES)));

        let clock = bridge.clock.as_ref().unwrap();
        assert_eq!(clock.device().probe(CALCULATE_EN).unwrap(), 1);
    }

    #[test]
    fn test_drain_overrun_still_returns_quote() {
        let mut bridge = PricingBridge::new(
            || Latched { inner: PricingModel::new(), done: false },
            ClockConfig::default(),
        );
        bridge.init().unwrap();
        let before = bridge.cycle().unwrap();

        let result = bridge
            .calculate(PricingRequest { mid_price: 150.0, inventory: 0, volatility: 0.02 })
            .unwrap();
        assert!(result.bid < 150.0 && 150.0 < result.ask, "{result:?}");
        assert_eq!(result.latency_nanos, 16);

        let spent = bridge.cycle().unwrap() - before;
        assert!(spent > u64::from(MAX_CALCULATION_CYCLES), "{spent}");
    }
}
