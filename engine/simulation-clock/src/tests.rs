//! Unit tests for the ClockDriver

use dut_model::ports::{pipeline, CLK, RST_N};
use dut_model::{Device, DeviceError, PortSpec, TradingPipelineModel};

use crate::{ClockConfig, ClockDriver, ClockError, MemoryTrace, DEFAULT_PERIOD_NS};

/// Records every evaluation it sees
#[derive(Default)]
struct ProbeDevice {
    clk: u8,
    rst_n: u8,
    data: u64,
    prev_clk: u8,
    evaluations: u64,
    posedges: u64,
    posedges_in_reset: u64,
    diverge: bool,
}

static PROBE_PORTS: [PortSpec; 4] = [
    PortSpec::input(CLK, 1),
    PortSpec::input(RST_N, 1),
    PortSpec::input("data", 16),
    PortSpec::output("posedges", 32),
];

impl Device for ProbeDevice {
    fn name(&self) -> &'static str {
        "probe"
    }

    fn ports(&self) -> &'static [PortSpec] {
        &PROBE_PORTS
    }

    fn set_input(&mut self, port: &str, value: u64) -> Result<(), DeviceError> {
        match port {
            CLK => self.clk = value as u8,
            RST_N => self.rst_n = value as u8,
            "data" => self.data = value,
            _ => return Err(DeviceError::UnknownPort { device: "probe", port: port.into() }),
        }
        Ok(())
    }

    fn get_output(&self, port: &str) -> Result<u64, DeviceError> {
        match port {
            "posedges" => Ok(self.posedges),
            _ => Err(DeviceError::NotAnOutput { port: port.into() }),
        }
    }

    fn probe(&self, port: &str) -> Result<u64, DeviceError> {
        match port {
            CLK => Ok(u64::from(self.clk)),
            RST_N => Ok(u64::from(self.rst_n)),
            "data" => Ok(self.data),
            _ => self.get_output(port),
        }
    }

    fn evaluate(&mut self) -> Result<(), DeviceError> {
        if self.diverge {
            return dut_model::settle("nba", || true).map(|_| ());
        }
        self.evaluations += 1;
        if self.clk == 1 && self.prev_clk == 0 {
            self.posedges += 1;
            if self.rst_n == 0 {
                self.posedges_in_reset += 1;
            }
        }
        self.prev_clk = self.clk;
        Ok(())
    }
}

fn probe_driver() -> ClockDriver<ProbeDevice> {
    ClockDriver::new(ProbeDevice::default(), ClockConfig::default()).unwrap()
}

#[cfg(test)]
mod driver_tests {
    use super::*;

    #[test]
    fn test_advance_cycle_is_two_evaluations_and_one_edge() {
        let mut driver = probe_driver();
        assert_eq!(driver.advance_cycle().unwrap(), 1);
        assert_eq!(driver.device().evaluations, 2);
        assert_eq!(driver.device().posedges, 1);
        assert_eq!(driver.cycle(), 1);
    }

    #[test]
    fn test_trace_timestamps_follow_half_periods() {
        let mut driver = probe_driver();
        let trace = MemoryTrace::new(64);
        driver.attach_sink(Box::new(trace.clone()));
        driver.idle(3).unwrap();

        assert_eq!(trace.timestamps(), vec![0, 2, 4, 6, 8, 10]);
        let clk: Vec<u64> = trace.values_of(CLK).into_iter().map(|(_, v)| v).collect();
        assert_eq!(clk, vec![0, 1, 0, 1, 0, 1]);
    }

    #[test]
    fn test_reset_protocol() {
        let mut driver = probe_driver();
        driver.set_input("data", 0xBEEF).unwrap();
        assert!(matches!(driver.require_out_of_reset(), Err(ClockError::InReset)));

        driver.reset().unwrap();

        let dev = driver.device();
        assert_eq!(dev.posedges_in_reset, 5);
        assert_eq!(dev.posedges, 6);
        assert_eq!(dev.rst_n, 1);
        assert_eq!(dev.data, 0);
        assert_eq!(driver.cycle(), 6);
        assert!(driver.is_out_of_reset());
        assert!(driver.require_out_of_reset().is_ok());
    }

    #[test]
    fn test_reset_leaves_pipeline_quiet() {
        let mut driver =
            ClockDriver::new(TradingPipelineModel::new(), ClockConfig::default()).unwrap();
        driver.reset().unwrap();
        assert_eq!(driver.get_output(pipeline::EXECUTION_VALID).unwrap(), 0);
        assert_eq!(driver.get_output("pipeline_occupancy").unwrap(), 0);
    }

    #[test]
    fn test_convergence_failure_halts_the_clock() {
        let mut driver = probe_driver();
        driver.device_mut().diverge = true;

        let err = driver.advance_cycle().unwrap_err();
        assert!(matches!(err, ClockError::Device(DeviceError::Convergence { .. })));
        assert!(err.is_fatal());
        assert!(driver.is_halted());
        assert_eq!(driver.cycle(), 0);

        driver.device_mut().diverge = false;
        assert_eq!(driver.advance_cycle(), Err(ClockError::Halted));
        assert_eq!(driver.reset(), Err(ClockError::Halted));
        assert_eq!(driver.get_output("posedges"), Err(ClockError::Halted));
    }

    #[test]
    fn test_unknown_port_is_not_fatal() {
        let mut driver = probe_driver();
        let err = driver.set_input("nope", 1).unwrap_err();
        assert!(!err.is_fatal());
        assert!(driver.advance_cycle().is_ok());
    }
}

#[cfg(test)]
mod config_tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_clock_config_default() {
        let config = ClockConfig::default();
        assert_eq!(config.period_ns, DEFAULT_PERIOD_NS);
        assert_eq!(config.reset_hold_cycles, 5);
        assert_eq!(config.frequency_mhz(), 250.0);
        assert_eq!(config.cycles_to_ns(25), 100);
    }

    #[test]
    fn test_invalid_configs_rejected() {
        let odd = ClockConfig { period_ns: 3, ..Default::default() };
        assert!(matches!(odd.validate(), Err(ClockError::Config(_))));
        assert!(ClockDriver::new(ProbeDevice::default(), odd).is_err());

        let no_hold = ClockConfig { reset_hold_cycles: 0, ..Default::default() };
        assert!(no_hold.validate().is_err());
    }

    #[test]
    fn test_config_file_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("clock.toml");
        let config = ClockConfig { period_ns: 10, reset_hold_cycles: 8, trace_path: None };
        config.to_file(&path).unwrap();
        assert_eq!(ClockConfig::from_file(&path).unwrap(), config);
    }

    #[test]
    fn test_partial_config_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("clock.toml");
        std::fs::write(&path, "period_ns = 8\n").unwrap();
        let config = ClockConfig::from_file(&path).unwrap();
        assert_eq!(config.period_ns, 8);
        assert_eq!(config.reset_hold_cycles, 5);
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn cycle_counter_tracks_every_advance(n in 0u64..500) {
            let mut driver = probe_driver();
            let mut last = driver.cycle();
            for _ in 0..n {
                let now = driver.advance_cycle().unwrap();
                prop_assert_eq!(now, last + 1);
                last = now;
            }
            prop_assert_eq!(driver.cycle(), n);
            prop_assert_eq!(driver.device().posedges, n);
        }
    }
}
