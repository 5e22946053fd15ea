//! Behavioural reference model of the market-data / order-matching pipeline

use std::collections::VecDeque;

use crate::device::{find_port, Device, PortSpec};
use crate::error::DeviceError;
use crate::ports::{pipeline::*, CLK, RST_N};
use crate::settle::settle;

const NAME: &str = "trading_pipeline";

static PORTS: [PortSpec; 10] = [
    PortSpec::input(CLK, 1),
    PortSpec::input(RST_N, 1),
    PortSpec::input(MARKET_DATA_VALID, 1),
    PortSpec::input(MARKET_DATA_IN, 64),
    PortSpec::input(MARKET_DATA_TYPE, 8),
    PortSpec::output(EXECUTION_VALID, 1),
    PortSpec::output(EXECUTION_SYMBOL, 32),
    PortSpec::output(EXECUTION_PRICE, 32),
    PortSpec::output(EXECUTION_VOLUME, 32),
    PortSpec::output("pipeline_occupancy", 16),
];

/// Wire codes of the message kinds that lead to an execution
const KIND_ADD: u8 = 0x41;
const KIND_EXECUTE: u8 = 0x45;

#[derive(Debug, Clone, Copy)]
pub struct PipelineConfig {
    /// Clock edges between latching an event and presenting its execution (min 1)
    pub depth: u32,
    /// Volume reported on every execution
    pub lot_volume: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self { depth: 3, lot_volume: 100 }
    }
}

#[derive(Debug, Clone, Copy)]
struct InFlight {
    due_edge: u64,
    symbol: u32,
    price: u32,
}

/// Posedge-triggered pipeline with synchronous active-low reset.
///
/// Add and Execute events are filled at the injected price after `depth` edges; the
/// execution is presented for exactly one cycle. Cancel, Delete and unknown kinds are
/// consumed without output.
#[derive(Debug)]
pub struct TradingPipelineModel {
    config: PipelineConfig,

    // inputs
    clk: u8,
    rst_n: u8,
    md_valid: u8,
    md_in: u64,
    md_type: u8,

    // registered outputs
    exec_valid: u8,
    exec_symbol: u32,
    exec_price: u32,
    exec_volume: u32,

    prev_clk: u8,
    edges: u64,
    in_flight: VecDeque<InFlight>,
}

impl TradingPipelineModel {
    pub fn new() -> Self {
        Self::with_config(PipelineConfig::default())
    }

    pub fn with_config(config: PipelineConfig) -> Self {
        let config = PipelineConfig { depth: config.depth.max(1), ..config };
        Self {
            config,
            clk: 0,
            rst_n: 0,
            md_valid: 0,
            md_in: 0,
            md_type: 0,
            exec_valid: 0,
            exec_symbol: 0,
            exec_price: 0,
            exec_volume: 0,
            prev_clk: 0,
            edges: 0,
            in_flight: VecDeque::new(),
        }
    }

    pub fn config(&self) -> PipelineConfig {
        self.config
    }

    fn on_posedge(&mut self) {
        if self.rst_n == 0 {
            self.exec_valid = 0;
            self.exec_symbol = 0;
            self.exec_price = 0;
            self.exec_volume = 0;
            self.edges = 0;
            self.in_flight.clear();
            return;
        }

        self.edges += 1;
        self.exec_valid = 0;

        if self.in_flight.front().is_some_and(|f| f.due_edge <= self.edges) {
            if let Some(done) = self.in_flight.pop_front() {
                self.exec_valid = 1;
                self.exec_symbol = done.symbol;
                self.exec_price = done.price;
                self.exec_volume = self.config.lot_volume;
            }
        }

        if self.md_valid == 1 && matches!(self.md_type, KIND_ADD | KIND_EXECUTE) {
            self.in_flight.push_back(InFlight {
                due_edge: self.edges + u64::from(self.config.depth),
                symbol: (self.md_in >> 32) as u32,
                price: self.md_in as u32,
            });
        }
    }
}

impl Default for TradingPipelineModel {
    fn default() -> Self {
        Self::new()
    }
}

impl Device for TradingPipelineModel {
    fn name(&self) -> &'static str {
        NAME
    }

    fn ports(&self) -> &'static [PortSpec] {
        &PORTS
    }

    fn set_input(&mut self, port: &str, value: u64) -> Result<(), DeviceError> {
        find_port(NAME, &PORTS, port)?.check_drive(value)?;
        match port {
            CLK => self.clk = value as u8,
            RST_N => self.rst_n = value as u8,
            MARKET_DATA_VALID => self.md_valid = value as u8,
            MARKET_DATA_IN => self.md_in = value,
            MARKET_DATA_TYPE => self.md_type = value as u8,
            _ => return Err(DeviceError::NotAnInput { port: port.to_string() }),
        }
        Ok(())
    }

    fn get_output(&self, port: &str) -> Result<u64, DeviceError> {
        let value = match port {
            EXECUTION_VALID => u64::from(self.exec_valid),
            EXECUTION_SYMBOL => u64::from(self.exec_symbol),
            EXECUTION_PRICE => u64::from(self.exec_price),
            EXECUTION_VOLUME => u64::from(self.exec_volume),
            "pipeline_occupancy" => self.in_flight.len().min(u16::MAX as usize) as u64,
            _ => {
                find_port(NAME, &PORTS, port)?;
                return Err(DeviceError::NotAnOutput { port: port.to_string() });
            }
        };
        Ok(value)
    }

    fn probe(&self, port: &str) -> Result<u64, DeviceError> {
        match port {
            CLK => Ok(u64::from(self.clk)),
            RST_N => Ok(u64::from(self.rst_n)),
            MARKET_DATA_VALID => Ok(u64::from(self.md_valid)),
            MARKET_DATA_IN => Ok(self.md_in),
            MARKET_DATA_TYPE => Ok(u64::from(self.md_type)),
            _ => self.get_output(port),
        }
    }

    fn evaluate(&mut self) -> Result<(), DeviceError> {
        settle("active", || {
            let posedge = self.clk == 1 && self.prev_clk == 0;
            self.prev_clk = self.clk;
            if posedge {
                self.on_posedge();
            }
            posedge
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge(dut: &mut TradingPipelineModel) {
        dut.set_input(CLK, 0).unwrap();
        dut.evaluate().unwrap();
        dut.set_input(CLK, 1).unwrap();
        dut.evaluate().unwrap();
    }

    fn out_of_reset() -> TradingPipelineModel {
        let mut dut = TradingPipelineModel::new();
        edge(&mut dut);
        dut.set_input(RST_N, 1).unwrap();
        edge(&mut dut);
        dut
    }

    #[test]
    fn add_executes_after_pipeline_depth() {
        let mut dut = out_of_reset();
        dut.set_input(MARKET_DATA_IN, (0x4141_5054u64 << 32) | 150_000_000).unwrap();
        dut.set_input(MARKET_DATA_TYPE, 0x41).unwrap();
        dut.set_input(MARKET_DATA_VALID, 1).unwrap();
        edge(&mut dut);
        dut.set_input(MARKET_DATA_VALID, 0).unwrap();

        for _ in 0..2 {
            edge(&mut dut);
            assert_eq!(dut.get_output(EXECUTION_VALID).unwrap(), 0);
        }
        edge(&mut dut);
        assert_eq!(dut.get_output(EXECUTION_VALID).unwrap(), 1);
        assert_eq!(dut.get_output(EXECUTION_SYMBOL).unwrap(), 0x4141_5054);
        assert_eq!(dut.get_output(EXECUTION_PRICE).unwrap(), 150_000_000);
        assert_eq!(dut.get_output(EXECUTION_VOLUME).unwrap(), 100);

        // one-cycle pulse
        edge(&mut dut);
        assert_eq!(dut.get_output(EXECUTION_VALID).unwrap(), 0);
    }

    #[test]
    fn cancel_never_executes() {
        let mut dut = out_of_reset();
        dut.set_input(MARKET_DATA_IN, 1 << 32).unwrap();
        dut.set_input(MARKET_DATA_TYPE, 0x58).unwrap();
        dut.set_input(MARKET_DATA_VALID, 1).unwrap();
        edge(&mut dut);
        dut.set_input(MARKET_DATA_VALID, 0).unwrap();
        for _ in 0..10 {
            edge(&mut dut);
            assert_eq!(dut.get_output(EXECUTION_VALID).unwrap(), 0);
        }
    }

    #[test]
    fn reset_flushes_in_flight_events() {
        let mut dut = out_of_reset();
        dut.set_input(MARKET_DATA_TYPE, 0x45).unwrap();
        dut.set_input(MARKET_DATA_VALID, 1).unwrap();
        edge(&mut dut);
        assert_eq!(dut.get_output("pipeline_occupancy").unwrap(), 1);

        dut.set_input(RST_N, 0).unwrap();
        edge(&mut dut);
        assert_eq!(dut.get_output("pipeline_occupancy").unwrap(), 0);
        assert_eq!(dut.get_output(EXECUTION_VALID).unwrap(), 0);
    }

    #[test]
    fn clock_low_evaluation_is_inert() {
        let mut dut = out_of_reset();
        dut.set_input(MARKET_DATA_TYPE, 0x41).unwrap();
        dut.set_input(MARKET_DATA_VALID, 1).unwrap();
        dut.set_input(CLK, 0).unwrap();
        dut.evaluate().unwrap();
        dut.evaluate().unwrap();
        assert_eq!(dut.get_output("pipeline_occupancy").unwrap(), 0);
    }

    #[test]
    fn port_misuse_is_reported() {
        let mut dut = TradingPipelineModel::new();
        assert!(matches!(dut.set_input("bogus", 1), Err(DeviceError::UnknownPort { .. })));
        assert!(matches!(dut.set_input(EXECUTION_VALID, 1), Err(DeviceError::NotAnInput { .. })));
        assert!(matches!(dut.get_output(MARKET_DATA_IN), Err(DeviceError::NotAnOutput { .. })));
        assert!(matches!(
            dut.set_input(MARKET_DATA_VALID, 2),
            Err(DeviceError::ValueTooWide { width: 1, .. })
        ));
    }
}
