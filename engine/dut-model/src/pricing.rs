//! Behavioural reference model of the inventory-aware quote pricing unit

use crate::device::{find_port, Device, PortSpec};
use crate::error::DeviceError;
use crate::ports::{pricing::*, CLK, RST_N};
use crate::settle::settle;

const NAME: &str = "hjb_calculator";

static PORTS: [PortSpec; 10] = [
    PortSpec::input(CLK, 1),
    PortSpec::input(RST_N, 1),
    PortSpec::input(CALCULATE_EN, 1),
    PortSpec::input(MID_PRICE, 64),
    PortSpec::input(INVENTORY, 32),
    PortSpec::input(VOLATILITY, 64),
    PortSpec::output(CALCULATION_DONE, 1),
    PortSpec::output(OPTIMAL_BID, 64),
    PortSpec::output(OPTIMAL_ASK, 64),
    PortSpec::output(LATENCY_CYCLES, 32),
];

/// Market-making parameters baked into the design
#[derive(Debug, Clone, Copy)]
pub struct PricingParams {
    /// Risk aversion (gamma)
    pub risk_aversion: f64,
    /// Spread floor, as a fraction of mid
    pub base_spread: f64,
}

impl Default for PricingParams {
    fn default() -> Self {
        Self { risk_aversion: 0.1, base_spread: 0.001 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Idle,
    Reservation,
    Spread,
    Quote,
    Done,
}

/// Four-step quote calculator.
///
/// `calculate_en` starts a calculation from idle; `calculation_done` rises once the quote
/// registers hold the result and stays high until enable drops and the next edge returns
/// the machine to idle.
#[derive(Debug)]
pub struct PricingModel {
    params: PricingParams,

    clk: u8,
    rst_n: u8,
    calculate_en: u8,
    mid_price: u64,
    inventory: u32,
    volatility: u64,

    calculation_done: u8,
    optimal_bid: u64,
    optimal_ask: u64,
    latency_cycles: u32,

    prev_clk: u8,
    stage: Stage,
    cycle_counter: u32,
    reservation: f64,
    half_spread: f64,
}

impl PricingModel {
    pub fn new() -> Self {
        Self::with_params(PricingParams::default())
    }

    pub fn with_params(params: PricingParams) -> Self {
        Self {
            params,
            clk: 0,
            rst_n: 0,
            calculate_en: 0,
            mid_price: 0,
            inventory: 0,
            volatility: 0,
            calculation_done: 0,
            optimal_bid: 0,
            optimal_ask: 0,
            latency_cycles: 0,
            prev_clk: 0,
            stage: Stage::Idle,
            cycle_counter: 0,
            reservation: 0.0,
            half_spread: 0.0,
        }
    }

    fn on_posedge(&mut self) {
        if self.rst_n == 0 {
            self.stage = Stage::Idle;
            self.cycle_counter = 0;
            self.optimal_bid = 0;
            self.optimal_ask = 0;
            self.calculation_done = 0;
            self.latency_cycles = 0;
            return;
        }

        let mid = f64::from_bits(self.mid_price);
        let sigma = f64::from_bits(self.volatility);
        let q = f64::from(self.inventory as i32);
        let variance = sigma * sigma;

        match self.stage {
            Stage::Idle => {
                self.cycle_counter = 0;
                self.calculation_done = 0;
                if self.calculate_en == 1 {
                    self.cycle_counter = 1;
                    self.stage = Stage::Reservation;
                }
            }
            Stage::Reservation => {
                self.cycle_counter += 1;
                self.reservation = mid - q * self.params.risk_aversion * variance * mid;
                self.stage = Stage::Spread;
            }
            Stage::Spread => {
                self.cycle_counter += 1;
                self.half_spread =
                    mid * (self.params.risk_aversion * variance + self.params.base_spread) / 2.0;
                self.stage = Stage::Quote;
            }
            Stage::Quote => {
                self.cycle_counter += 1;
                self.optimal_bid = (self.reservation - self.half_spread).to_bits();
                self.optimal_ask = (self.reservation + self.half_spread).to_bits();
                self.stage = Stage::Done;
            }
            Stage::Done => {
                self.calculation_done = 1;
                self.latency_cycles = self.cycle_counter;
                if self.calculate_en == 0 {
                    self.stage = Stage::Idle;
                }
            }
        }
    }
}

impl Default for PricingModel {
    fn default() -> Self {
        Self::new()
    }
}

impl Device for PricingModel {
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
            CALCULATE_EN => self.calculate_en = value as u8,
            MID_PRICE => self.mid_price = value,
            INVENTORY => self.inventory = value as u32,
            VOLATILITY => self.volatility = value,
            _ => return Err(DeviceError::NotAnInput { port: port.to_string() }),
        }
        Ok(())
    }

    fn get_output(&self, port: &str) -> Result<u64, DeviceError> {
        let value = match port {
            CALCULATION_DONE => u64::from(self.calculation_done),
            OPTIMAL_BID => self.optimal_bid,
            OPTIMAL_ASK => self.optimal_ask,
            LATENCY_CYCLES => u64::from(self.latency_cycles),
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
            CALCULATE_EN => Ok(u64::from(self.calculate_en)),
            MID_PRICE => Ok(self.mid_price),
            INVENTORY => Ok(u64::from(self.inventory)),
            VOLATILITY => Ok(self.volatility),
            _ => self.get_output(port),
        }
    }

    fn evaluate(&mut self) -> Result<(), DeviceError> {
        settle("nba", || {
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
