//! Stimulus injection

use dut_model::ports::pipeline::{MARKET_DATA_IN, MARKET_DATA_TYPE, MARKET_DATA_VALID};
use simulation_clock::{ClockDriver, Device};

use crate::error::HarnessError;
use crate::session::SessionCounters;
use crate::types::MarketEvent;

/// Present `event` to the device as a one-cycle pulse.
///
/// The word, kind and valid strobe are asserted, exactly one clock period runs, and the
/// strobe is dropped again. There is no ready handshake: the device is assumed to accept
/// one event on every cycle it is given. The injected-events counter moves by one whether
/// or not the event later executes.
pub fn inject_event<D: Device>(
    clock: &mut ClockDriver<D>,
    session: &mut SessionCounters,
    event: &MarketEvent,
) -> Result<(), HarnessError> {
    clock.require_out_of_reset()?;

    clock.set_input(MARKET_DATA_TYPE, u64::from(event.kind.code()))?;
    clock.set_input(MARKET_DATA_IN, event.packed_word())?;
    clock.set_input(MARKET_DATA_VALID, 1)?;

    clock.advance_cycle()?;

    clock.set_input(MARKET_DATA_VALID, 0)?;

    session.record_injection();
    session.observe_cycle(clock.cycle());
    Ok(())
}
