//! Response collection

use dut_model::ports::pipeline::{
    EXECUTION_PRICE, EXECUTION_SYMBOL, EXECUTION_VALID, EXECUTION_VOLUME,
};
use simulation_clock::{ClockDriver, Device};

use crate::error::HarnessError;
use crate::session::SessionCounters;
use crate::types::ExecutionEvent;

fn execution_valid<D: Device>(clock: &ClockDriver<D>) -> Result<bool, HarnessError> {
    Ok(clock.get_output(EXECUTION_VALID)? != 0)
}

fn read_execution<D: Device>(
    clock: &ClockDriver<D>,
    latency_cycles: u64,
) -> Result<ExecutionEvent, HarnessError> {
    Ok(ExecutionEvent {
        entity_code: clock.get_output(EXECUTION_SYMBOL)? as u32,
        price: clock.get_output(EXECUTION_PRICE)? as u32,
        volume: clock.get_output(EXECUTION_VOLUME)? as u32,
        latency_cycles,
    })
}

/// Clock the device until it presents an execution or `max_cycles` periods have run.
///
/// Latency is the number of cycles advanced by this call. If the execution is already
/// present when the call starts, it is returned with zero latency and no clocking.
/// Running out of cycles is the normal outcome for an event that does not execute and
/// yields `Ok(None)`.
pub fn await_response<D: Device>(
    clock: &mut ClockDriver<D>,
    session: &mut SessionCounters,
    max_cycles: u32,
) -> Result<Option<ExecutionEvent>, HarnessError> {
    let start = clock.cycle();
    let mut waited = 0u32;

    while !execution_valid(clock)? && waited < max_cycles {
        clock.advance_cycle()?;
        waited += 1;
    }
    session.observe_cycle(clock.cycle());

    if !execution_valid(clock)? {
        tracing::trace!(max_cycles, "no execution within wait bound");
        return Ok(None);
    }

    let latency = clock.cycle() - start;
    let execution = read_execution(clock, latency)?;
    session.record_execution(latency);
    Ok(Some(execution))
}

/// Clock exactly `cycles` periods and return every execution presented along the way.
///
/// Latency on the returned events is counted from the start of the watch. These
/// executions are counted in the session but do not feed the latency accumulators.
pub fn watch<D: Device>(
    clock: &mut ClockDriver<D>,
    session: &mut SessionCounters,
    cycles: u32,
) -> Result<Vec<ExecutionEvent>, HarnessError> {
    let start = clock.cycle();
    let mut seen = Vec::new();

    for _ in 0..cycles {
        clock.advance_cycle()?;
        if execution_valid(clock)? {
            seen.push(read_execution(clock, clock.cycle() - start)?);
            session.record_unmeasured_execution();
        }
    }
    session.observe_cycle(clock.cycle());
    Ok(seen)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stimulus::inject_event;
    use crate::types::{entity_code, MarketEvent, MessageKind};
    use dut_model::{PipelineConfig, TradingPipelineModel};
    use proptest::prelude::*;
    use simulation_clock::ClockConfig;

    fn ready_clock(depth: u32) -> ClockDriver<TradingPipelineModel> {
        let dut = TradingPipelineModel::with_config(PipelineConfig { depth, lot_volume: 100 });
        let mut clock = ClockDriver::new(dut, ClockConfig::default()).unwrap();
        clock.reset().unwrap();
        clock
    }

    #[test]
    fn test_execution_latency_matches_pipeline_depth() {
        let mut clock = ready_clock(3);
        let mut session = SessionCounters::new();
        let event = MarketEvent::new(entity_code("AAPL"), 150_000_000, 100, MessageKind::Add);
        inject_event(&mut clock, &mut session, &event).unwrap();

        let exec = await_response(&mut clock, &mut session, 100).unwrap().unwrap();
        assert_eq!(exec.entity_code, 0x4141_504C);
        assert_eq!(exec.price, 150_000_000);
        assert_eq!(exec.volume, 100);
        assert_eq!(exec.latency_cycles, 3);

        let snap = session.snapshot();
        assert_eq!(snap.executions_observed, 1);
        assert_eq!(snap.latency_min, Some(3));
        assert_eq!(snap.total_cycles, clock.cycle());
    }

    #[test]
    fn test_raw_entity_code_is_reported_unchanged() {
        let mut clock = ready_clock(3);
        let mut session = SessionCounters::new();
        let event = MarketEvent::new(0x4141_5054, 150_000_000, 100, MessageKind::Add);
        inject_event(&mut clock, &mut session, &event).unwrap();

        let exec = await_response(&mut clock, &mut session, 100).unwrap().unwrap();
        assert!((1..=100).contains(&exec.latency_cycles), "{exec:?}");
        assert_eq!(exec.entity_code, 0x4141_5054);
        assert_eq!(exec.price, 150_000_000);
    }

    #[test]
    fn test_already_valid_output_returns_without_clocking() {
        let mut clock = ready_clock(1);
        let mut session = SessionCounters::new();
        let event = MarketEvent::new(entity_code("MSFT"), 1, 1, MessageKind::Execute);
        inject_event(&mut clock, &mut session, &event).unwrap();
        clock.advance_cycle().unwrap();

        let before = clock.cycle();
        let exec = await_response(&mut clock, &mut session, 10).unwrap().unwrap();
        assert_eq!(exec.latency_cycles, 0);
        assert_eq!(clock.cycle(), before);
    }

    #[test]
    fn test_watch_collects_every_pulse() {
        let mut clock = ready_clock(2);
        let mut session = SessionCounters::new();
        for sym in ["AAPL", "MSFT"] {
            let event = MarketEvent::new(entity_code(sym), 10, 1, MessageKind::Add);
            inject_event(&mut clock, &mut session, &event).unwrap();
        }
        let seen = watch(&mut clock, &mut session, 5).unwrap();
        let codes: Vec<u32> = seen.iter().map(|e| e.entity_code).collect();
        assert_eq!(codes, vec![entity_code("AAPL"), entity_code("MSFT")]);
        assert_eq!(session.executions_observed(), 2);
        assert_eq!(session.mean_latency(), None);
    }

    proptest! {
        #[test]
        fn silent_device_times_out_after_exactly_max_cycles(
            kinds in prop::collection::vec(
                prop_oneof![Just(MessageKind::Cancel), Just(MessageKind::Delete)], 0..20),
            max_cycles in 1u32..200,
        ) {
            let mut clock = ready_clock(3);
            let mut session = SessionCounters::new();
            for kind in &kinds {
                let event = MarketEvent::new(entity_code("TSLA"), 5, 5, *kind);
                inject_event(&mut clock, &mut session, &event).unwrap();
            }

            let before = clock.cycle();
            let response = await_response(&mut clock, &mut session, max_cycles).unwrap();
            prop_assert!(response.is_none());
            prop_assert_eq!(clock.cycle() - before, u64::from(max_cycles));
            prop_assert_eq!(session.executions_observed(), 0);
            prop_assert_eq!(session.events_injected(), kinds.len() as u64);
        }
    }
}
