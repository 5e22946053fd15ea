//! Scenario orchestration
//!
//! The [`Harness`] owns its device (through the clock driver) and its session counters
//! for its whole lifetime. Scenarios run back to back against the same live device and
//! are separated by an idle settle period. A failing scenario never stops the ones after
//! it, with one exception: once the device model fails to converge the session is
//! poisoned and every later scenario is skipped.

use std::time::Instant;

use simulation_clock::{ClockDriver, Device, WaveformSink};

use crate::collector::{await_response, watch};
use crate::config::HarnessConfig;
use crate::error::HarnessError;
use crate::report::SessionReport;
use crate::scenario::{
    stress_kind, Interference, Scenario, ScenarioDetail, ScenarioOutcome, ScenarioStatus,
    ThroughputFigures,
};
use crate::session::SessionCounters;
use crate::stats::LatencyStats;
use crate::stimulus::inject_event;
use crate::types::{entity_code, entity_symbol, MarketEvent, MessageKind};

/// Base fixed-point price used by the built-in scenarios ($150.00)
pub const BASE_PRICE: u32 = 150_000_000;

/// Fixed-point price step between entities in the sweep ($1.00)
const SWEEP_PRICE_STEP: u32 = 1_000_000;

/// Volume carried by the built-in scenario events
const BASE_VOLUME: u32 = 100;

type ScenarioResult = Result<(ScenarioStatus, ScenarioDetail), HarnessError>;

pub struct Harness<D: Device> {
    clock: ClockDriver<D>,
    session: SessionCounters,
    config: HarnessConfig,
    entity_codes: Vec<u32>,
    outcomes: Vec<ScenarioOutcome>,
    poisoned: Option<String>,
}

impl<D: Device> Harness<D> {
    pub fn new(device: D, config: HarnessConfig) -> Result<Self, HarnessError> {
        config.validate()?;
        let clock = ClockDriver::new(device, config.clock.clone())?;
        let entity_codes = config.entities.iter().map(|s| entity_code(s)).collect();

        tracing::info!(
            device = clock.device().name(),
            entities = ?config.entities,
            frequency_mhz = config.clock.frequency_mhz(),
            "Harness created"
        );

        Ok(Self {
            clock,
            session: SessionCounters::new(),
            config,
            entity_codes,
            outcomes: Vec::new(),
            poisoned: None,
        })
    }

    /// Send every subsequent half-period sample to `sink`
    pub fn attach_sink(&mut self, sink: Box<dyn WaveformSink>) {
        self.clock.attach_sink(sink);
    }

    /// Run the device reset protocol. Reset cycles count towards the session total.
    pub fn reset(&mut self) -> Result<(), HarnessError> {
        self.clock.reset()?;
        self.session.observe_cycle(self.clock.cycle());
        Ok(())
    }

    /// Reset if needed, run the standard suite and build the report
    pub fn run_suite(&mut self) -> Result<SessionReport, HarnessError> {
        if !self.clock.is_out_of_reset() {
            self.reset()?;
        }
        for scenario in Scenario::SUITE {
            self.run_scenario(scenario);
        }
        let report = self.report();
        tracing::info!(
            passed = report.passed_count(),
            total = report.outcomes.len(),
            cycles = report.counters.total_cycles,
            "Scenario suite finished"
        );
        Ok(report)
    }

    /// Run one scenario of the standard suite. Failures are captured in the outcome.
    pub fn run_scenario(&mut self, scenario: Scenario) -> ScenarioOutcome {
        match scenario {
            Scenario::Functional => self.run_with(scenario, Self::functional_check),
            Scenario::MultiEntitySweep => self.run_with(scenario, Self::multi_entity_sweep),
            Scenario::ThroughputBurst => self.run_with(scenario, Self::throughput_burst),
            Scenario::LatencySampling => self.run_with(scenario, Self::latency_sampling),
            Scenario::SustainedStress => self.run_with(scenario, Self::sustained_stress),
            Scenario::Replay => self.run_with(scenario, |_| {
                Ok((
                    ScenarioStatus::Skipped("replay needs recorded events".into()),
                    ScenarioDetail::None,
                ))
            }),
        }
    }

    /// Inject a recorded event sequence, awaiting each event with the standard bound
    pub fn replay(&mut self, events: &[MarketEvent]) -> ScenarioOutcome {
        self.run_with(Scenario::Replay, |h| h.replay_events(events))
    }

    fn run_with<F>(&mut self, scenario: Scenario, body: F) -> ScenarioOutcome
    where
        F: FnOnce(&mut Self) -> ScenarioResult,
    {
        let start_cycle = self.clock.cycle();
        let started = Instant::now();

        let (status, detail) = if let Some(reason) = &self.poisoned {
            (ScenarioStatus::Skipped(reason.clone()), ScenarioDetail::None)
        } else {
            tracing::info!(scenario = scenario.name(), "Running scenario");
            let settle = u64::from(self.config.scenario_settle_cycles);
            let result = body(self).and_then(|ran| {
                self.clock.idle(settle)?;
                Ok(ran)
            });
            self.session.observe_cycle(self.clock.cycle());

            match result {
                Ok(ran) => ran,
                Err(e) => {
                    if e.is_fatal() {
                        tracing::error!(
                            scenario = scenario.name(),
                            "Device unusable, skipping remaining scenarios: {}",
                            e
                        );
                        self.poisoned = Some(format!("device halted during {scenario}"));
                    }
                    (ScenarioStatus::Failed(e.to_string()), ScenarioDetail::None)
                }
            }
        };

        let outcome = ScenarioOutcome {
            scenario,
            status,
            cycles: self.clock.cycle() - start_cycle,
            wall_micros: started.elapsed().as_micros() as u64,
            detail,
        };

        match &outcome.status {
            ScenarioStatus::Passed => {
                tracing::info!(scenario = scenario.name(), cycles = outcome.cycles, "Scenario passed")
            }
            status => tracing::warn!(scenario = scenario.name(), "Scenario did not pass: {}", status),
        }

        self.outcomes.push(outcome.clone());
        outcome
    }

    fn event_for(&self, index: u64, price: u32, volume: u32, kind: MessageKind) -> MarketEvent {
        let code = self.entity_codes[(index % self.entity_codes.len() as u64) as usize];
        MarketEvent::new(code, price, volume, kind)
    }

    fn functional_check(&mut self) -> ScenarioResult {
        let event = self.event_for(0, BASE_PRICE, BASE_VOLUME, MessageKind::Add);
        let timeout = self.config.functional_timeout_cycles;

        inject_event(&mut self.clock, &mut self.session, &event)?;
        let response = await_response(&mut self.clock, &mut self.session, timeout)?;

        let status = match &response {
            None => ScenarioStatus::Failed(format!("no execution within {timeout} cycles")),
            Some(exec) => {
                tracing::debug!(
                    symbol = %entity_symbol(exec.entity_code),
                    price = exec.price,
                    volume = exec.volume,
                    latency = exec.latency_cycles,
                    "Functional execution observed"
                );
                if exec.entity_code != event.entity_code {
                    ScenarioStatus::Failed(format!(
                        "entity {:#010x} does not match injected {:#010x}",
                        exec.entity_code, event.entity_code
                    ))
                } else if exec.price != event.price {
                    ScenarioStatus::Failed(format!(
                        "price {} does not match injected {}",
                        exec.price, event.price
                    ))
                } else if exec.latency_cycles == 0 || exec.latency_cycles > u64::from(timeout) {
                    ScenarioStatus::Failed(format!(
                        "latency {} outside 1..={timeout}",
                        exec.latency_cycles
                    ))
                } else {
                    ScenarioStatus::Passed
                }
            }
        };

        Ok((status, ScenarioDetail::Functional { execution: response }))
    }

    fn multi_entity_sweep(&mut self) -> ScenarioResult {
        let settle = self.config.sweep_settle_cycles;
        let mut injected: Vec<(u32, u32)> = Vec::with_capacity(self.entity_codes.len());
        let mut executions = Vec::new();
        let mut late_arrivals = Vec::new();
        let mut interference = Vec::new();

        for (i, &code) in self.entity_codes.clone().iter().enumerate() {
            let price = BASE_PRICE.wrapping_add(SWEEP_PRICE_STEP.wrapping_mul(i as u32));
            let event = MarketEvent::new(code, price, BASE_VOLUME, MessageKind::Add);

            inject_event(&mut self.clock, &mut self.session, &event)?;
            injected.push((code, price));
            for observed in watch(&mut self.clock, &mut self.session, settle)? {
                let key = (observed.entity_code, observed.price);
                if key == (code, price) {
                    executions.push(observed);
                    continue;
                }
                if injected.contains(&key) {
                    tracing::debug!(
                        window = %entity_symbol(code),
                        observed = %entity_symbol(observed.entity_code),
                        "Late sweep execution"
                    );
                    late_arrivals.push(Interference { injected_entity: code, observed });
                } else {
                    tracing::warn!(
                        window = %entity_symbol(code),
                        observed = %entity_symbol(observed.entity_code),
                        price = observed.price,
                        "Execution matches no injected sweep event"
                    );
                    interference.push(Interference { injected_entity: code, observed });
                }
                executions.push(observed);
            }
        }

        let status = if interference.is_empty() {
            ScenarioStatus::Passed
        } else {
            ScenarioStatus::Failed(format!("{} cross-entity executions", interference.len()))
        };
        let detail = ScenarioDetail::Sweep {
            entities: self.entity_codes.len(),
            executions,
            late_arrivals,
            interference,
        };
        Ok((status, detail))
    }

    fn throughput_burst(&mut self) -> ScenarioResult {
        let events = self.config.burst_events;
        let idle_every = self.config.burst_idle_every;
        let start_cycle = self.clock.cycle();
        let started = Instant::now();

        for i in 0..events {
            let price = BASE_PRICE + (i % 1000) as u32;
            let volume = BASE_VOLUME + (i % 100) as u32;
            let event = self.event_for(i, price, volume, MessageKind::Add);
            inject_event(&mut self.clock, &mut self.session, &event)?;

            if idle_every != 0 && i % idle_every == 0 {
                self.clock.advance_cycle()?;
            }
        }
        self.session.observe_cycle(self.clock.cycle());

        let figures = ThroughputFigures::new(
            events,
            self.clock.cycle() - start_cycle,
            started.elapsed().as_micros() as u64,
        );
        tracing::info!(
            events,
            cycles_per_event = figures.cycles_per_event,
            events_per_second = figures.events_per_second,
            "Throughput burst complete"
        );
        Ok((ScenarioStatus::Passed, ScenarioDetail::Throughput(figures)))
    }

    fn latency_sampling(&mut self) -> ScenarioResult {
        let requested = self.config.latency_samples;
        let timeout = self.config.response_timeout_cycles;
        let settle = u64::from(self.config.latency_settle_cycles);
        let mut samples = Vec::with_capacity(requested as usize);

        for i in 0..requested {
            // Measured from before injection, so the injection cycle is included
            let start = self.clock.cycle();
            let event = self.event_for(0, BASE_PRICE.wrapping_add(i), BASE_VOLUME, MessageKind::Add);

            inject_event(&mut self.clock, &mut self.session, &event)?;
            match await_response(&mut self.clock, &mut self.session, timeout)? {
                Some(exec) if exec.entity_code == event.entity_code && exec.price == event.price => {
                    samples.push(self.clock.cycle() - start);
                }
                Some(exec) => tracing::debug!(
                    sample = i,
                    price = exec.price,
                    expected = event.price,
                    "Discarding execution from an earlier sample"
                ),
                None => {}
            }
            self.clock.idle(settle)?;
        }
        self.session.observe_cycle(self.clock.cycle());

        let period = self.config.clock.period_ns;
        let stats = LatencyStats::from_samples(samples);
        let stats_ns = stats.as_ref().map(|s| s.in_nanos(period));

        let status = match &stats {
            None => ScenarioStatus::Failed("insufficient data".into()),
            Some(s) => {
                tracing::info!(
                    samples = s.count,
                    mean = s.mean,
                    p50 = s.p50,
                    p95 = s.p95,
                    p99 = s.p99,
                    "Latency statistics (cycles)"
                );
                ScenarioStatus::Passed
            }
        };
        Ok((status, ScenarioDetail::Latency { requested, stats, stats_ns }))
    }

    fn sustained_stress(&mut self) -> ScenarioResult {
        let events = self.config.stress_events;
        let start_cycle = self.clock.cycle();
        let started = Instant::now();

        for i in 0..events {
            let price = BASE_PRICE + (i % 10_000) as u32;
            let volume = BASE_VOLUME + (i % 1000) as u32;
            let event = self.event_for(i, price, volume, stress_kind(i));
            inject_event(&mut self.clock, &mut self.session, &event)?;
        }
        self.session.observe_cycle(self.clock.cycle());

        let figures = ThroughputFigures::new(
            events,
            self.clock.cycle() - start_cycle,
            started.elapsed().as_micros() as u64,
        );
        tracing::info!(
            events,
            events_per_second = figures.events_per_second,
            "Sustained stress complete"
        );
        Ok((ScenarioStatus::Passed, ScenarioDetail::Stress(figures)))
    }

    fn replay_events(&mut self, events: &[MarketEvent]) -> ScenarioResult {
        if events.is_empty() {
            return Ok((
                ScenarioStatus::Skipped("no recorded events".into()),
                ScenarioDetail::None,
            ));
        }

        let timeout = self.config.response_timeout_cycles;
        let mut latencies = Vec::new();
        let mut timeouts = 0u64;

        for event in events {
            inject_event(&mut self.clock, &mut self.session, event)?;
            match await_response(&mut self.clock, &mut self.session, timeout)? {
                Some(exec) => latencies.push(exec.latency_cycles),
                None => timeouts += 1,
            }
        }

        let executions = latencies.len() as u64;
        let detail = ScenarioDetail::Replay {
            events: events.len(),
            executions,
            timeouts,
            stats: LatencyStats::from_samples(latencies),
        };
        Ok((ScenarioStatus::Passed, detail))
    }

    /// Build the session report from everything run so far
    pub fn report(&self) -> SessionReport {
        SessionReport::build(
            self.clock.device().name(),
            &self.config.clock,
            &self.outcomes,
            &self.session,
        )
    }

    /// Flush the waveform sink and hand the device back
    pub fn into_device(self) -> D {
        self.clock.into_device()
    }

    pub fn session(&self) -> &SessionCounters {
        &self.session
    }

    pub fn clock(&self) -> &ClockDriver<D> {
        &self.clock
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    pub fn outcomes(&self) -> &[ScenarioOutcome] {
        &self.outcomes
    }

    pub fn is_poisoned(&self) -> bool {
        self.poisoned.is_some()
    }
}
