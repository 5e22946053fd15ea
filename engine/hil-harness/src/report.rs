//! Session report

use core::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use simulation_clock::ClockConfig;

use crate::scenario::{ScenarioDetail, ScenarioOutcome};
use crate::session::{CountersSnapshot, SessionCounters};
use crate::types::entity_symbol;

/// Roll-up of a harness session. Wall-clock values are informational only.
#[derive(Debug, Clone, Serialize)]
pub struct SessionReport {
    pub generated_at: DateTime<Utc>,
    pub device: String,
    pub clock_period_ns: u64,
    pub outcomes: Vec<ScenarioOutcome>,
    pub counters: CountersSnapshot,
    pub execution_rate_pct: Option<f64>,
    pub mean_latency_cycles: Option<f64>,
    pub mean_latency_ns: Option<f64>,
    pub simulated_time_ns: u64,
    pub effective_frequency_mhz: Option<f64>,
    pub all_passed: bool,
}

impl SessionReport {
    pub fn build(
        device: &str,
        clock: &ClockConfig,
        outcomes: &[ScenarioOutcome],
        session: &SessionCounters,
    ) -> Self {
        let counters = session.snapshot();
        let mean_latency_cycles = session.mean_latency();
        let simulated_time_ns = clock.cycles_to_ns(counters.total_cycles);
        let effective_frequency_mhz = (simulated_time_ns > 0)
            .then(|| counters.total_cycles as f64 / (simulated_time_ns as f64 / 1000.0));

        Self {
            generated_at: Utc::now(),
            device: device.to_string(),
            clock_period_ns: clock.period_ns,
            outcomes: outcomes.to_vec(),
            counters,
            execution_rate_pct: session.execution_rate_pct(),
            mean_latency_cycles,
            mean_latency_ns: mean_latency_cycles.map(|c| c * clock.period_ns as f64),
            simulated_time_ns,
            effective_frequency_mhz,
            all_passed: !outcomes.is_empty() && outcomes.iter().all(|o| o.status.is_passed()),
        }
    }

    pub fn passed_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.status.is_passed()).count()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl fmt::Display for SessionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== {} session report ({}) ===", self.device, self.generated_at.to_rfc3339())?;

        for outcome in &self.outcomes {
            writeln!(
                f,
                "{:<20} {:<6} {:>10} cycles {:>10} us",
                outcome.scenario.name(),
                outcome.status.to_string(),
                outcome.cycles,
                outcome.wall_micros
            )?;
            write_detail(f, &outcome.detail, self.clock_period_ns)?;
        }

        let c = &self.counters;
        writeln!(f, "Total simulation cycles: {}", c.total_cycles)?;
        writeln!(f, "Total events injected:   {}", c.events_injected)?;
        writeln!(f, "Total executions:        {}", c.executions_observed)?;
        if let Some(rate) = self.execution_rate_pct {
            writeln!(f, "Execution rate:          {rate:.2}%")?;
        }
        if let (Some(cycles), Some(ns)) = (self.mean_latency_cycles, self.mean_latency_ns) {
            writeln!(f, "Average latency:         {cycles:.2} cycles ({ns:.1} ns)")?;
        }
        if let (Some(min), Some(max)) = (c.latency_min, c.latency_max) {
            let p = self.clock_period_ns;
            writeln!(f, "Min latency:             {min} cycles ({} ns)", min * p)?;
            writeln!(f, "Max latency:             {max} cycles ({} ns)", max * p)?;
        }
        writeln!(f, "Simulated time:          {:.2} us", self.simulated_time_ns as f64 / 1000.0)?;
        if let Some(mhz) = self.effective_frequency_mhz {
            writeln!(f, "Effective frequency:     {mhz:.1} MHz")?;
        }
        write!(
            f,
            "{} of {} scenarios passed",
            self.passed_count(),
            self.outcomes.len()
        )
    }
}

fn write_detail(f: &mut fmt::Formatter<'_>, detail: &ScenarioDetail, period_ns: u64) -> fmt::Result {
    match detail {
        ScenarioDetail::None => Ok(()),
        ScenarioDetail::Functional { execution: Some(e) } => writeln!(
            f,
            "    execution {} price={} volume={} latency={} cycles",
            entity_symbol(e.entity_code),
            e.price,
            e.volume,
            e.latency_cycles
        ),
        ScenarioDetail::Functional { execution: None } => writeln!(f, "    no execution"),
        ScenarioDetail::Sweep { entities, executions, late_arrivals, interference } => writeln!(
            f,
            "    {entities} entities, {} executions, {} late, {} cross-entity",
            executions.len(),
            late_arrivals.len(),
            interference.len()
        ),
        ScenarioDetail::Throughput(t) | ScenarioDetail::Stress(t) => writeln!(
            f,
            "    {} events, {:.2} cycles/event, {:.0} events/s",
            t.events, t.cycles_per_event, t.events_per_second
        ),
        ScenarioDetail::Latency { requested, stats: Some(s), .. } => writeln!(
            f,
            "    {}/{} samples: mean {:.2} p50 {} p95 {} p99 {} min {} max {} cycles; mean {:.1} ns",
            s.count,
            requested,
            s.mean,
            s.p50,
            s.p95,
            s.p99,
            s.min,
            s.max,
            s.mean * period_ns as f64
        ),
        ScenarioDetail::Latency { requested, stats: None, .. } => {
            writeln!(f, "    0/{requested} samples")
        }
        ScenarioDetail::Replay { events, executions, timeouts, .. } => {
            writeln!(f, "    {events} events, {executions} executions, {timeouts} without response")
        }
    }
}
