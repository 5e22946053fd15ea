//! Session-wide counters

use serde::{Deserialize, Serialize};

/// Accumulators for one harness session.
///
/// Created at harness start-up, only ever added to while scenarios run, and read when the
/// report is built. Owned by the harness and passed explicitly to the injector and the
/// collector.
#[derive(Debug, Clone, Default)]
pub struct SessionCounters {
    total_cycles: u64,
    events_injected: u64,
    executions_observed: u64,
    latency_samples: u64,
    latency_sum: u64,
    latency_min: Option<u64>,
    latency_max: Option<u64>,
}

/// Point-in-time copy of the counters for reporting
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CountersSnapshot {
    pub total_cycles: u64,
    pub events_injected: u64,
    pub executions_observed: u64,
    pub latency_samples: u64,
    pub latency_sum: u64,
    pub latency_min: Option<u64>,
    pub latency_max: Option<u64>,
}

impl SessionCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bring the cycle total up to the clock's current count
    pub fn observe_cycle(&mut self, cycle: u64) {
        self.total_cycles = self.total_cycles.max(cycle);
    }

    pub fn record_injection(&mut self) {
        self.events_injected += 1;
    }

    /// An execution seen while the collector was measuring
    pub fn record_execution(&mut self, latency_cycles: u64) {
        self.executions_observed += 1;
        self.latency_samples += 1;
        self.latency_sum += latency_cycles;
        self.latency_min = Some(self.latency_min.map_or(latency_cycles, |m| m.min(latency_cycles)));
        self.latency_max = Some(self.latency_max.map_or(latency_cycles, |m| m.max(latency_cycles)));
    }

    /// An execution seen outside a measured wait
    pub fn record_unmeasured_execution(&mut self) {
        self.executions_observed += 1;
    }

    pub fn total_cycles(&self) -> u64 {
        self.total_cycles
    }

    pub fn events_injected(&self) -> u64 {
        self.events_injected
    }

    pub fn executions_observed(&self) -> u64 {
        self.executions_observed
    }

    /// Mean of the measured latencies, in cycles
    pub fn mean_latency(&self) -> Option<f64> {
        (self.latency_samples > 0).then(|| self.latency_sum as f64 / self.latency_samples as f64)
    }

    /// Executions per injected event, as a percentage
    pub fn execution_rate_pct(&self) -> Option<f64> {
        (self.events_injected > 0)
            .then(|| self.executions_observed as f64 / self.events_injected as f64 * 100.0)
    }

    pub fn snapshot(&self) -> CountersSnapshot {
        CountersSnapshot {
            total_cycles: self.total_cycles,
            events_injected: self.events_injected,
            executions_observed: self.executions_observed,
            latency_samples: self.latency_samples,
            latency_sum: self.latency_sum,
            latency_min: self.latency_min,
            latency_max: self.latency_max,
        }
    }
}
