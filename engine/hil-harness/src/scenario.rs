//! Scenario identities and outcomes

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::stats::{LatencyStats, LatencyStatsNs};
use crate::types::{ExecutionEvent, MessageKind};

/// A named unit of the test session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scenario {
    Functional,
    MultiEntitySweep,
    ThroughputBurst,
    LatencySampling,
    SustainedStress,
    Replay,
}

impl Scenario {
    /// The standard suite, in execution order
    pub const SUITE: [Scenario; 5] = [
        Scenario::Functional,
        Scenario::MultiEntitySweep,
        Scenario::ThroughputBurst,
        Scenario::LatencySampling,
        Scenario::SustainedStress,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Scenario::Functional => "functional",
            Scenario::MultiEntitySweep => "multi_entity_sweep",
            Scenario::ThroughputBurst => "throughput_burst",
            Scenario::LatencySampling => "latency_sampling",
            Scenario::SustainedStress => "sustained_stress",
            Scenario::Replay => "replay",
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Message kind of the `i`-th sustained-stress event: every 15th is a Cancel, every
/// other 10th an Execute, the rest are Adds.
pub fn stress_kind(i: u64) -> MessageKind {
    if i % 15 == 0 {
        MessageKind::Cancel
    } else if i % 10 == 0 {
        MessageKind::Execute
    } else {
        MessageKind::Add
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum ScenarioStatus {
    Passed,
    Failed(String),
    Skipped(String),
}

impl ScenarioStatus {
    pub fn is_passed(&self) -> bool {
        matches!(self, ScenarioStatus::Passed)
    }
}

impl fmt::Display for ScenarioStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScenarioStatus::Passed => f.write_str("PASS"),
            ScenarioStatus::Failed(reason) => write!(f, "FAIL ({reason})"),
            ScenarioStatus::Skipped(reason) => write!(f, "SKIP ({reason})"),
        }
    }
}

/// An execution seen in the sweep window of `injected_entity` that belongs to another event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interference {
    pub injected_entity: u32,
    pub observed: ExecutionEvent,
}

/// Simulator-side throughput of a bulk scenario. Wall-clock figures measure the host
/// simulation, not the device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThroughputFigures {
    pub events: u64,
    pub cycles: u64,
    pub cycles_per_event: f64,
    pub wall_micros: u64,
    pub events_per_second: f64,
}

impl ThroughputFigures {
    pub fn new(events: u64, cycles: u64, wall_micros: u64) -> Self {
        let cycles_per_event = if events == 0 { 0.0 } else { cycles as f64 / events as f64 };
        // Sub-microsecond runs are rounded up so the rate stays finite
        let events_per_second = events as f64 * 1_000_000.0 / wall_micros.max(1) as f64;
        Self { events, cycles, cycles_per_event, wall_micros, events_per_second }
    }
}

/// Scenario-specific measurements
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScenarioDetail {
    None,
    Functional {
        execution: Option<ExecutionEvent>,
    },
    Sweep {
        entities: usize,
        executions: Vec<ExecutionEvent>,
        /// Correct executions for an earlier sweep event that arrived in a later window
        late_arrivals: Vec<Interference>,
        /// Executions matching no injected sweep event
        interference: Vec<Interference>,
    },
    Throughput(ThroughputFigures),
    Latency {
        requested: u32,
        stats: Option<LatencyStats>,
        stats_ns: Option<LatencyStatsNs>,
    },
    Stress(ThroughputFigures),
    Replay {
        events: usize,
        executions: u64,
        timeouts: u64,
        stats: Option<LatencyStats>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioOutcome {
    pub scenario: Scenario,
    #[serde(flatten)]
    pub status: ScenarioStatus,
    /// Device cycles consumed, including the trailing settle period
    pub cycles: u64,
    pub wall_micros: u64,
    pub detail: ScenarioDetail,
}
