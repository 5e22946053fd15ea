//! # Hardware-in-the-loop harness
//!
//! Exercises the trading pipeline device through its ports only: the stimulus injector
//! pulses one market event per cycle, the response collector polls for executions with a
//! bounded wait, and the orchestrator sequences the scenario suite and rolls the results
//! into a [`SessionReport`].
//!
//! Session counters are an owned value carried by the [`Harness`]; two harnesses never
//! share counters.

pub mod collector;
pub mod config;
pub mod error;
pub mod export;
pub mod generator;
pub mod orchestrator;
pub mod report;
pub mod scenario;
pub mod session;
pub mod stats;
pub mod stimulus;
pub mod types;


pub use collector::{await_response, watch};
pub use config::HarnessConfig;
pub use error::HarnessError;
pub use export::{read_events, write_events};
pub use generator::{EntityProfile, MarketDataGenerator};
pub use orchestrator::Harness;
pub use report::SessionReport;
pub use scenario::{Scenario, ScenarioDetail, ScenarioOutcome, ScenarioStatus, ThroughputFigures};
pub use session::{CountersSnapshot, SessionCounters};
pub use stats::{LatencyStats, LatencyStatsNs};
pub use stimulus::inject_event;
pub use types::{entity_code, entity_symbol, ExecutionEvent, MarketEvent, MessageKind, PRICE_SCALE};

/// Symbols exercised when no configuration overrides them
pub const DEFAULT_ENTITIES: [&str; 5] = ["AAPL", "GOOGL", "MSFT", "TSLA", "NVDA"];
