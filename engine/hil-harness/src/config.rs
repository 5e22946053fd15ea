//! Configuration for the harness

use std::path::Path;

use serde::{Deserialize, Serialize};
use simulation_clock::ClockConfig;

use crate::error::HarnessError;
use crate::DEFAULT_ENTITIES;

/// Scenario sizing and timing. Defaults reproduce the reference testbench.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Symbols exercised by the sweep and rotated through by the bulk scenarios
    pub entities: Vec<String>,

    /// Wait bound for the functional check
    pub functional_timeout_cycles: u32,

    /// Wait bound for every other request/response pair
    pub response_timeout_cycles: u32,

    /// Idle cycles after each injection in the multi-entity sweep
    pub sweep_settle_cycles: u32,

    /// Idle cycles inserted after every scenario
    pub scenario_settle_cycles: u32,

    /// Events injected by the throughput burst
    pub burst_events: u64,

    /// Every n-th burst injection is followed by one extra idle cycle; 0 disables the
    /// extra cycles entirely
    pub burst_idle_every: u64,

    /// Request/response pairs measured by latency sampling
    pub latency_samples: u32,

    /// Idle cycles between latency samples
    pub latency_settle_cycles: u32,

    /// Events injected by the sustained stress run
    pub stress_events: u64,

    pub clock: ClockConfig,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            entities: DEFAULT_ENTITIES.iter().map(|s| s.to_string()).collect(),
            functional_timeout_cycles: 100,
            response_timeout_cycles: 100,
            sweep_settle_cycles: 5,
            scenario_settle_cycles: 10,
            burst_events: 10_000,
            burst_idle_every: 100,
            latency_samples: 1000,
            latency_settle_cycles: 5,
            stress_events: 50_000,
            clock: ClockConfig::default(),
        }
    }
}

impl HarnessConfig {
    /// Load from an optional TOML file, then apply `HIL__`-prefixed environment overrides
    /// (e.g. `HIL__BURST_EVENTS=500`, `HIL__CLOCK__PERIOD_NS=8`).
    pub fn load(path: Option<&Path>) -> Result<Self, HarnessError> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            tracing::debug!("Loading harness configuration from {:?}", path);
            builder = builder.add_source(config::File::from(path));
        }
        let settings = builder
            .add_source(config::Environment::with_prefix("HIL").separator("__").try_parsing(true))
            .build()?;

        let config: HarnessConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), HarnessError> {
        if self.entities.is_empty() {
            return Err(HarnessError::Config("at least one entity is required".into()));
        }
        if let Some(bad) = self.entities.iter().find(|s| s.is_empty() || !s.is_ascii()) {
            return Err(HarnessError::Config(format!("invalid entity symbol {bad:?}")));
        }
        if self.functional_timeout_cycles == 0 || self.response_timeout_cycles == 0 {
            return Err(HarnessError::Config("response timeouts must be non-zero".into()));
        }
        if self.burst_events == 0 || self.stress_events == 0 || self.latency_samples == 0 {
            return Err(HarnessError::Config("scenario event counts must be non-zero".into()));
        }
        self.clock.validate()?;
        Ok(())
    }
}
