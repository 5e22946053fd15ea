//! Latency statistics

use serde::{Deserialize, Serialize};

/// Summary of one scenario's latency samples, in cycles.
///
/// Percentiles are nearest-rank on the ascending sort with index `floor(n * p)`, so P50 is
/// the upper median for even `n` rather than an interpolated value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatencyStats {
    pub count: usize,
    pub mean: f64,
    pub p50: u64,
    pub p95: u64,
    pub p99: u64,
    pub min: u64,
    pub max: u64,
}

/// The same summary converted to device nanoseconds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatencyStatsNs {
    pub mean: f64,
    pub p50: u64,
    pub p95: u64,
    pub p99: u64,
    pub min: u64,
    pub max: u64,
}

/// Index of the `percent`-th percentile in an ascending sequence of `n` samples
#[inline]
pub fn percentile_index(n: usize, percent: usize) -> usize {
    n * percent / 100
}

impl LatencyStats {
    /// Sort `samples` and summarise them. Returns `None` when there is nothing to
    /// summarise.
    pub fn from_samples(mut samples: Vec<u64>) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }
        samples.sort_unstable();

        let n = samples.len();
        let sum: u64 = samples.iter().sum();
        let at = |percent| samples[percentile_index(n, percent).min(n - 1)];

        Some(Self {
            count: n,
            mean: sum as f64 / n as f64,
            p50: at(50),
            p95: at(95),
            p99: at(99),
            min: samples[0],
            max: samples[n - 1],
        })
    }

    /// Presentation-only conversion to nanoseconds
    pub fn in_nanos(&self, period_ns: u64) -> LatencyStatsNs {
        LatencyStatsNs {
            mean: self.mean * period_ns as f64,
            p50: self.p50 * period_ns,
            p95: self.p95 * period_ns,
            p99: self.p99 * period_ns,
            min: self.min * period_ns,
            max: self.max * period_ns,
        }
    }
}
