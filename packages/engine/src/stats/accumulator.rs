// packages/engine/src/stats/accumulator.rs
//! Streaming duration statistics with rank-interpolated percentiles

use serde::{Deserialize, Serialize};

/// Frozen statistics for one actor or for the whole run, in milliseconds
///
/// A snapshot with `count == 0` has every numeric field at `0.0`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub count: u64,
    pub mean_ms: f64,
    pub p50_ms: f64,
    pub p95_ms: f64,
    pub min_ms: f64,
    pub max_ms: f64,
}

impl StatsSnapshot {
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

/// Collects samples; `finalize` consumes it, so nothing can be added afterwards
#[derive(Debug, Clone, Default)]
pub struct StatsAccumulator {
    samples: Vec<f64>,
    sum: f64,
    min: f64,
    max: f64,
}

impl StatsAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one duration sample in milliseconds
    pub fn push(&mut self, value_ms: f64) {
        if self.samples.is_empty() {
            self.min = value_ms;
            self.max = value_ms;
        } else {
            self.min = self.min.min(value_ms);
            self.max = self.max.max(value_ms);
        }
        self.sum += value_ms;
        self.samples.push(value_ms);
    }

    pub fn count(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Sort once and compute the snapshot; the raw samples are discarded
    pub fn finalize(self) -> StatsSnapshot {
        let Self {
            mut samples,
            sum,
            min,
            max,
        } = self;

        if samples.is_empty() {
            return StatsSnapshot::default();
        }

        samples.sort_by(|a, b| a.total_cmp(b));
        let count = samples.len();

        StatsSnapshot {
            count: count as u64,
            mean_ms: sum / count as f64,
            p50_ms: percentile(&samples, 50.0),
            p95_ms: percentile(&samples, 95.0),
            min_ms: min,
            max_ms: max,
        }
    }
}

impl Extend<f64> for StatsAccumulator {
    fn extend<I: IntoIterator<Item = f64>>(&mut self, iter: I) {
        for value in iter {
            self.push(value);
        }
    }
}

/// Percentile `p` (0-100) of ascending `sorted` samples
///
/// Position is `p/100 * (n-1)`; fractional positions interpolate linearly
/// between the neighbouring ranks. Empty input yields `0.0`.
pub fn percentile(sorted: &[f64], p: f64) -> f64 {
    let n = sorted.len();
    if n == 0 {
        return 0.0;
    }
    if p <= 0.0 {
        return sorted[0];
    }
    if p >= 100.0 {
        return sorted[n - 1];
    }

    let pos = (p / 100.0) * (n - 1) as f64;
    let lower = pos.floor() as usize;
    let frac = pos - lower as f64;

    if frac == 0.0 || lower + 1 >= n {
        return sorted[lower];
    }

    sorted[lower] * (1.0 - frac) + sorted[lower + 1] * frac
}
