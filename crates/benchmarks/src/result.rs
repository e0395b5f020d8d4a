//! Benchmark result types.
//!
//! This module provides the `BenchmarkResult` persisted between pipeline
//! stages and used as the baseline.

use serde::{Deserialize, Serialize};

/// Aggregate FPS of one benchmark run.
///
/// Serialized as `{"fps": <number>}`. A missing `fps` key decodes as `0.0`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BenchmarkResult {
    /// Mean frames per second over all samples.
    #[serde(default)]
    pub fps: f64,
}

impl BenchmarkResult {
    /// Create a new BenchmarkResult.
    pub fn new(fps: f64) -> Self {
        Self { fps }
    }

    /// Whether the value satisfies `fps >= 0` and is finite.
    pub fn is_valid(&self) -> bool {
        self.fps.is_finite() && self.fps >= 0.0
    }
}

/// FPS readings collected from a log, in scan order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FpsSamples(Vec<f64>);

impl FpsSamples {
    /// Create an empty sample set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one reading.
    pub fn push(&mut self, fps: f64) {
        self.0.push(fps);
    }

    /// Number of readings.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no reading was collected.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Readings in scan order.
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// Arithmetic mean, `None` when empty.
    ///
    /// Computed as a running mean so that finite readings near `f64::MAX`
    /// never overflow into an infinite total.
    pub fn mean(&self) -> Option<f64> {
        if self.0.is_empty() {
            return None;
        }
        let mut mean = 0.0;
        for (i, fps) in self.0.iter().enumerate() {
            mean += (fps - mean) / (i + 1) as f64;
        }
        Some(mean)
    }
}

impl From<Vec<f64>> for FpsSamples {
    fn from(values: Vec<f64>) -> Self {
        Self(values)
    }
}
