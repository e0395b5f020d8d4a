// Copyright 2025 perf-gate Contributors
// SPDX-License-Identifier: Apache-2.0

//! Error taxonomy for metric extraction and regression gating.
//!
//! Every variant aborts the invoking process. [`GateError::RegressionDetected`]
//! is the one outcome that means "the gate did its job"; all other variants
//! mean the run could not be judged at all.

use std::path::PathBuf;
use thiserror::Error;

/// Exit status for a detected regression.
pub const EXIT_REGRESSION: u8 = 1;

/// Exit status for an aborted run (bad input, missing data, I/O).
pub const EXIT_ABORTED: u8 = 2;

/// Errors raised by the extractor and the comparator.
#[derive(Debug, Error)]
pub enum GateError {
    /// No line of the benchmark log matched the FPS pattern.
    #[error("No FPS data found in log")]
    NoMetricData,

    /// A required upstream artifact does not exist.
    #[error("{} not found, run `perf-gate parse` first", path.display())]
    InputNotFound {
        /// Path that was expected to exist
        path: PathBuf,
    },

    /// The new measurement fell below the tolerated baseline.
    #[error("FPS decreased from {baseline_fps} to {new_fps}")]
    RegressionDetected {
        /// Baseline FPS
        baseline_fps: f64,
        /// Newly measured FPS
        new_fps: f64,
    },

    /// Threshold percentage is negative or not a finite number.
    #[error("Invalid threshold percentage: {0}")]
    InvalidThreshold(f64),

    /// A stored result violates the `fps >= 0` invariant.
    #[error("Invalid benchmark result in {}: fps = {fps}", path.display())]
    InvalidResult {
        /// File the result was read from
        path: PathBuf,
        /// Offending value
        fps: f64,
    },

    /// Baseline of zero under the strict baseline rule.
    #[error("Baseline in {} has zero FPS and lenient zero baseline is disabled", path.display())]
    DegenerateBaseline {
        /// Baseline file
        path: PathBuf,
    },

    /// Filesystem error.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// File being read or written
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Malformed result JSON.
    #[error("Invalid JSON in {}: {source}", path.display())]
    Json {
        /// File being decoded
        path: PathBuf,
        /// Underlying error
        #[source]
        source: serde_json::Error,
    },

    /// Configuration could not be loaded from the environment.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl GateError {
    /// Build an [`GateError::Io`] for `path`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        GateError::Io {
            path: path.into(),
            source,
        }
    }

    /// Process exit status for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            GateError::RegressionDetected { .. } => EXIT_REGRESSION,
            _ => EXIT_ABORTED,
        }
    }

    /// Whether this is a true regression rather than an aborted run.
    pub fn is_regression(&self) -> bool {
        matches!(self, GateError::RegressionDetected { .. })
    }
}

impl From<config::ConfigError> for GateError {
    fn from(err: config::ConfigError) -> Self {
        GateError::Config(err.to_string())
    }
}

/// Result type for gate operations.
pub type Result<T> = std::result::Result<T, GateError>;
