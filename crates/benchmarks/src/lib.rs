//! FPS benchmark extraction and regression gating.
//!
//! This crate turns raw benchmark logs into a `BenchmarkResult` and decides
//! whether that result regressed against a stored baseline.
//!
//! # Quick Start
//!
//! ```no_run
//! use perf_gate_benchmarks::{extract_fps, io, RegressionGate, Threshold};
//!
//! let log = std::fs::read_to_string("perf.log")?;
//! let result = extract_fps(&log)?;
//! io::write_result(&result, "benchmark_result.json")?;
//!
//! let gate = RegressionGate::new(Threshold::new(5.0)?);
//! let outcome = gate.run("benchmark_result.json", "baseline.json", "latest.json")?;
//! println!("{}", outcome.summary());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Modules
//!
//! - [`result`] - `BenchmarkResult` and the transient sample set
//! - [`extract`] - Log scanning and aggregation
//! - [`compare`] - Threshold decision and the file-backed gate
//! - [`io`] - Reading and writing result files

#![warn(missing_docs, rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod compare;
pub mod extract;
pub mod io;
pub mod result;

pub use compare::{
    compare, BaselineRule, ComparisonOutcome, DecisionPath, RegressionGate, Threshold,
};
pub use extract::{extract_fps, extract_from_file, extract_from_reader};
pub use result::{BenchmarkResult, FpsSamples};

use perf_gate_core::Result;
use std::path::Path;

/// Extract the FPS from `log_path` and write it to `output_path`.
///
/// Nothing is written when the log holds no FPS reading.
pub fn parse_log_to_result(
    log_path: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
) -> Result<BenchmarkResult> {
    let result = extract_from_file(log_path)?;
    io::write_result(&result, output_path)?;
    Ok(result)
}
