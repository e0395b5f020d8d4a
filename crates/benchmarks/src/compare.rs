//! Baseline regression comparison.
//!
//! A run fails iff `baseline > 0 && new < baseline * (1 - T/100)`. A missing
//! baseline is seeded from the new result and the run passes. A baseline of
//! exactly zero is governed by the named [`BaselineRule`].

use crate::io;
use crate::result::BenchmarkResult;
use perf_gate_core::{GateError, Result};
use std::fmt;
use std::path::Path;
use tracing::{info, warn};

/// Tolerated drop below the baseline, in percent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Threshold(f64);

impl Threshold {
    /// Validate a percentage: finite and `>= 0`.
    pub fn new(pct: f64) -> Result<Self> {
        if pct.is_finite() && pct >= 0.0 {
            Ok(Self(pct))
        } else {
            Err(GateError::InvalidThreshold(pct))
        }
    }

    /// Percentage value.
    pub fn pct(&self) -> f64 {
        self.0
    }

    /// Lowest FPS that still passes against `baseline_fps`.
    pub fn floor(&self, baseline_fps: f64) -> f64 {
        baseline_fps * (1.0 - self.0 / 100.0)
    }
}

impl fmt::Display for Threshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

/// How a baseline of zero FPS is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BaselineRule {
    /// Zero means "no meaningful baseline yet": the run passes.
    #[default]
    BaselineBootstrapping,
    /// Zero is degenerate data: the run is aborted.
    Strict,
}

impl BaselineRule {
    /// Rule selected by the `lenient_zero_baseline` setting.
    pub fn from_lenient(lenient: bool) -> Self {
        if lenient {
            Self::BaselineBootstrapping
        } else {
            Self::Strict
        }
    }
}

/// Which path decided a comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionPath {
    /// Ordinary threshold comparison.
    Compared,
    /// No baseline existed; the new result became the baseline.
    Bootstrapped,
    /// Baseline was zero and passed under [`BaselineRule::BaselineBootstrapping`].
    ZeroBaseline,
}

/// Result of comparing a new measurement to the baseline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComparisonOutcome {
    /// Newly measured FPS
    pub new_fps: f64,
    /// Baseline FPS (equal to `new_fps` when bootstrapping)
    pub baseline_fps: f64,
    /// Tolerance in percent
    pub threshold_pct: f64,
    /// Whether the gate passes
    pub passed: bool,
    /// Path that produced the decision
    pub decision: DecisionPath,
}

impl ComparisonOutcome {
    /// One-line human-readable summary.
    ///
    /// On failure this is the alert text handed to the dispatcher.
    pub fn summary(&self) -> String {
        if self.passed {
            format!("FPS {}, baseline {}", self.new_fps, self.baseline_fps)
        } else {
            format!(
                "FPS decreased from {} to {}",
                self.baseline_fps, self.new_fps
            )
        }
    }

    /// Turn a failed outcome into [`GateError::RegressionDetected`].
    pub fn into_result(self) -> Result<Self> {
        if self.passed {
            Ok(self)
        } else {
            Err(GateError::RegressionDetected {
                baseline_fps: self.baseline_fps,
                new_fps: self.new_fps,
            })
        }
    }
}

/// Decide pass/fail without touching the filesystem.
///
/// `baseline == None` is the bootstrap case. Under [`BaselineRule::Strict`] a
/// zero baseline yields [`GateError::DegenerateBaseline`] with an empty path;
/// [`RegressionGate`] fills in the file name.
pub fn compare(
    new: &BenchmarkResult,
    baseline: Option<&BenchmarkResult>,
    threshold: Threshold,
    rule: BaselineRule,
) -> Result<ComparisonOutcome> {
    let new_fps = new.fps;
    let (baseline_fps, decision) = match baseline {
        None => (new_fps, DecisionPath::Bootstrapped),
        Some(b) if b.fps > 0.0 => (b.fps, DecisionPath::Compared),
        Some(b) => match rule {
            BaselineRule::BaselineBootstrapping => (b.fps, DecisionPath::ZeroBaseline),
            BaselineRule::Strict => {
                return Err(GateError::DegenerateBaseline {
                    path: Default::default(),
                })
            }
        },
    };

    let regressed = baseline_fps > 0.0 && new_fps < threshold.floor(baseline_fps);

    Ok(ComparisonOutcome {
        new_fps,
        baseline_fps,
        threshold_pct: threshold.pct(),
        passed: !regressed,
        decision,
    })
}

/// File-backed regression gate.
///
/// # Example
///
/// ```no_run
/// use perf_gate_benchmarks::compare::{RegressionGate, Threshold};
///
/// let gate = RegressionGate::new(Threshold::new(5.0)?);
/// let outcome = gate.run("benchmark_result.json", "baseline.json", "latest.json")?;
/// println!("{}", outcome.summary());
/// # Ok::<(), perf_gate_core::GateError>(())
/// ```
#[derive(Debug, Clone, Copy)]
pub struct RegressionGate {
    threshold: Threshold,
    rule: BaselineRule,
}

impl RegressionGate {
    /// Create a gate with the default zero-baseline rule.
    pub fn new(threshold: Threshold) -> Self {
        Self {
            threshold,
            rule: BaselineRule::default(),
        }
    }

    /// Override the zero-baseline rule.
    pub fn with_rule(mut self, rule: BaselineRule) -> Self {
        self.rule = rule;
        self
    }

    /// Configured threshold.
    pub fn threshold(&self) -> Threshold {
        self.threshold
    }

    /// Configured zero-baseline rule.
    pub fn rule(&self) -> BaselineRule {
        self.rule
    }

    /// Compare `new_path` against `baseline_path` and record the new result.
    ///
    /// Side effects, in order: the new result is written to `output_path`,
    /// then the baseline is created from it if absent. The output is written
    /// before the baseline is read and survives a baseline abort. Nothing is
    /// written when the new result is missing or unreadable.
    pub fn run(
        &self,
        new_path: impl AsRef<Path>,
        baseline_path: impl AsRef<Path>,
        output_path: impl AsRef<Path>,
    ) -> Result<ComparisonOutcome> {
        let baseline_path = baseline_path.as_ref();
        let new = io::read_result(new_path)?;

        if new.fps == 0.0 {
            warn!("FPS is zero, logs might be incorrect");
        }

        io::write_result(&new, output_path)?;

        let baseline = io::read_optional_result(baseline_path)?;
        let outcome = compare(&new, baseline.as_ref(), self.threshold, self.rule).map_err(
            |err| match err {
                GateError::DegenerateBaseline { .. } => GateError::DegenerateBaseline {
                    path: baseline_path.to_path_buf(),
                },
                other => other,
            },
        )?;

        if baseline.is_none() {
            io::write_result(&new, baseline_path)?;
            info!(
                baseline = %baseline_path.display(),
                fps = new.fps,
                "No baseline found, seeded from current result"
            );
        }

        match outcome.decision {
            DecisionPath::ZeroBaseline => {
                warn!(baseline = %baseline_path.display(), "Baseline FPS is zero, skipping regression check")
            }
            _ if !outcome.passed => warn!(
                baseline_fps = outcome.baseline_fps,
                new_fps = outcome.new_fps,
                threshold = %self.threshold,
                "Performance regression detected"
            ),
            _ => info!(
                baseline_fps = outcome.baseline_fps,
                new_fps = outcome.new_fps,
                threshold = %self.threshold,
                "FPS within tolerance"
            ),
        }

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn t(pct: f64) -> Threshold {
        Threshold::new(pct).unwrap()
    }

    fn check(new: f64, baseline: Option<f64>) -> ComparisonOutcome {
        let baseline = baseline.map(BenchmarkResult::new);
        compare(
            &BenchmarkResult::new(new),
            baseline.as_ref(),
            t(5.0),
            BaselineRule::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_drop_beyond_threshold_fails() {
        let outcome = check(94.9, Some(100.0));
        assert!(!outcome.passed);
        assert_eq!(outcome.decision, DecisionPath::Compared);
        assert_eq!(outcome.summary(), "FPS decreased from 100 to 94.9");
    }

    #[test]
    fn test_drop_within_threshold_passes() {
        let outcome = check(95.1, Some(100.0));
        assert!(outcome.passed);
        assert_eq!(outcome.summary(), "FPS 95.1, baseline 100");
    }

    #[test]
    fn test_improvement_passes() {
        assert!(check(140.0, Some(100.0)).passed);
    }

    #[test]
    fn test_zero_threshold_fails_on_any_drop() {
        let outcome = compare(
            &BenchmarkResult::new(99.99),
            Some(&BenchmarkResult::new(100.0)),
            t(0.0),
            BaselineRule::default(),
        )
        .unwrap();
        assert!(!outcome.passed);
    }

    #[test]
    fn test_missing_baseline_bootstraps() {
        let outcome = check(60.0, None);
        assert!(outcome.passed);
        assert_eq!(outcome.baseline_fps, 60.0);
        assert_eq!(outcome.decision, DecisionPath::Bootstrapped);
    }

    #[test]
    fn test_zero_baseline_always_passes_when_lenient() {
        for new in [0.0, 1.0, 1_000.0] {
            let outcome = check(new, Some(0.0));
            assert!(outcome.passed);
            assert_eq!(outcome.decision, DecisionPath::ZeroBaseline);
        }
    }

    #[test]
    fn test_zero_baseline_aborts_when_strict() {
        let err = compare(
            &BenchmarkResult::new(50.0),
            Some(&BenchmarkResult::new(0.0)),
            t(5.0),
            BaselineRule::Strict,
        )
        .unwrap_err();
        assert!(matches!(err, GateError::DegenerateBaseline { .. }));
    }

    #[test]
    fn test_threshold_validation() {
        assert!(Threshold::new(5.0).is_ok());
        assert!(Threshold::new(0.0).is_ok());
        assert!(matches!(
            Threshold::new(-1.0),
            Err(GateError::InvalidThreshold(_))
        ));
        assert!(Threshold::new(f64::NAN).is_err());
        assert!((t(5.0).floor(100.0) - 95.0).abs() < 1e-9);
    }

    #[test]
    fn test_failed_outcome_into_regression_error() {
        let err = check(50.0, Some(100.0)).into_result().unwrap_err();
        assert!(err.is_regression());
        assert!(check(99.0, Some(100.0)).into_result().is_ok());
    }

    #[test]
    fn test_gate_seeds_baseline_and_writes_output() {
        let dir = tempdir().unwrap();
        let new = dir.path().join("benchmark_result.json");
        let baseline = dir.path().join("baseline.json");
        let output = dir.path().join("latest.json");
        io::write_result(&BenchmarkResult::new(60.0), &new).unwrap();

        let outcome = RegressionGate::new(t(5.0))
            .run(&new, &baseline, &output)
            .unwrap();

        assert!(outcome.passed);
        assert_eq!(io::read_result(&baseline).unwrap().fps, 60.0);
        assert_eq!(io::read_result(&output).unwrap().fps, 60.0);
    }

    #[test]
    fn test_gate_does_not_touch_existing_baseline() {
        let dir = tempdir().unwrap();
        let new = dir.path().join("new.json");
        let baseline = dir.path().join("baseline.json");
        let output = dir.path().join("latest.json");
        io::write_result(&BenchmarkResult::new(80.0), &new).unwrap();
        io::write_result(&BenchmarkResult::new(100.0), &baseline).unwrap();

        let outcome = RegressionGate::new(t(5.0))
            .run(&new, &baseline, &output)
            .unwrap();

        assert!(!outcome.passed);
        assert_eq!(io::read_result(&baseline).unwrap().fps, 100.0);
        assert_eq!(io::read_result(&output).unwrap().fps, 80.0);
    }

    #[test]
    fn test_gate_writes_output_when_baseline_is_corrupt() {
        let dir = tempdir().unwrap();
        let new = dir.path().join("new.json");
        let baseline = dir.path().join("baseline.json");
        let output = dir.path().join("latest.json");
        io::write_result(&BenchmarkResult::new(45.0), &new).unwrap();
        std::fs::write(&baseline, "not json").unwrap();

        let err = RegressionGate::new(t(5.0))
            .run(&new, &baseline, &output)
            .unwrap_err();

        assert!(matches!(err, GateError::Json { .. }));
        assert_eq!(io::read_result(&output).unwrap().fps, 45.0);
    }

    #[test]
    fn test_gate_aborts_on_missing_new_result() {
        let dir = tempdir().unwrap();
        let baseline = dir.path().join("baseline.json");
        let output = dir.path().join("latest.json");

        let err = RegressionGate::new(t(5.0))
            .run(dir.path().join("missing.json"), &baseline, &output)
            .unwrap_err();

        assert!(matches!(err, GateError::InputNotFound { .. }));
        assert!(!baseline.exists());
        assert!(!output.exists());
    }

    #[test]
    fn test_gate_output_feeds_next_run() {
        let dir = tempdir().unwrap();
        let new = dir.path().join("new.json");
        let baseline = dir.path().join("baseline.json");
        let output = dir.path().join("latest.json");
        let second_output = dir.path().join("latest2.json");
        io::write_result(&BenchmarkResult::new(72.125), &new).unwrap();

        let gate = RegressionGate::new(t(5.0));
        gate.run(&new, &baseline, &output).unwrap();
        let second = gate.run(&output, &baseline, &second_output).unwrap();

        assert_eq!(second.new_fps, 72.125);
        assert!(second.passed);
    }

    #[test]
    fn test_gate_strict_rule_names_baseline_file() {
        let dir = tempdir().unwrap();
        let new = dir.path().join("new.json");
        let baseline = dir.path().join("baseline.json");
        io::write_result(&BenchmarkResult::new(30.0), &new).unwrap();
        io::write_result(&BenchmarkResult::new(0.0), &baseline).unwrap();

        let output = dir.path().join("out.json");

        let err = RegressionGate::new(t(5.0))
            .with_rule(BaselineRule::Strict)
            .run(&new, &baseline, &output)
            .unwrap_err();

        match err {
            GateError::DegenerateBaseline { path } => assert_eq!(path, baseline),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(io::read_result(&output).unwrap().fps, 30.0);
        assert_eq!(io::read_result(&baseline).unwrap().fps, 0.0);
    }
}
