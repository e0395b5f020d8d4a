//! FPS extraction from raw benchmark logs.
//!
//! Each line is matched independently against `<n> candles: <fps> FPS`.
//! A line whose captured number does not parse is skipped rather than
//! aborting the scan. A log without a single reading is an error, never a
//! zero-FPS result.

use crate::result::{BenchmarkResult, FpsSamples};
use once_cell::sync::Lazy;
use perf_gate_core::{GateError, Result};
use regex::Regex;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{debug, info};

static FPS_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\d+ candles: ([0-9.]+) FPS").expect("FPS line pattern is valid")
});

/// Parse the FPS reading out of one log line, if any.
pub fn parse_line(line: &str) -> Option<f64> {
    let captured = FPS_LINE.captures(line)?.get(1)?.as_str();
    match captured.parse::<f64>() {
        Ok(fps) if fps.is_finite() => Some(fps),
        Ok(_) => {
            debug!(value = captured, "Skipping out-of-range FPS reading");
            None
        }
        Err(e) => {
            debug!(value = captured, error = %e, "Skipping malformed FPS reading");
            None
        }
    }
}

/// Collect every FPS reading from a line-oriented reader.
///
/// Lines are decoded lossily so stray non-UTF-8 bytes cannot abort the scan.
pub fn collect_samples<R: BufRead>(mut reader: R) -> std::io::Result<FpsSamples> {
    let mut samples = FpsSamples::new();
    let mut buf = Vec::new();

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        if let Some(fps) = parse_line(&String::from_utf8_lossy(&buf)) {
            samples.push(fps);
        }
    }

    Ok(samples)
}

fn aggregate(samples: FpsSamples) -> Result<BenchmarkResult> {
    let fps = samples.mean().ok_or(GateError::NoMetricData)?;
    info!(samples = samples.len(), fps, "Extracted FPS from benchmark log");
    Ok(BenchmarkResult::new(fps))
}

/// Extract the mean FPS from log text.
pub fn extract_fps(text: &str) -> Result<BenchmarkResult> {
    let mut samples = FpsSamples::new();
    for fps in text.lines().filter_map(parse_line) {
        samples.push(fps);
    }
    aggregate(samples)
}

/// Extract the mean FPS from any buffered reader.
pub fn extract_from_reader<R: BufRead>(reader: R) -> Result<BenchmarkResult> {
    let samples = collect_samples(reader).map_err(|e| GateError::io("<reader>", e))?;
    aggregate(samples)
}

/// Extract the mean FPS from a log file.
pub fn extract_from_file(path: impl AsRef<Path>) -> Result<BenchmarkResult> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => GateError::InputNotFound {
            path: path.to_path_buf(),
        },
        _ => GateError::io(path, e),
    })?;
    let samples = collect_samples(BufReader::new(file)).map_err(|e| GateError::io(path, e))?;
    aggregate(samples)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const LOG: &str = "\
starting renderer
100 candles: 60.0 FPS
warming up caches
1000 candles: 30.5 FPS
unrelated: 99 FPS
10000 candles: 15.5 FPS
";

    #[test]
    fn test_mean_of_matching_lines() {
        let result = extract_fps(LOG).unwrap();
        assert!((result.fps - (60.0 + 30.5 + 15.5) / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_line_order_does_not_change_mean() {
        let reversed: String = LOG.lines().rev().map(|l| format!("{l}\n")).collect();
        let a = extract_fps(LOG).unwrap();
        let b = extract_fps(&reversed).unwrap();
        assert!((a.fps - b.fps).abs() < 1e-12);
    }

    #[test]
    fn test_no_matching_lines_is_no_metric_data() {
        let err = extract_fps("some output without fps\n").unwrap_err();
        assert!(matches!(err, GateError::NoMetricData));
        assert!(matches!(extract_fps(""), Err(GateError::NoMetricData)));
    }

    #[test]
    fn test_pattern_is_case_and_spacing_sensitive() {
        assert_eq!(parse_line("100 Candles: 60.0 FPS"), None);
        assert_eq!(parse_line("100 candles:60.0 FPS"), None);
        assert_eq!(parse_line("100 candles: 60.0 fps"), None);
        assert_eq!(parse_line("[bench] 100 candles: 60.0 FPS (gpu)"), Some(60.0));
    }

    #[test]
    fn test_malformed_number_skips_line_only() {
        let log = "100 candles: 1.2.3 FPS\n100 candles: . FPS\n200 candles: 48.0 FPS\n";
        assert_eq!(extract_fps(log).unwrap().fps, 48.0);
    }

    #[test]
    fn test_overflowing_number_skips_line_only() {
        let huge = "9".repeat(400);
        let log = format!("10 candles: {huge} FPS\n20 candles: 30.0 FPS\n");
        assert_eq!(parse_line(&format!("10 candles: {huge} FPS")), None);
        assert_eq!(extract_fps(&log).unwrap().fps, 30.0);

        let only_huge = format!("10 candles: {huge} FPS\n");
        assert!(matches!(extract_fps(&only_huge), Err(GateError::NoMetricData)));
    }

    #[test]
    fn test_mean_of_near_max_readings_stays_finite() {
        let reading = format!("1{}", "0".repeat(308));
        let log = format!("1 candles: {reading} FPS\n2 candles: {reading} FPS\n");
        let result = extract_fps(&log).unwrap();
        assert!(result.is_valid());
        assert_eq!(result.fps, 1e308);
    }

    #[test]
    fn test_reader_tolerates_invalid_utf8() {
        let mut bytes = b"\xff\xfe garbage\n".to_vec();
        bytes.extend_from_slice(b"500 candles: 42.0 FPS\n50 candles: 58.0 FPS");
        let result = extract_from_reader(Cursor::new(bytes)).unwrap();
        assert_eq!(result.fps, 50.0);
    }

    #[test]
    fn test_missing_log_file_is_input_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = extract_from_file(dir.path().join("perf.log")).unwrap_err();
        assert!(matches!(err, GateError::InputNotFound { .. }));
    }

    #[test]
    fn test_extract_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("perf.log");
        std::fs::write(&path, LOG).unwrap();
        assert_eq!(extract_from_file(&path).unwrap(), extract_fps(LOG).unwrap());
    }
}
