//! I/O operations for benchmark results.
//!
//! This module reads and writes `BenchmarkResult` JSON files and enforces
//! the `fps >= 0` invariant on everything it reads back.

use crate::result::BenchmarkResult;
use perf_gate_core::{GateError, Result};
use std::fs;
use std::io;
use std::path::Path;
use tracing::debug;

/// Ensure the parent directory of `path` exists.
fn ensure_parent_dir(path: &Path) -> Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            fs::create_dir_all(parent).map_err(|e| GateError::io(parent, e))
        }
        _ => Ok(()),
    }
}

/// Write a benchmark result to a JSON file.
pub fn write_result(result: &BenchmarkResult, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    ensure_parent_dir(path)?;
    let json = serde_json::to_string_pretty(result).map_err(|source| GateError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    fs::write(path, json).map_err(|e| GateError::io(path, e))?;
    debug!(path = %path.display(), fps = result.fps, "Wrote benchmark result");
    Ok(())
}

/// Read a benchmark result that must exist.
///
/// A missing file is reported as [`GateError::InputNotFound`].
pub fn read_result(path: impl AsRef<Path>) -> Result<BenchmarkResult> {
    let path = path.as_ref();
    read_optional_result(path)?.ok_or_else(|| GateError::InputNotFound {
        path: path.to_path_buf(),
    })
}

/// Read a benchmark result that may be absent.
pub fn read_optional_result(path: impl AsRef<Path>) -> Result<Option<BenchmarkResult>> {
    let path = path.as_ref();
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(GateError::io(path, e)),
    };

    let result: BenchmarkResult =
        serde_json::from_str(&content).map_err(|source| GateError::Json {
            path: path.to_path_buf(),
            source,
        })?;

    if !result.is_valid() {
        return Err(GateError::InvalidResult {
            path: path.to_path_buf(),
            fps: result.fps,
        });
    }

    Ok(Some(result))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_written_result_reads_back_unchanged() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("result.json");
        let result = BenchmarkResult::new(59.873_214_5);

        write_result(&result, &path).unwrap();
        assert_eq!(read_result(&path).unwrap(), result);
    }

    #[test]
    fn test_write_creates_parent_directories() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/out/result.json");

        write_result(&BenchmarkResult::new(1.0), &path).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_missing_required_result_is_input_not_found() {
        let dir = tempdir().unwrap();
        let err = read_result(dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, GateError::InputNotFound { .. }));
    }

    #[test]
    fn test_missing_optional_result_is_none() {
        let dir = tempdir().unwrap();
        assert!(read_optional_result(dir.path().join("absent.json"))
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_negative_fps_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, r#"{"fps": -3.0}"#).unwrap();

        let err = read_result(&path).unwrap_err();
        assert!(matches!(err, GateError::InvalidResult { fps, .. } if fps == -3.0));
    }

    #[test]
    fn test_malformed_json_is_reported() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, "not json").unwrap();

        assert!(matches!(read_result(&path), Err(GateError::Json { .. })));
    }
}
