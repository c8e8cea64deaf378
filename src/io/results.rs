//! Best-result JSON read/write.
//!
//! The JSON record is the "portable" output of a calibration run: period
//! name, date bounds, best parameter values, and the misfit score. Plotting
//! pipelines read it back via `read_best_json`.

use std::fs::{File, create_dir_all};
use std::path::{Path, PathBuf};

use crate::domain::BestResult;
use crate::error::AppError;

/// Write the best result as `best_params_{period}_{stamp}.json`.
pub fn write_best_json(
    out_dir: &Path,
    stamp: &str,
    best: &BestResult,
) -> Result<PathBuf, AppError> {
    create_dir_all(out_dir).map_err(|e| {
        AppError::new(
            4,
            format!("Failed to create output dir '{}': {e}", out_dir.display()),
        )
    })?;

    let path = out_dir.join(format!("best_params_{}_{stamp}.json", best.period));
    let file = File::create(&path).map_err(|e| {
        AppError::new(
            4,
            format!("Failed to create result JSON '{}': {e}", path.display()),
        )
    })?;

    serde_json::to_writer_pretty(file, best)
        .map_err(|e| AppError::new(4, format!("Failed to write result JSON: {e}")))?;

    Ok(path)
}

/// Read a previously written best-result record.
pub fn read_best_json(path: &Path) -> Result<BestResult, AppError> {
    let file = File::open(path).map_err(|e| {
        AppError::new(
            2,
            format!("Failed to open result JSON '{}': {e}", path.display()),
        )
    })?;
    let best: BestResult = serde_json::from_reader(file)
        .map_err(|e| AppError::new(2, format!("Invalid result JSON: {e}")))?;
    Ok(best)
}
