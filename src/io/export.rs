//! CSV exports: per-trial history and the smoothed observation table.
//!
//! Both are meant to be easy to consume in spreadsheets or downstream
//! plotting scripts.

use std::fs::{File, create_dir_all};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Duration;

use crate::data::Observations;
use crate::domain::TrialResult;
use crate::error::AppError;

/// Write the full trial history as `trials_{period}_{stamp}.csv`.
///
/// Failed trials appear with misfit `inf`, keeping the history gap-free.
pub fn write_trials_csv(
    out_dir: &Path,
    period_name: &str,
    stamp: &str,
    trials: &[TrialResult],
) -> Result<PathBuf, AppError> {
    create_dir_all(out_dir).map_err(|e| {
        AppError::new(
            4,
            format!("Failed to create output dir '{}': {e}", out_dir.display()),
        )
    })?;

    let path = out_dir.join(format!("trials_{period_name}_{stamp}.csv"));
    let mut file = File::create(&path).map_err(|e| {
        AppError::new(
            4,
            format!("Failed to create trials CSV '{}': {e}", path.display()),
        )
    })?;

    writeln!(file, "trial,beta,rel_death_prob,misfit")
        .map_err(|e| AppError::new(4, format!("Failed to write trials CSV header: {e}")))?;
    for t in trials {
        writeln!(
            file,
            "{},{:.10},{:.10},{}",
            t.index,
            t.params.beta,
            t.params.rel_death_prob,
            format_misfit(t.misfit),
        )
        .map_err(|e| AppError::new(4, format!("Failed to write trials CSV row: {e}")))?;
    }

    Ok(path)
}

/// Write the smoothed observation table, dropping undefined edge rows.
pub fn write_smoothed_csv(path: &Path, observations: &Observations) -> Result<(), AppError> {
    let mut file = File::create(path).map_err(|e| {
        AppError::new(
            4,
            format!("Failed to create smoothed CSV '{}': {e}", path.display()),
        )
    })?;

    writeln!(file, "date,cases,deaths")
        .map_err(|e| AppError::new(4, format!("Failed to write smoothed CSV header: {e}")))?;
    for i in 0..observations.len() {
        let (Some(cases), Some(deaths)) = (
            observations.smoothed_cases[i],
            observations.smoothed_deaths[i],
        ) else {
            continue;
        };
        let date = observations.start + Duration::days(i as i64);
        writeln!(file, "{date},{cases:.4},{deaths:.4}")
            .map_err(|e| AppError::new(4, format!("Failed to write smoothed CSV row: {e}")))?;
    }

    Ok(())
}

fn format_misfit(v: f64) -> String {
    if v.is_finite() {
        format!("{v:.6}")
    } else {
        "inf".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::smooth::centered_moving_average;
    use crate::domain::ParameterPoint;
    use chrono::NaiveDate;

    fn trial(index: usize, misfit: f64) -> TrialResult {
        TrialResult {
            index,
            params: ParameterPoint {
                beta: 0.006,
                rel_death_prob: 0.55,
            },
            misfit,
            error: if misfit.is_finite() {
                None
            } else {
                Some("boom".to_string())
            },
        }
    }

    #[test]
    fn trials_csv_includes_failed_rows() {
        let dir = std::env::temp_dir().join(format!("epi_calib_trials_{}", std::process::id()));
        let path =
            write_trials_csv(&dir, "ecq", "test", &[trial(0, 1.5), trial(1, f64::INFINITY)])
                .unwrap();

        let body = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_dir_all(&dir).ok();

        let lines: Vec<&str> = body.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "trial,beta,rel_death_prob,misfit");
        assert!(lines[1].starts_with("0,"));
        assert!(lines[2].ends_with(",inf"));
    }

    #[test]
    fn smoothed_csv_drops_undefined_edges() {
        let cases: Vec<f64> = (0..10).map(|i| i as f64).collect();
        let deaths = vec![0.0; 10];
        let start = NaiveDate::from_ymd_opt(2020, 3, 2).unwrap();
        let obs = Observations {
            start,
            end: start + Duration::days(9),
            smoothed_cases: centered_moving_average(&cases, 7),
            smoothed_deaths: centered_moving_average(&deaths, 7),
            cases,
            deaths,
            row_errors: Vec::new(),
            rows_read: 10,
        };

        let path = std::env::temp_dir().join(format!("epi_calib_smoothed_{}.csv", std::process::id()));
        write_smoothed_csv(&path, &obs).unwrap();
        let body = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).ok();

        // Header + 4 defined rows (indices 3..=6 of 10).
        assert_eq!(body.lines().count(), 5);
        assert!(body.lines().nth(1).unwrap().starts_with("2020-03-05,"));
    }
}
