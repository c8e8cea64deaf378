//! Shared calibration pipeline.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! load + smooth observations -> trial loop -> best selection -> persistence
//!
//! The CLI can then focus on presentation (printing summaries).

use std::path::PathBuf;

use crate::calib::{CalibrationRun, TpeSampler, run_calibration};
use crate::data::{Observations, load_observations};
use crate::domain::{CalibConfig, Period, lookup_period};
use crate::error::AppError;
use crate::io::{run_stamp, write_best_json, write_trials_csv};
use crate::sim::{SeirSimulator, Simulator};

/// All computed outputs of a single `calib calibrate` run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub observations: Observations,
    pub period: Period,
    pub run: CalibrationRun,
    pub best_path: PathBuf,
    pub trials_path: PathBuf,
}

/// Execute the full pipeline with the built-in reference simulator.
pub fn run_calibration_pipeline(config: &CalibConfig) -> Result<RunOutput, AppError> {
    run_calibration_pipeline_with(config, &SeirSimulator)
}

/// Execute the pipeline with a caller-supplied simulator.
///
/// This is the seam where the external agent-based simulator plugs in.
pub fn run_calibration_pipeline_with<S: Simulator>(
    config: &CalibConfig,
    simulator: &S,
) -> Result<RunOutput, AppError> {
    config.validate()?;
    let period = lookup_period(&config.period)?;

    // Loaded once per run, immutable afterwards.
    let observations = load_observations(&config.data_path)?;

    let mut sampler = TpeSampler::new(config.seed, config.n_startup_trials, config.n_ei_candidates);
    let run = run_calibration(config, period, &observations, simulator, &mut sampler)?;

    // Uniquely named artifacts: nothing from a previous run is overwritten.
    let stamp = run_stamp();
    let best_path = write_best_json(&config.output_dir, &stamp, &run.best)?;
    let trials_path = write_trials_csv(&config.output_dir, period.name, &stamp, &run.trials)?;

    Ok(RunOutput {
        observations,
        period,
        run,
        best_path,
        trials_path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ParamSpace;
    use std::io::Write;

    fn write_obs_csv(dir: &std::path::Path) -> PathBuf {
        let path = dir.join("obs.csv");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "date,cases,deaths").unwrap();
        // 60 days of observations starting at the ecq period start.
        let start = chrono::NaiveDate::from_ymd_opt(2020, 3, 2).unwrap();
        for i in 0..60 {
            let date = start + chrono::Duration::days(i);
            writeln!(f, "{date},{},{}", 5 + (i % 7), i % 3).unwrap();
        }
        path
    }

    #[test]
    fn pipeline_runs_end_to_end_and_persists_artifacts() {
        let dir = std::env::temp_dir().join(format!("epi_calib_pipeline_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let data_path = write_obs_csv(&dir);

        let config = CalibConfig {
            data_path,
            period: "ecq".to_string(),
            n_trials: 8,
            seed: 42,
            n_startup_trials: 5,
            n_ei_candidates: 12,
            space: ParamSpace::baguio_default(),
            output_dir: dir.join("out"),
            pop_size: 10_000.0,
            pop_infected: 1.0,
            pop_scale: 37.0,
        };

        let output = run_calibration_pipeline(&config).unwrap();
        assert_eq!(output.run.trials.len(), 8);
        assert!(output.best_path.exists());
        assert!(output.trials_path.exists());

        let reloaded = crate::io::read_best_json(&output.best_path).unwrap();
        assert_eq!(reloaded, output.run.best);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn unknown_period_aborts_before_loading_data() {
        let config = CalibConfig {
            data_path: "does_not_exist.csv".into(),
            period: "bogus".to_string(),
            n_trials: 1,
            seed: 0,
            n_startup_trials: 5,
            n_ei_candidates: 12,
            space: ParamSpace::baguio_default(),
            output_dir: "unused".into(),
            pop_size: 10_000.0,
            pop_infected: 1.0,
            pop_scale: 1.0,
        };
        let err = run_calibration_pipeline(&config).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}
