//! Sequential trial loop.
//!
//! One run: sample a candidate, hand it to the simulator, score the aligned
//! output against the period's smoothed observations, append the trial.
//! Trials are strictly sequential by contract: the simulator is assumed
//! non-reentrant and the sampler's proposal depends on completed-trial
//! history.
//!
//! Failure semantics:
//! - a simulator error (or degenerate, non-finite output) marks that trial
//!   failed with an infinite score and the loop continues
//! - the run as a whole fails only when every trial failed

use crate::calib::misfit::misfit;
use crate::calib::sampler::Sampler;
use crate::data::Observations;
use crate::domain::{BestResult, CalibConfig, Period, TrialResult};
use crate::error::AppError;
use crate::sim::{SimParams, Simulator};

/// All trials of one calibration run plus the selected best.
#[derive(Debug, Clone)]
pub struct CalibrationRun {
    pub period: Period,
    pub trials: Vec<TrialResult>,
    pub best: BestResult,
    /// Index of the best trial in `trials`.
    pub best_index: usize,
}

/// Run up to `config.n_trials` sequential trials and select the best.
///
/// The observation series are loaded once by the caller and passed in
/// immutable; the driver owns the append-only trial collection for the
/// duration of the run.
pub fn run_calibration<S, P>(
    config: &CalibConfig,
    period: Period,
    observations: &Observations,
    simulator: &S,
    sampler: &mut P,
) -> Result<CalibrationRun, AppError>
where
    S: Simulator,
    P: Sampler,
{
    config.validate()?;

    let window = observations.window(period.start, period.end);
    if window.is_empty() {
        return Err(AppError::new(
            2,
            format!(
                "Period '{}' ({} to {}) does not overlap the observation range ({} to {}).",
                period.name, period.start, period.end, observations.start, observations.end
            ),
        ));
    }

    // Actual comparison window: period clipped to observation coverage.
    let win_start = period.start.max(observations.start);
    let win_end = period.end.min(observations.end);
    let obs_cases = &observations.smoothed_cases[window.clone()];
    let obs_deaths = &observations.smoothed_deaths[window.clone()];

    let mut trials: Vec<TrialResult> = Vec::with_capacity(config.n_trials);

    for index in 0..config.n_trials {
        let params = sampler.suggest(&config.space, &trials);
        let sim_params = SimParams {
            pop_size: config.pop_size,
            pop_infected: config.pop_infected,
            pop_scale: config.pop_scale,
            start_day: period.start,
            end_day: period.end,
            beta: params.beta,
            rel_death_prob: params.rel_death_prob,
        };

        let trial = match simulator.run(&sim_params) {
            Ok(output) => {
                let (sim_cases, sim_deaths) = output.align(win_start, win_end);
                score_trial(index, params, obs_cases, obs_deaths, &sim_cases, &sim_deaths)?
            }
            Err(e) => TrialResult {
                index,
                params,
                misfit: f64::INFINITY,
                error: Some(e.to_string()),
            },
        };
        trials.push(trial);
    }

    let best_index = select_best(&trials).ok_or_else(|| {
        AppError::new(
            3,
            format!(
                "All {} trials failed for period '{}'; nothing to persist.",
                trials.len(),
                period.name
            ),
        )
    })?;

    let best_trial = &trials[best_index];
    let best = BestResult {
        period: period.name.to_string(),
        start_date: period.start,
        end_date: period.end,
        beta: best_trial.params.beta,
        rel_death_prob: best_trial.params.rel_death_prob,
        misfit: best_trial.misfit,
    };

    Ok(CalibrationRun {
        period,
        trials,
        best,
        best_index,
    })
}

fn score_trial(
    index: usize,
    params: crate::domain::ParameterPoint,
    obs_cases: &[Option<f64>],
    obs_deaths: &[Option<f64>],
    sim_cases: &[f64],
    sim_deaths: &[f64],
) -> Result<TrialResult, AppError> {
    // Degenerate simulator output is a trial-level failure, not a run abort.
    let degenerate = sim_cases.iter().chain(sim_deaths).any(|v| !v.is_finite());
    if degenerate {
        return Ok(TrialResult {
            index,
            params,
            misfit: f64::INFINITY,
            error: Some("Simulator returned non-finite output.".to_string()),
        });
    }

    let misfit = misfit(obs_cases, obs_deaths, sim_cases, sim_deaths)?;
    Ok(TrialResult {
        index,
        params,
        misfit,
        error: None,
    })
}

/// Minimum finite score; ties broken by earliest trial index.
fn select_best(trials: &[TrialResult]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (i, t) in trials.iter().enumerate() {
        if t.failed() {
            continue;
        }
        match best {
            None => best = Some(i),
            Some(b) if t.misfit < trials[b].misfit => best = Some(i),
            Some(_) => {}
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calib::sampler::TpeSampler;
    use crate::data::smooth::centered_moving_average;
    use crate::domain::{ParamSpace, ParameterPoint};
    use crate::sim::{SimError, SimOutput};
    use chrono::NaiveDate;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn observations(n: usize) -> Observations {
        let cases: Vec<f64> = (0..n).map(|i| 10.0 + (i % 4) as f64).collect();
        let deaths: Vec<f64> = (0..n).map(|i| 1.0 + (i % 2) as f64).collect();
        let start = d(2020, 3, 2);
        Observations {
            start,
            end: start + chrono::Duration::days(n as i64 - 1),
            smoothed_cases: centered_moving_average(&cases, 7),
            smoothed_deaths: centered_moving_average(&deaths, 7),
            cases,
            deaths,
            row_errors: Vec::new(),
            rows_read: n,
        }
    }

    fn config(n_trials: usize, seed: u64) -> CalibConfig {
        CalibConfig {
            data_path: "unused.csv".into(),
            period: "ecq".to_string(),
            n_trials,
            seed,
            n_startup_trials: 5,
            n_ei_candidates: 12,
            space: ParamSpace::baguio_default(),
            output_dir: "unused".into(),
            pop_size: 10_000.0,
            pop_infected: 1.0,
            pop_scale: 1.0,
        }
    }

    fn period(days: i64) -> Period {
        Period {
            name: "ecq",
            start: d(2020, 3, 2),
            end: d(2020, 3, 2) + chrono::Duration::days(days - 1),
        }
    }

    /// Deterministic mock: misfit landscape is a smooth function of beta.
    struct MockSim;

    impl Simulator for MockSim {
        fn run(&self, params: &SimParams) -> Result<SimOutput, SimError> {
            let n = (params.end_day - params.start_day).num_days() as usize + 1;
            let level = params.beta * 2_000.0;
            Ok(SimOutput {
                start: params.start_day,
                new_infections: vec![level; n],
                new_deaths: vec![params.rel_death_prob * 2.0; n],
            })
        }
    }

    struct FailingSim;

    impl Simulator for FailingSim {
        fn run(&self, _params: &SimParams) -> Result<SimOutput, SimError> {
            Err(SimError("always down".to_string()))
        }
    }

    /// Fails on even trials, succeeds on odd ones.
    struct FlakySim {
        calls: std::cell::Cell<usize>,
    }

    impl Simulator for FlakySim {
        fn run(&self, params: &SimParams) -> Result<SimOutput, SimError> {
            let call = self.calls.get();
            self.calls.set(call + 1);
            if call % 2 == 0 {
                return Err(SimError("flaky".to_string()));
            }
            MockSim.run(params)
        }
    }

    #[test]
    fn fixed_seed_reproduces_best_result() {
        let obs = observations(30);
        let cfg = config(20, 123);
        let p = period(30);

        let run_a = run_calibration(
            &cfg,
            p,
            &obs,
            &MockSim,
            &mut TpeSampler::new(cfg.seed, cfg.n_startup_trials, cfg.n_ei_candidates),
        )
        .unwrap();
        let run_b = run_calibration(
            &cfg,
            p,
            &obs,
            &MockSim,
            &mut TpeSampler::new(cfg.seed, cfg.n_startup_trials, cfg.n_ei_candidates),
        )
        .unwrap();

        assert_eq!(run_a.best, run_b.best);
        assert_eq!(run_a.trials.len(), 20);
    }

    #[test]
    fn budget_of_one_returns_that_trial() {
        let obs = observations(30);
        let cfg = config(1, 5);
        let run = run_calibration(
            &cfg,
            period(30),
            &obs,
            &MockSim,
            &mut TpeSampler::new(5, 5, 12),
        )
        .unwrap();

        assert_eq!(run.trials.len(), 1);
        assert_eq!(run.best_index, 0);
        assert_eq!(run.best.beta, run.trials[0].params.beta);
    }

    #[test]
    fn failed_trials_do_not_abort_the_run() {
        let obs = observations(30);
        let cfg = config(10, 9);
        let sim = FlakySim {
            calls: std::cell::Cell::new(0),
        };
        let run = run_calibration(
            &cfg,
            period(30),
            &obs,
            &sim,
            &mut TpeSampler::new(9, 5, 12),
        )
        .unwrap();

        assert_eq!(run.trials.len(), 10);
        assert_eq!(run.trials.iter().filter(|t| t.failed()).count(), 5);
        assert!(run.best.misfit.is_finite());
    }

    #[test]
    fn all_failed_trials_fail_the_run() {
        let obs = observations(30);
        let cfg = config(4, 1);
        let err = run_calibration(
            &cfg,
            period(30),
            &obs,
            &FailingSim,
            &mut TpeSampler::new(1, 5, 12),
        )
        .unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn disjoint_period_is_a_config_error() {
        let obs = observations(30);
        let cfg = config(4, 1);
        let p = Period {
            name: "al1",
            start: d(2022, 3, 2),
            end: d(2022, 3, 15),
        };
        let err = run_calibration(&cfg, p, &obs, &MockSim, &mut TpeSampler::new(1, 5, 12))
            .unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn ties_prefer_the_earliest_trial() {
        let make = |index, misfit| TrialResult {
            index,
            params: ParameterPoint {
                beta: 0.006,
                rel_death_prob: 0.55,
            },
            misfit,
            error: None,
        };
        let trials = vec![make(0, 3.0), make(1, 1.0), make(2, 1.0)];
        assert_eq!(select_best(&trials), Some(1));
    }
}
