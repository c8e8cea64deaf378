//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the calibration code stays clean and testable
//! - output changes are localized (important for future snapshot tests)

use crate::calib::CalibrationRun;
use crate::data::Observations;
use crate::domain::{CalibConfig, TrialResult};

/// Format the run header and dataset stats printed before trials start.
pub fn format_run_header(config: &CalibConfig, observations: &Observations) -> String {
    let mut out = String::new();

    out.push_str("=== calib - period calibration ===\n");
    out.push_str(&format!("Period: {}\n", config.period));
    out.push_str(&format!(
        "Observations: {} to {} ({} days, {} rows read, {} row errors)\n",
        observations.start,
        observations.end,
        observations.len(),
        observations.rows_read,
        observations.row_errors.len(),
    ));
    out.push_str(&format!(
        "Search space: beta=[{}, {}] rel_death_prob=[{}, {}]\n",
        config.space.beta.low,
        config.space.beta.high,
        config.space.rel_death_prob.low,
        config.space.rel_death_prob.high,
    ));
    out.push_str(&format!(
        "Trials: {} (startup={}, seed={})\n",
        config.n_trials, config.n_startup_trials, config.seed,
    ));

    for err in observations.row_errors.iter().take(5) {
        out.push_str(&format!("  (row {} skipped) {}\n", err.line, err.message));
    }
    if observations.row_errors.len() > 5 {
        out.push_str(&format!(
            "  ... and {} more row errors\n",
            observations.row_errors.len() - 5
        ));
    }

    out
}

/// Format the post-run summary: best result plus the top-5 trial table.
pub fn format_run_summary(run: &CalibrationRun) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "\nCalibrated period {} ({} to {})\n",
        run.period.name, run.period.start, run.period.end
    ));
    out.push_str(&format!(
        "Best trial: #{} beta={:.6} rel_death_prob={:.6} misfit={:.4}\n",
        run.best_index, run.best.beta, run.best.rel_death_prob, run.best.misfit
    ));

    let failed = run.trials.iter().filter(|t| t.failed()).count();
    out.push_str(&format!(
        "Trials: {} completed, {} failed\n",
        run.trials.len() - failed,
        failed
    ));

    let top = best_trials(&run.trials, 5);
    out.push_str("\nBest 5 trials:\n");
    out.push_str("trial  beta      rel_death_prob  misfit\n");
    for t in &top {
        out.push_str(&format!(
            "{:<6} {:<9.6} {:<15.6} {:.4}\n",
            t.index, t.params.beta, t.params.rel_death_prob, t.misfit
        ));
    }

    if let (Some(beta_range), Some(rdp_range)) = (
        value_range(&top, |t| t.params.beta),
        value_range(&top, |t| t.params.rel_death_prob),
    ) {
        out.push_str("\nParameter ranges for best 5 trials:\n");
        out.push_str(&format!(
            "beta: {:.6} to {:.6}\n",
            beta_range.0, beta_range.1
        ));
        out.push_str(&format!(
            "rel_death_prob: {:.6} to {:.6}\n",
            rdp_range.0, rdp_range.1
        ));
    }

    out
}

/// The `n` best finished trials, ascending by misfit (ties by trial index).
pub fn best_trials(trials: &[TrialResult], n: usize) -> Vec<&TrialResult> {
    let mut finished: Vec<&TrialResult> = trials.iter().filter(|t| !t.failed()).collect();
    finished.sort_by(|a, b| {
        a.misfit
            .partial_cmp(&b.misfit)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.index.cmp(&b.index))
    });
    finished.truncate(n);
    finished
}

fn value_range(trials: &[&TrialResult], f: impl Fn(&TrialResult) -> f64) -> Option<(f64, f64)> {
    if trials.is_empty() {
        return None;
    }
    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    for t in trials {
        let v = f(t);
        lo = lo.min(v);
        hi = hi.max(v);
    }
    Some((lo, hi))
}
