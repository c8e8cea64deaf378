//! Simulator interface.
//!
//! The calibration loop treats the epidemic simulator as a black box behind
//! a narrow capability contract: give it a parameter bundle, get back daily
//! new-infection and new-death series. Nothing open-ended leaks through.
//!
//! The production agent-based simulator lives outside this crate; `seir`
//! provides a small deterministic reference implementation so the binary can
//! run end-to-end and tests can exercise the loop.

use chrono::NaiveDate;

pub mod seir;

pub use seir::SeirSimulator;

/// Parameter bundle for one simulator invocation.
///
/// `beta` and `rel_death_prob` vary per trial; the rest is fixed per run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimParams {
    pub pop_size: f64,
    pub pop_infected: f64,
    /// Scale factor from the simulated agent population to the real one.
    pub pop_scale: f64,
    pub start_day: NaiveDate,
    pub end_day: NaiveDate,
    pub beta: f64,
    pub rel_death_prob: f64,
}

/// Daily simulator output, one entry per simulated day from `start`.
#[derive(Debug, Clone, PartialEq)]
pub struct SimOutput {
    pub start: NaiveDate,
    pub new_infections: Vec<f64>,
    pub new_deaths: Vec<f64>,
}

impl SimOutput {
    /// Reindex a daily series onto `[start, end]`, zero-filling days the
    /// simulator did not cover. Missing coverage must never silently shrink
    /// the comparison window, so the fill is explicit.
    pub fn align(&self, start: NaiveDate, end: NaiveDate) -> (Vec<f64>, Vec<f64>) {
        let days = (end - start).num_days();
        if days < 0 {
            return (Vec::new(), Vec::new());
        }
        let n = days as usize + 1;
        let mut infections = vec![0.0; n];
        let mut deaths = vec![0.0; n];

        for (i, out) in infections.iter_mut().enumerate() {
            let date = start + chrono::Duration::days(i as i64);
            let src = (date - self.start).num_days();
            if src >= 0 && (src as usize) < self.new_infections.len() {
                *out = self.new_infections[src as usize];
                deaths[i] = self.new_deaths.get(src as usize).copied().unwrap_or(0.0);
            }
        }
        (infections, deaths)
    }
}

/// A simulator failure for one trial. Trial-level failures are isolated:
/// the driver records them and moves on.
#[derive(Debug, Clone)]
pub struct SimError(pub String);

impl std::fmt::Display for SimError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for SimError {}

/// The black-box simulator seam.
pub trait Simulator {
    fn run(&self, params: &SimParams) -> Result<SimOutput, SimError>;
}
