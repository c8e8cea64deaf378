//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory during a calibration run
//! - exported to JSON/CSV
//! - reloaded later by plotting pipelines

use std::path::PathBuf;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Closed interval for one continuous parameter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub low: f64,
    pub high: f64,
}

impl Bounds {
    pub fn new(low: f64, high: f64) -> Result<Self, AppError> {
        if !(low.is_finite() && high.is_finite() && high >= low) {
            return Err(AppError::new(
                2,
                format!("Invalid parameter bounds: [{low}, {high}] (must be finite, high >= low)."),
            ));
        }
        Ok(Self { low, high })
    }

    pub fn width(&self) -> f64 {
        self.high - self.low
    }

    pub fn contains(&self, v: f64) -> bool {
        v >= self.low && v <= self.high
    }

    pub fn clamp(&self, v: f64) -> f64 {
        v.clamp(self.low, self.high)
    }
}

/// Search space for the two calibrated parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParamSpace {
    /// Per-contact transmission probability.
    pub beta: Bounds,
    /// Multiplier on the baseline death probability.
    pub rel_death_prob: Bounds,
}

impl ParamSpace {
    /// Default search box used by the Baguio calibrations.
    pub fn baguio_default() -> Self {
        Self {
            beta: Bounds {
                low: 0.005,
                high: 0.007,
            },
            rel_death_prob: Bounds {
                low: 0.5,
                high: 0.6,
            },
        }
    }
}

/// One sampled candidate. Immutable once drawn.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParameterPoint {
    pub beta: f64,
    pub rel_death_prob: f64,
}

/// One completed trial: the sampled point plus its misfit score.
///
/// A failed simulator invocation is recorded with `misfit = f64::INFINITY`
/// and the error message, so the trial history stays append-only and
/// gap-free even when individual runs blow up.
#[derive(Debug, Clone)]
pub struct TrialResult {
    pub index: usize,
    pub params: ParameterPoint,
    pub misfit: f64,
    pub error: Option<String>,
}

impl TrialResult {
    pub fn failed(&self) -> bool {
        self.error.is_some() || !self.misfit.is_finite()
    }
}

/// The persisted best-result record for one calibration period.
///
/// Field layout mirrors what the downstream plotting pipeline reads back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BestResult {
    pub period: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub beta: f64,
    pub rel_death_prob: f64,
    pub misfit: f64,
}

/// A full run's configuration as understood by the pipeline.
///
/// Derived from CLI flags (plus defaults).
#[derive(Debug, Clone)]
pub struct CalibConfig {
    /// Observation table (date, cases, deaths).
    pub data_path: PathBuf,
    /// Named calibration period.
    pub period: String,
    /// Trial budget (> 0).
    pub n_trials: usize,
    /// Sampler seed.
    pub seed: u64,
    /// Uniform startup trials before the model-based sampler kicks in.
    pub n_startup_trials: usize,
    /// Candidates drawn per model-based suggestion.
    pub n_ei_candidates: usize,
    /// Search space.
    pub space: ParamSpace,
    /// Directory for run artifacts (created on demand).
    pub output_dir: PathBuf,

    /// Base simulation parameters (fixed across trials).
    pub pop_size: f64,
    pub pop_infected: f64,
    pub pop_scale: f64,
}

impl CalibConfig {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.n_trials == 0 {
            return Err(AppError::new(2, "Trial budget must be > 0."));
        }
        if self.n_ei_candidates == 0 {
            return Err(AppError::new(2, "n_ei_candidates must be > 0."));
        }
        if !(self.pop_size.is_finite() && self.pop_size > 0.0) {
            return Err(AppError::new(2, "pop_size must be finite and > 0."));
        }
        if !(self.pop_infected.is_finite() && self.pop_infected >= 0.0) {
            return Err(AppError::new(2, "pop_infected must be finite and >= 0."));
        }
        if !(self.pop_scale.is_finite() && self.pop_scale > 0.0) {
            return Err(AppError::new(2, "pop_scale must be finite and > 0."));
        }
        Bounds::new(self.space.beta.low, self.space.beta.high)?;
        Bounds::new(self.space.rel_death_prob.low, self.space.rel_death_prob.high)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_reject_inverted_range() {
        assert!(Bounds::new(1.0, 0.5).is_err());
        assert!(Bounds::new(0.5, 1.0).is_ok());
    }

    #[test]
    fn failed_trial_is_detected_via_infinite_score() {
        let t = TrialResult {
            index: 0,
            params: ParameterPoint {
                beta: 0.006,
                rel_death_prob: 0.55,
            },
            misfit: f64::INFINITY,
            error: Some("sim blew up".to_string()),
        };
        assert!(t.failed());
    }
}
