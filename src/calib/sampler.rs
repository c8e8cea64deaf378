//! Sequential model-based parameter sampling.
//!
//! The driver asks the sampler for one candidate per trial. The default
//! implementation is a small TPE-style sampler:
//!
//! - the first `n_startup_trials` suggestions are uniform over the space,
//!   seeding the model
//! - afterwards, finished trials are split into a good and a bad set by
//!   score quantile; `n_ei_candidates` draws from a Parzen mixture over the
//!   good set are ranked by the good/bad density ratio and the best one wins
//!
//! Everything is driven by one seeded `StdRng`, so a fixed seed plus a
//! deterministic simulator reproduces a run exactly. Failed trials carry no
//! score information and are excluded from the model.

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::domain::{Bounds, ParamSpace, ParameterPoint, TrialResult};

/// Fraction of finished trials considered "good".
const GOOD_QUANTILE: f64 = 0.25;

/// Proposal seam between the driver and the search strategy.
pub trait Sampler {
    fn suggest(&mut self, space: &ParamSpace, history: &[TrialResult]) -> ParameterPoint;
}

/// TPE-style sampler with uniform startup trials.
#[derive(Debug)]
pub struct TpeSampler {
    rng: StdRng,
    n_startup_trials: usize,
    n_ei_candidates: usize,
}

impl TpeSampler {
    pub fn new(seed: u64, n_startup_trials: usize, n_ei_candidates: usize) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            n_startup_trials,
            n_ei_candidates: n_ei_candidates.max(1),
        }
    }

    fn uniform(&mut self, space: &ParamSpace) -> ParameterPoint {
        ParameterPoint {
            beta: sample_uniform(&mut self.rng, &space.beta),
            rel_death_prob: sample_uniform(&mut self.rng, &space.rel_death_prob),
        }
    }

    fn model_based(&mut self, space: &ParamSpace, finished: &[&TrialResult]) -> ParameterPoint {
        // Ascending by score; ties keep history order, which is already
        // ordered by trial index.
        let mut sorted: Vec<&TrialResult> = finished.to_vec();
        sorted.sort_by(|a, b| a.misfit.partial_cmp(&b.misfit).unwrap_or(std::cmp::Ordering::Equal));

        let n = sorted.len();
        let n_good = ((GOOD_QUANTILE * n as f64).ceil() as usize).clamp(1, n - 1);

        let good_beta: Vec<f64> = sorted[..n_good].iter().map(|t| t.params.beta).collect();
        let bad_beta: Vec<f64> = sorted[n_good..].iter().map(|t| t.params.beta).collect();
        let good_rdp: Vec<f64> = sorted[..n_good]
            .iter()
            .map(|t| t.params.rel_death_prob)
            .collect();
        let bad_rdp: Vec<f64> = sorted[n_good..]
            .iter()
            .map(|t| t.params.rel_death_prob)
            .collect();

        let mut best: Option<(f64, ParameterPoint)> = None;
        for _ in 0..self.n_ei_candidates {
            let beta = sample_parzen(&mut self.rng, &good_beta, &space.beta);
            let rdp = sample_parzen(&mut self.rng, &good_rdp, &space.rel_death_prob);

            let score = log_density(beta, &good_beta, &space.beta)
                - log_density(beta, &bad_beta, &space.beta)
                + log_density(rdp, &good_rdp, &space.rel_death_prob)
                - log_density(rdp, &bad_rdp, &space.rel_death_prob);

            let candidate = ParameterPoint {
                beta,
                rel_death_prob: rdp,
            };
            // Strict comparison keeps the earliest candidate on ties.
            if best.as_ref().is_none_or(|(s, _)| score > *s) {
                best = Some((score, candidate));
            }
        }

        match best {
            Some((_, point)) => point,
            // n_ei_candidates >= 1, so this is unreachable; fall back anyway.
            None => self.uniform(space),
        }
    }
}

impl Sampler for TpeSampler {
    fn suggest(&mut self, space: &ParamSpace, history: &[TrialResult]) -> ParameterPoint {
        let finished: Vec<&TrialResult> = history.iter().filter(|t| !t.failed()).collect();
        if finished.len() < self.n_startup_trials.max(2) {
            return self.uniform(space);
        }
        self.model_based(space, &finished)
    }
}

fn sample_uniform(rng: &mut StdRng, bounds: &Bounds) -> f64 {
    if bounds.width() == 0.0 {
        return bounds.low;
    }
    rng.gen_range(bounds.low..=bounds.high)
}

/// Kernel bandwidth for a Parzen mixture: Scott's rule with a floor so a
/// degenerate (zero-variance) observation set still explores.
fn bandwidth(values: &[f64], bounds: &Bounds) -> f64 {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    let scott = 1.06 * var.sqrt() * n.powf(-0.2);
    scott.max(bounds.width() * 0.01).max(1e-12)
}

/// Draw one value from the Parzen mixture over `centers`, clamped to bounds.
fn sample_parzen(rng: &mut StdRng, centers: &[f64], bounds: &Bounds) -> f64 {
    if centers.is_empty() || bounds.width() == 0.0 {
        return sample_uniform(rng, bounds);
    }
    let bw = bandwidth(centers, bounds);
    let center = centers[rng.gen_range(0..centers.len())];
    match Normal::new(center, bw) {
        Ok(kernel) => bounds.clamp(kernel.sample(rng)),
        Err(_) => sample_uniform(rng, bounds),
    }
}

/// Log-density of `x` under the Parzen mixture over `centers`.
///
/// An empty mixture falls back to the uniform density over the bounds, and a
/// small floor keeps the ratio finite far from all kernels.
fn log_density(x: f64, centers: &[f64], bounds: &Bounds) -> f64 {
    if centers.is_empty() {
        return -(bounds.width().max(1e-12)).ln();
    }
    let bw = bandwidth(centers, bounds);
    let mut acc = 0.0;
    for &c in centers {
        acc += normal_pdf(x, c, bw);
    }
    (acc / centers.len() as f64).max(1e-300).ln()
}

fn normal_pdf(x: f64, mean: f64, sd: f64) -> f64 {
    let z = (x - mean) / sd;
    (-0.5 * z * z).exp() / (sd * (2.0 * std::f64::consts::PI).sqrt())
}
