//! Weighted-L1 misfit between observed and simulated series.
//!
//! `J = Σ |obs_c − sim_c| / M_c + Σ |obs_d − sim_d| / M_d`
//!
//! where `M_c` is the maximum of the *observed* smoothed cases over the
//! comparison window (forced to 1 when that max is 0, so an all-zero
//! observed series still lets simulated deviation register), and `M_d`
//! likewise for deaths. No normalization by series length; lower is better.
//!
//! The normalizer is deliberately the per-series max rather than a sum or a
//! fixed constant: recalibration depends on reproducing this exact scoring
//! surface, so it is preserved as-is.
//!
//! Note the divisor asymmetry: swapping observed and simulated changes which
//! series supplies the normalizers, so `misfit(a, b) != misfit(b, a)` in
//! general. Callers must not assume symmetry.

use crate::error::AppError;

/// Compute the misfit over one aligned comparison window.
///
/// Observed series are smoothed and may be undefined at window edges; only
/// positions where *both* observed series are defined participate. Simulated
/// series must be fully defined (the caller zero-fills uncovered days) and
/// the four slices must have equal length.
pub fn misfit(
    obs_cases: &[Option<f64>],
    obs_deaths: &[Option<f64>],
    sim_cases: &[f64],
    sim_deaths: &[f64],
) -> Result<f64, AppError> {
    let n = obs_cases.len();
    if obs_deaths.len() != n || sim_cases.len() != n || sim_deaths.len() != n {
        return Err(AppError::new(
            4,
            format!(
                "Misfit series length mismatch: obs_cases={n}, obs_deaths={}, sim_cases={}, sim_deaths={}",
                obs_deaths.len(),
                sim_cases.len(),
                sim_deaths.len()
            ),
        ));
    }

    let mut m_cases = 0.0_f64;
    let mut m_deaths = 0.0_f64;
    let mut any_defined = false;
    for i in 0..n {
        if let (Some(c), Some(d)) = (obs_cases[i], obs_deaths[i]) {
            any_defined = true;
            m_cases = m_cases.max(c);
            m_deaths = m_deaths.max(d);
        }
    }
    if !any_defined {
        return Err(AppError::new(
            3,
            "No defined observation positions in the comparison window.",
        ));
    }

    // Divisor forced to 1 when the observed max is zero.
    let m_cases = if m_cases == 0.0 { 1.0 } else { m_cases };
    let m_deaths = if m_deaths == 0.0 { 1.0 } else { m_deaths };

    let mut j = 0.0;
    for i in 0..n {
        if let (Some(oc), Some(od)) = (obs_cases[i], obs_deaths[i]) {
            j += (oc - sim_cases[i]).abs() / m_cases + (od - sim_deaths[i]).abs() / m_deaths;
        }
    }
    Ok(j)
}
