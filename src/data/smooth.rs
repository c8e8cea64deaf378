//! Centered moving-average smoothing.
//!
//! The observed case/death counts are noisy day-of-report series; the
//! calibration compares simulator output against a 7-day centered rolling
//! mean instead. Positions whose window hangs off either edge of the series
//! are explicitly undefined (`None`), never extrapolated.

/// Default smoothing window (days). Must be odd for a centered window.
pub const SMOOTHING_WINDOW: usize = 7;

/// Smooth `values` with a centered moving average of width `window`.
///
/// The output has the same length as the input. The first and last
/// `window / 2` positions are `None` because their windows are incomplete.
pub fn centered_moving_average(values: &[f64], window: usize) -> Vec<Option<f64>> {
    debug_assert!(window % 2 == 1, "centered window must be odd");
    let half = window / 2;
    let n = values.len();

    let mut out = vec![None; n];
    if n < window {
        return out;
    }

    // Running sum over the sliding window keeps this O(n).
    let mut sum: f64 = values[..window].iter().sum();
    out[half] = Some(sum / window as f64);
    for i in (half + 1)..(n - half) {
        sum += values[i + half] - values[i - half - 1];
        out[i] = Some(sum / window as f64);
    }
    out
}
