use chrono::{DateTime, Utc};
use ndarray::prelude::*;

use crate::fitting::fit_linear_least_squares;
use crate::utils::seconds_between;

/// Minimum number of valid samples a window must hold for a slope estimate.
const MIN_WINDOW_POINTS: usize = 3;

/// Smoothed time derivative of log10(characteristic energy), in decades per
/// second, aligned 1:1 with the input timestamps.
///
/// Each output sample is the least-squares slope of log10(Eic) over a
/// centered window of `window` samples; the window truncates at the series
/// edges so the output length always equals the input length. Non-positive
/// or NaN energies are gaps: they never enter a fit, and the output at a gap
/// index is NaN. A series shorter than the window yields an empty output.
pub fn smooth_log_derivative(
    times: &[DateTime<Utc>],
    eic_ev: &Array1<f64>,
    window: usize,
) -> Array1<f64> {
    let n = times.len().min(eic_ev.len());
    if n < window || window == 0 {
        return Array1::zeros(0);
    }

    let half = window / 2;
    let mut out = Array1::from_elem(n, f64::NAN);
    let mut x = Vec::with_capacity(window);
    let mut y = Vec::with_capacity(window);

    for i in 0..n {
        if !(eic_ev[i] > 0.0) || !eic_ev[i].is_finite() {
            continue;
        }

        let lo = i.saturating_sub(half);
        let hi = (i + half).min(n - 1);
        x.clear();
        y.clear();
        for j in lo..=hi {
            let e = eic_ev[j];
            if e > 0.0 && e.is_finite() {
                x.push(seconds_between(times[i], times[j]));
                y.push(e.log10());
            }
        }

        if x.len() < MIN_WINDOW_POINTS {
            continue;
        }
        if let Ok((slope, _)) = fit_linear_least_squares(&x, &y) {
            out[i] = slope;
        }
    }

    out
}
