use chrono::{DateTime, Utc};
use ndarray::prelude::*;

use crate::config::SearchConfig;
use crate::utils::seconds_between;

/// A candidate interval while the walker is accumulating. `integral` is the
/// peak running integral reached before close, in decades.
#[derive(Debug, Clone, Copy)]
pub struct CandidateInterval {
    pub start: usize,
    pub end: usize,
    pub integral: f64,
}

#[derive(Clone, Copy)]
enum WalkState {
    Idle,
    Accumulating {
        start: usize,
        last_active: usize,
        integral: f64,
        peak: f64,
        decay_s: f64,
    },
}

/// Single pass over the integrand, left to right, accumulating a running
/// time integral inside at most one open interval. An interval opens when a
/// sample reaches the entry threshold and closes when the evidence decays
/// below the threshold for a sustained stretch, when the running integral
/// falls back to zero, when the maximum interval duration is reached, or at
/// the end of the series. The recorded end index is the last sample that was
/// at or above the entry threshold, so an interval never trails into its own
/// decay tail. Closed intervals pass the acceptance filter (minimum duration
/// and minimum peak integral) or are dropped silently.
///
/// The walker never revisits earlier samples, so the accepted intervals are
/// pairwise disjoint and ordered by start index.
pub fn walk(
    times: &[DateTime<Utc>],
    integrand: &Array1<f64>,
    config: &SearchConfig,
) -> Vec<CandidateInterval> {
    let n = times.len().min(integrand.len());
    if n < 2 {
        return Vec::new();
    }

    let mut accepted = Vec::new();
    let mut state = WalkState::Idle;

    for i in 0..n {
        let value = integrand[i];
        let dt = if i > 0 {
            seconds_between(times[i - 1], times[i])
        } else {
            seconds_between(times[0], times[1])
        };

        match state {
            WalkState::Idle => {
                if value >= config.entry_threshold {
                    state = WalkState::Accumulating {
                        start: i,
                        last_active: i,
                        integral: value * dt,
                        peak: value * dt,
                        decay_s: 0.0,
                    };
                }
            }
            WalkState::Accumulating {
                start,
                mut last_active,
                mut integral,
                mut peak,
                mut decay_s,
            } => {
                integral += 0.5 * (integrand[i - 1] + value) * dt;
                peak = peak.max(integral);

                if value >= config.entry_threshold {
                    last_active = i;
                    decay_s = 0.0;
                } else {
                    decay_s += dt;
                }

                let elapsed = seconds_between(times[start], times[i]);
                let close = decay_s >= config.exit_decay_s
                    || integral <= 0.0
                    || elapsed >= config.interval_length_s
                    || i == n - 1;

                if close {
                    if let Some(interval) =
                        accept(times, start, last_active, peak, config)
                    {
                        accepted.push(interval);
                    }
                    state = WalkState::Idle;
                } else {
                    state = WalkState::Accumulating {
                        start,
                        last_active,
                        integral,
                        peak,
                        decay_s,
                    };
                }
            }
        }
    }

    accepted
}

fn accept(
    times: &[DateTime<Utc>],
    start: usize,
    end: usize,
    peak: f64,
    config: &SearchConfig,
) -> Option<CandidateInterval> {
    if end <= start {
        return None;
    }
    let duration = seconds_between(times[start], times[end]);
    if duration < config.min_duration_s || peak < config.min_integral {
        return None;
    }
    Some(CandidateInterval {
        start,
        end,
        integral: peak,
    })
}
