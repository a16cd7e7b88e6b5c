use ndarray::prelude::*;

use crate::config::Polarity;
use crate::error::SearchError;
use crate::field::FieldContext;
use crate::spectrogram::SpectrogramFrame;

/// Oriented Bz at or below this value (nT) opens the field gate.
const GATE_BZ_MAX_NT: f64 = 0.0;

/// Combines the smoothed derivative with the polarity-gated field condition
/// into the per-timestep integrand. The integrand is the derivative value
/// where the characteristic energy is valid and at or below `max_energy_ev`
/// and the oriented Bz satisfies the gate; elsewhere it is zero. An empty
/// derivative yields an empty integrand.
///
/// Fails with `OutOfRange` when the field record does not cover a needed
/// timestamp; that is fatal for the file's analysis.
pub fn build_integrand(
    frame: &SpectrogramFrame,
    field: &FieldContext,
    derivative: &Array1<f64>,
    polarity: Polarity,
    max_energy_ev: f64,
) -> Result<Array1<f64>, SearchError> {
    if derivative.is_empty() {
        return Ok(Array1::zeros(0));
    }

    let n = frame.len().min(derivative.len());
    let mut out = Array1::zeros(n);
    for i in 0..n {
        let d = derivative[i];
        if !d.is_finite() {
            continue;
        }
        let eic = frame.eic[i];
        if !(eic > 0.0) || eic > max_energy_ev {
            continue;
        }
        let (_, _, bz) = field.field_at(frame.times[i])?;
        if polarity.orient(bz) <= GATE_BZ_MAX_NT {
            out[i] = d;
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldSample;
    use chrono::{DateTime, TimeZone, Utc};
    use std::path::PathBuf;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2014, 1, 11, 12, 0, 0).unwrap()
    }

    /// A frame whose Eic is pinned per timestep by putting all flux into a
    /// single channel.
    fn frame_with_eic(eic_ev: &[f64]) -> SpectrogramFrame {
        let n = eic_ev.len();
        let ch = array![1e3, 1e5];
        let mut flux = Array2::zeros((2, n));
        for (k, &e) in eic_ev.iter().enumerate() {
            let channel = if (e - 1e3).abs() < (e - 1e5).abs() { 0 } else { 1 };
            flux[[channel, k]] = 1e6;
        }
        let times = (0..n).map(|i| t0() + chrono::Duration::seconds(i as i64)).collect();
        SpectrogramFrame::new(times, ch, flux, vec![65.0; n], PathBuf::new()).unwrap()
    }

    fn constant_field(bz: f64, n_minutes: i64) -> FieldContext {
        let samples = (0..n_minutes)
            .map(|i| FieldSample {
                t: t0() + chrono::Duration::minutes(i - 1),
                bx: 5.0,
                by: -2.0,
                bz,
            })
            .collect();
        FieldContext::new(samples).unwrap()
    }

    #[test]
    fn test_gate_passes_southward_bz_forward() {
        let frame = frame_with_eic(&[1e3, 1e3, 1e3]);
        let field = constant_field(-8.0, 10);
        let d = array![0.01, -0.02, 0.03];
        let out =
            build_integrand(&frame, &field, &d, Polarity::Forward, 30_000.0).unwrap();
        assert!((out[0] - 0.01).abs() < 1e-12);
        assert!((out[1] - (-0.02)).abs() < 1e-12);
        assert!((out[2] - 0.03).abs() < 1e-12);
    }

    #[test]
    fn test_gate_blocks_northward_bz_forward() {
        let frame = frame_with_eic(&[1e3, 1e3]);
        let field = constant_field(3.0, 10);
        let d = array![0.01, 0.02];
        let out =
            build_integrand(&frame, &field, &d, Polarity::Forward, 30_000.0).unwrap();
        assert!(out.iter().all(|v| *v == 0.0));

        // Reverse polarity opens the gate on the same northward field.
        let out =
            build_integrand(&frame, &field, &d, Polarity::Reverse, 30_000.0).unwrap();
        assert!((out[0] - 0.01).abs() < 1e-12);
    }

    #[test]
    fn test_energy_ceiling_suppresses_evidence() {
        let frame = frame_with_eic(&[1e5, 1e3]);
        let field = constant_field(-8.0, 10);
        let d = array![0.01, 0.01];
        let out =
            build_integrand(&frame, &field, &d, Polarity::Forward, 30_000.0).unwrap();
        assert!(out[0] == 0.0);
        assert!((out[1] - 0.01).abs() < 1e-12);
    }

    #[test]
    fn test_nan_derivative_becomes_zero() {
        let frame = frame_with_eic(&[1e3, 1e3]);
        let field = constant_field(-8.0, 10);
        let d = array![f64::NAN, 0.01];
        let out =
            build_integrand(&frame, &field, &d, Polarity::Forward, 30_000.0).unwrap();
        assert!(out[0] == 0.0);
        assert!((out[1] - 0.01).abs() < 1e-12);
    }

    #[test]
    fn test_uncovered_timestamp_is_fatal() {
        let frame = frame_with_eic(&[1e3, 1e3]);
        // Record ends before the frame does.
        let samples = vec![
            FieldSample { t: t0() - chrono::Duration::minutes(1), bx: 0.0, by: 0.0, bz: -1.0 },
            FieldSample { t: t0(), bx: 0.0, by: 0.0, bz: -1.0 },
        ];
        let field = FieldContext::new(samples).unwrap();
        let d = array![0.01, 0.01];
        let result = build_integrand(&frame, &field, &d, Polarity::Forward, 30_000.0);
        match result {
            Err(SearchError::OutOfRange { .. }) => {}
            other => panic!("expected OutOfRange, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_polarity_symmetry() {
        let frame = frame_with_eic(&[1e3; 6]);
        let d = array![0.01, 0.02, 0.0, -0.01, 0.02, 0.01];
        let forward_field = constant_field(-8.0, 10);
        let flipped = FieldContext::new(
            (0..10)
                .map(|i| FieldSample {
                    t: t0() + chrono::Duration::minutes(i - 1),
                    bx: -5.0,
                    by: 2.0,
                    bz: 8.0,
                })
                .collect(),
        )
        .unwrap();

        let fwd =
            build_integrand(&frame, &forward_field, &d, Polarity::Forward, 30_000.0).unwrap();
        let rev =
            build_integrand(&frame, &flipped, &d, Polarity::Reverse, 30_000.0).unwrap();
        assert_eq!(fwd, rev);
    }
}
