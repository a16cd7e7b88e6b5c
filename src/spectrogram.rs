use std::path::PathBuf;

use chrono::{DateTime, Utc};
use ndarray::prelude::*;

use crate::error::SearchError;

/// Total-flux floor below which a timestep has no usable ion signal and the
/// characteristic energy is a gap. Matches the lower end of the plot color
/// scale.
pub const FLUX_FLOOR: f64 = 1e3;

/// One daily spectrogram: timestamp array, channel energies, the energy-flux
/// matrix (channel-major), per-timestep magnetic latitude, and the derived
/// characteristic energy. Read-only for the duration of one file's analysis.
#[derive(Debug)]
pub struct SpectrogramFrame {
    pub times: Vec<DateTime<Utc>>,
    /// Channel central energies in eV, ascending.
    pub ch_energy: Array1<f64>,
    /// Differential energy flux, shape (n_channels, n_times).
    pub flux: Array2<f64>,
    /// Magnetic latitude per timestep, degrees. Display context only.
    pub mlat: Vec<f64>,
    /// Characteristic energy per timestep in eV; NaN marks a gap.
    pub eic: Array1<f64>,
    /// The file this frame came from.
    pub source: PathBuf,
}

impl SpectrogramFrame {
    pub fn new(
        times: Vec<DateTime<Utc>>,
        ch_energy: Array1<f64>,
        flux: Array2<f64>,
        mlat: Vec<f64>,
        source: PathBuf,
    ) -> Result<SpectrogramFrame, SearchError> {
        let n_times = times.len();
        let n_channels = ch_energy.len();
        if flux.dim() != (n_channels, n_times) || mlat.len() != n_times {
            return Err(SearchError::Malformed {
                path: source,
                reason: format!(
                    "array shape mismatch: {} times, {} channels, flux {:?}, {} mlat",
                    n_times,
                    n_channels,
                    flux.dim(),
                    mlat.len()
                ),
            });
        }
        for pair in times.windows(2) {
            if pair[1] <= pair[0] {
                return Err(SearchError::Malformed {
                    path: source,
                    reason: format!(
                        "timestamps not strictly increasing at {}",
                        pair[1].to_rfc3339()
                    ),
                });
            }
        }

        let eic = Array1::from_iter(
            (0..n_times).map(|k| characteristic_energy(&ch_energy, flux.column(k))),
        );

        Ok(SpectrogramFrame {
            times,
            ch_energy,
            flux,
            mlat,
            eic,
            source,
        })
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }
}

/// Flux-weighted mean of log10(channel energy), converted back to eV. NaN when
/// the column's total flux is below the floor.
fn characteristic_energy(ch_energy: &Array1<f64>, column: ArrayView1<f64>) -> f64 {
    let mut total = 0.0;
    let mut weighted = 0.0;
    for (energy, flux) in ch_energy.iter().zip(column.iter()) {
        if *flux > 0.0 && flux.is_finite() {
            total += *flux;
            weighted += *flux * energy.log10();
        }
    }
    if total < FLUX_FLOOR {
        return f64::NAN;
    }
    10f64.powf(weighted / total)
}
