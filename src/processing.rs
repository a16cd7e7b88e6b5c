use std::path::Path;

use ndarray::prelude::*;

use crate::config::{Polarity, SearchConfig};
use crate::derivative::smooth_log_derivative;
use crate::error::SearchError;
use crate::field::FieldContext;
use crate::integrand::build_integrand;
use crate::read::read_dmsp_file;
use crate::spectrogram::SpectrogramFrame;
use crate::summary::{summarize, MatchRecord};
use crate::walker::walk;

/// Everything one file's analysis produces: the accepted event records plus
/// the integrand series and the frame itself, kept so the plot layer can
/// render diagnostics without recomputation.
#[derive(Debug)]
pub struct FileAnalysis {
    pub records: Vec<MatchRecord>,
    pub integrand: Array1<f64>,
    pub frame: SpectrogramFrame,
}

/// Runs the detection pipeline over an already-loaded frame: smoothed
/// log-energy derivative, polarity-gated integrand, interval walk, summary.
/// The records carry the frame's source path.
pub fn analyze_frame(
    frame: SpectrogramFrame,
    field: &FieldContext,
    polarity: Polarity,
    config: &SearchConfig,
) -> Result<FileAnalysis, SearchError> {
    let derivative = smooth_log_derivative(&frame.times, &frame.eic, config.smoothing_window);
    if derivative.is_empty() {
        // Too few samples for the smoothing window: zero events, not an error.
        return Ok(FileAnalysis {
            records: Vec::new(),
            integrand: Array1::zeros(0),
            frame,
        });
    }

    let integrand =
        build_integrand(&frame, field, &derivative, polarity, config.max_energy_ev)?;
    let intervals = walk(&frame.times, &integrand, config);

    let mut records = Vec::with_capacity(intervals.len());
    for interval in &intervals {
        let mut record = summarize(interval, &frame.times, field)?;
        record.file = frame.source.clone();
        records.push(record);
    }

    Ok(FileAnalysis {
        records,
        integrand,
        frame,
    })
}

/// Per-file entry point: load the spectrogram, then analyze it.
pub fn search_events(
    path: &Path,
    field: &FieldContext,
    polarity: Polarity,
    config: &SearchConfig,
) -> Result<FileAnalysis, SearchError> {
    let frame = read_dmsp_file(path)?;
    analyze_frame(frame, field, polarity, config)
}
