use std::path::PathBuf;

use chrono::{DateTime, Utc};

use crate::error::SearchError;
use crate::field::FieldContext;
use crate::walker::CandidateInterval;

/// One catalogued dispersion event. Immutable once assembled; `file` is set
/// by the caller right after summarization, never patched in later.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchRecord {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub bx_mean: f64,
    pub by_mean: f64,
    pub bz_mean: f64,
    pub file: PathBuf,
}

impl MatchRecord {
    pub fn duration_minutes(&self) -> f64 {
        (self.end_time - self.start_time).num_milliseconds() as f64 / 60_000.0
    }
}

/// Maps an accepted interval's index bounds to timestamps and attaches the
/// mean field components over the event span. Propagates `OutOfRange` only;
/// the caller treats that as fatal for the file.
pub fn summarize(
    interval: &CandidateInterval,
    times: &[DateTime<Utc>],
    field: &FieldContext,
) -> Result<MatchRecord, SearchError> {
    let start_time = times[interval.start];
    let end_time = times[interval.end];
    let (bx_mean, by_mean, bz_mean) = field.mean_over(start_time, end_time)?;
    Ok(MatchRecord {
        start_time,
        end_time,
        bx_mean,
        by_mean,
        bz_mean,
        file: PathBuf::new(),
    })
}
