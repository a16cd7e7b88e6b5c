use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use byteorder::{LittleEndian, ReadBytesExt};
use chrono::NaiveDate;
use ndarray::prelude::*;

use crate::error::SearchError;
use crate::field::FieldSample;
use crate::spectrogram::SpectrogramFrame;
use crate::utils::datetime_from_unix_seconds;

// Daily spectrogram container: 16-byte header, then the timestamp, channel
// energy, flux and magnetic latitude arrays, all little-endian f64.
const DMSP_MAGIC: u32 = 0x4449_5350; // "DISP"
const DMSP_VERSION: u32 = 1;
const MAX_TIMES: u32 = 200_000;
const MAX_CHANNELS: u32 = 256;

// OMNIweb fill value for missing field components.
const OMNI_FILL_NT: f64 = 999.0;

fn malformed(path: &Path, reason: impl Into<String>) -> SearchError {
    SearchError::Malformed {
        path: path.to_path_buf(),
        reason: reason.into(),
    }
}

/// Reads and merges OMNIweb field listings. Each row is
/// `YEAR DOY HR MN Bx By Bz` (nT); rows carrying fill values are dropped.
/// The merged record is time-sorted; duplicate timestamps are rejected.
pub fn read_omniweb_files(paths: &[PathBuf]) -> Result<Vec<FieldSample>, SearchError> {
    let mut samples = Vec::new();
    for path in paths {
        let content = fs::read_to_string(path)?;
        for (lineno, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let sample = parse_omniweb_row(line).map_err(|reason| {
                malformed(path, format!("line {}: {}", lineno + 1, reason))
            })?;
            if let Some(sample) = sample {
                samples.push(sample);
            }
        }
    }

    samples.sort_by_key(|s| s.t);
    for pair in samples.windows(2) {
        if pair[1].t == pair[0].t {
            return Err(SearchError::BadFieldRecord(format!(
                "duplicate timestamp {} in merged OMNIweb record",
                pair[1].t.to_rfc3339()
            )));
        }
    }
    Ok(samples)
}

/// One OMNIweb row; `Ok(None)` for a fill row.
fn parse_omniweb_row(line: &str) -> Result<Option<FieldSample>, String> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() < 7 {
        return Err(format!("expected 7 columns, found {}", fields.len()));
    }

    let year: i32 = fields[0].parse().map_err(|_| "bad year".to_string())?;
    let doy: u32 = fields[1].parse().map_err(|_| "bad day-of-year".to_string())?;
    let hour: u32 = fields[2].parse().map_err(|_| "bad hour".to_string())?;
    let minute: u32 = fields[3].parse().map_err(|_| "bad minute".to_string())?;
    let bx: f64 = fields[4].parse().map_err(|_| "bad Bx".to_string())?;
    let by: f64 = fields[5].parse().map_err(|_| "bad By".to_string())?;
    let bz: f64 = fields[6].parse().map_err(|_| "bad Bz".to_string())?;

    if bx.abs() >= OMNI_FILL_NT || by.abs() >= OMNI_FILL_NT || bz.abs() >= OMNI_FILL_NT {
        return Ok(None);
    }

    let t = NaiveDate::from_yo_opt(year, doy)
        .and_then(|d| d.and_hms_opt(hour, minute, 0))
        .ok_or_else(|| format!("invalid time {}/{} {}:{:02}", year, doy, hour, minute))?
        .and_utc();

    Ok(Some(FieldSample { t, bx, by, bz }))
}

/// Reads one daily DMSP spectrogram file and derives the characteristic
/// energy. Any structural problem is a malformed-file error; the caller
/// skips the file and moves on.
pub fn read_dmsp_file(path: &Path) -> Result<SpectrogramFrame, SearchError> {
    let data = fs::read(path)?;
    let mut cursor = Cursor::new(data.as_slice());

    let magic = cursor
        .read_u32::<LittleEndian>()
        .map_err(|_| malformed(path, "file too short for header"))?;
    if magic != DMSP_MAGIC {
        return Err(malformed(path, format!("bad magic 0x{:08x}", magic)));
    }
    let version = cursor
        .read_u32::<LittleEndian>()
        .map_err(|_| malformed(path, "file too short for header"))?;
    if version != DMSP_VERSION {
        return Err(malformed(path, format!("unsupported version {}", version)));
    }
    let n_times = cursor
        .read_u32::<LittleEndian>()
        .map_err(|_| malformed(path, "file too short for header"))?;
    let n_channels = cursor
        .read_u32::<LittleEndian>()
        .map_err(|_| malformed(path, "file too short for header"))?;

    if n_times == 0 || n_times > MAX_TIMES || n_channels == 0 || n_channels > MAX_CHANNELS {
        return Err(malformed(
            path,
            format!("implausible dimensions: {} times, {} channels", n_times, n_channels),
        ));
    }

    let n_times = n_times as usize;
    let n_channels = n_channels as usize;
    let expected = 16 + 8 * (n_times + n_channels + n_channels * n_times + n_times);
    if data.len() != expected {
        return Err(malformed(
            path,
            format!("expected {} bytes, found {}", expected, data.len()),
        ));
    }

    let mut times = Vec::with_capacity(n_times);
    for _ in 0..n_times {
        let ts = cursor.read_f64::<LittleEndian>()?;
        let t = datetime_from_unix_seconds(ts)
            .ok_or_else(|| malformed(path, format!("invalid timestamp {}", ts)))?;
        times.push(t);
    }

    let mut ch_energy = Vec::with_capacity(n_channels);
    for _ in 0..n_channels {
        ch_energy.push(cursor.read_f64::<LittleEndian>()?);
    }

    let mut flux = Vec::with_capacity(n_channels * n_times);
    for _ in 0..n_channels * n_times {
        flux.push(cursor.read_f64::<LittleEndian>()?);
    }
    let flux = Array2::from_shape_vec((n_channels, n_times), flux)
        .map_err(|e| malformed(path, e.to_string()))?;

    let mut mlat = Vec::with_capacity(n_times);
    for _ in 0..n_times {
        mlat.push(cursor.read_f64::<LittleEndian>()?);
    }

    SpectrogramFrame::new(times, Array1::from_vec(ch_energy), flux, mlat, path.to_path_buf())
}
