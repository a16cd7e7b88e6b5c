use chrono::{DateTime, Utc};

use crate::error::SearchError;
use crate::utils::seconds_between;

/// One interplanetary magnetic-field measurement (GSM, nT).
#[derive(Debug, Clone, Copy)]
pub struct FieldSample {
    pub t: DateTime<Utc>,
    pub bx: f64,
    pub by: f64,
    pub bz: f64,
}

/// Immutable, time-indexed view over the merged field record. Built once per
/// run and shared read-only across the per-file analyses.
#[derive(Debug)]
pub struct FieldContext {
    samples: Vec<FieldSample>,
}

impl FieldContext {
    /// The samples must already be merged and time-sorted; duplicate or
    /// out-of-order timestamps are rejected.
    pub fn new(samples: Vec<FieldSample>) -> Result<FieldContext, SearchError> {
        if samples.is_empty() {
            return Err(SearchError::BadFieldRecord("no samples".to_string()));
        }
        for pair in samples.windows(2) {
            if pair[1].t <= pair[0].t {
                return Err(SearchError::BadFieldRecord(format!(
                    "timestamps not strictly increasing at {}",
                    pair[1].t.to_rfc3339()
                )));
            }
        }
        Ok(FieldContext { samples })
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn span(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        (
            self.samples[0].t,
            self.samples[self.samples.len() - 1].t,
        )
    }

    pub fn covers(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        let (lo, hi) = self.span();
        lo <= start && end <= hi
    }

    /// Linearly interpolated field vector at `t`.
    pub fn field_at(&self, t: DateTime<Utc>) -> Result<(f64, f64, f64), SearchError> {
        let (lo, hi) = self.span();
        if t < lo || t > hi {
            return Err(SearchError::OutOfRange { t, span: (lo, hi) });
        }

        let idx = self.samples.partition_point(|s| s.t < t);
        if idx < self.samples.len() && self.samples[idx].t == t {
            let s = &self.samples[idx];
            return Ok((s.bx, s.by, s.bz));
        }

        // t lies strictly between samples idx-1 and idx.
        let prev = &self.samples[idx - 1];
        let next = &self.samples[idx];
        let gap = seconds_between(prev.t, next.t);
        let w = seconds_between(prev.t, t) / gap;
        Ok((
            prev.bx + w * (next.bx - prev.bx),
            prev.by + w * (next.by - prev.by),
            prev.bz + w * (next.bz - prev.bz),
        ))
    }

    /// Arithmetic mean of all samples with timestamp in [start, end]. When no
    /// sample falls inside, falls back to the interpolated estimate at the
    /// interval midpoint.
    pub fn mean_over(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<(f64, f64, f64), SearchError> {
        let lo = self.samples.partition_point(|s| s.t < start);
        let hi = self.samples.partition_point(|s| s.t <= end);
        if lo >= hi {
            let midpoint = start + (end - start) / 2;
            return self.field_at(midpoint);
        }

        let n = (hi - lo) as f64;
        let mut sum = (0.0, 0.0, 0.0);
        for s in &self.samples[lo..hi] {
            sum.0 += s.bx;
            sum.1 += s.by;
            sum.2 += s.bz;
        }
        Ok((sum.0 / n, sum.1 / n, sum.2 / n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2014, 1, 11, 12, 0, 0).unwrap()
    }

    fn minute_record(values: &[(f64, f64, f64)]) -> FieldContext {
        let samples = values
            .iter()
            .enumerate()
            .map(|(i, &(bx, by, bz))| FieldSample {
                t: t0() + chrono::Duration::minutes(i as i64),
                bx,
                by,
                bz,
            })
            .collect();
        FieldContext::new(samples).unwrap()
    }

    #[test]
    fn test_new_rejects_unsorted() {
        let mut samples = vec![
            FieldSample { t: t0(), bx: 0.0, by: 0.0, bz: 0.0 },
            FieldSample { t: t0(), bx: 1.0, by: 1.0, bz: 1.0 },
        ];
        assert!(FieldContext::new(samples.clone()).is_err());
        samples.swap(0, 1);
        assert!(FieldContext::new(samples).is_err());
        assert!(FieldContext::new(Vec::new()).is_err());
    }

    #[test]
    fn test_field_at_interpolates() {
        let ctx = minute_record(&[(0.0, 0.0, -2.0), (4.0, -8.0, 2.0)]);
        let (bx, by, bz) = ctx.field_at(t0() + chrono::Duration::seconds(30)).unwrap();
        assert!((bx - 2.0).abs() < 1e-9);
        assert!((by - (-4.0)).abs() < 1e-9);
        assert!((bz - 0.0).abs() < 1e-9);

        // Exact sample hit returns the sample itself.
        let (bx, _, _) = ctx.field_at(t0()).unwrap();
        assert!((bx - 0.0).abs() < 1e-9);
    }

    #[test]
    fn test_field_at_out_of_range() {
        let ctx = minute_record(&[(1.0, 1.0, 1.0), (2.0, 2.0, 2.0)]);
        let before = t0() - chrono::Duration::seconds(1);
        match ctx.field_at(before) {
            Err(SearchError::OutOfRange { .. }) => {}
            other => panic!("expected OutOfRange, got {:?}", other),
        }
    }

    #[test]
    fn test_mean_over_inclusive_bounds() {
        let ctx = minute_record(&[(5.0, -2.0, -8.0), (5.0, -2.0, -8.0), (11.0, 4.0, 1.0)]);
        let (bx, by, bz) = ctx
            .mean_over(t0(), t0() + chrono::Duration::minutes(1))
            .unwrap();
        assert!((bx - 5.0).abs() < 1e-9);
        assert!((by - (-2.0)).abs() < 1e-9);
        assert!((bz - (-8.0)).abs() < 1e-9);

        let (bx, _, _) = ctx
            .mean_over(t0(), t0() + chrono::Duration::minutes(2))
            .unwrap();
        assert!((bx - 7.0).abs() < 1e-9);
    }

    #[test]
    fn test_mean_over_empty_range_falls_back_to_midpoint() {
        let ctx = minute_record(&[(0.0, 0.0, 0.0), (6.0, -6.0, 12.0)]);
        // A window strictly between the two samples holds no sample at all.
        let start = t0() + chrono::Duration::seconds(20);
        let end = t0() + chrono::Duration::seconds(40);
        let (bx, by, bz) = ctx.mean_over(start, end).unwrap();
        assert!((bx - 3.0).abs() < 1e-9);
        assert!((by - (-3.0)).abs() < 1e-9);
        assert!((bz - 6.0).abs() < 1e-9);
    }
}
