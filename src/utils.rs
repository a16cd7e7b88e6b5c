use chrono::{DateTime, Utc};

/// Elapsed seconds from `a` to `b`, sub-second resolution.
pub fn seconds_between(a: DateTime<Utc>, b: DateTime<Utc>) -> f64 {
    (b - a).num_milliseconds() as f64 / 1000.0
}

/// Unix seconds (fractional) to a UTC timestamp.
pub fn datetime_from_unix_seconds(ts: f64) -> Option<DateTime<Utc>> {
    if !ts.is_finite() {
        return None;
    }
    let secs = ts.floor();
    let nanos = ((ts - secs) * 1e9).round() as u32;
    DateTime::from_timestamp(secs as i64, nanos.min(999_999_999))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_seconds_between() {
        let a = Utc.with_ymd_and_hms(2014, 1, 11, 0, 0, 0).unwrap();
        let b = Utc.with_ymd_and_hms(2014, 1, 11, 0, 5, 30).unwrap();
        assert!((seconds_between(a, b) - 330.0).abs() < 1e-9);
        assert!((seconds_between(b, a) + 330.0).abs() < 1e-9);
    }

    #[test]
    fn test_datetime_from_unix_seconds() {
        let t = datetime_from_unix_seconds(1_389_398_400.5).unwrap();
        assert_eq!(t.timestamp(), 1_389_398_400);
        assert_eq!(t.timestamp_subsec_millis(), 500);
        assert!(datetime_from_unix_seconds(f64::NAN).is_none());
    }
}
