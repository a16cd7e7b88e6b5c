use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::summary::MatchRecord;

/// Writes the concatenated event catalog as CSV, creating the parent
/// directory as needed. Timestamps are RFC 3339, field means in nT.
pub fn write_event_csv(path: &Path, records: &[MatchRecord]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let mut writer = BufWriter::new(File::create(path)?);
    writeln!(writer, "file,start_time,end_time,Bx_mean,By_mean,Bz_mean")?;
    for record in records {
        writeln!(
            writer,
            "{},{},{},{:.2},{:.2},{:.2}",
            record.file.display(),
            record.start_time.to_rfc3339(),
            record.end_time.to_rfc3339(),
            record.bx_mean,
            record.by_mean,
            record.bz_mean
        )?;
    }
    writer.flush()
}

/// Prints the discovered events as an aligned console table.
pub fn print_event_table(records: &[MatchRecord]) {
    if records.is_empty() {
        println!("No events discovered.");
        return;
    }

    println!(
        "{:<25} {:<25} {:>10} {:>8} {:>8} {:>8}  {}",
        "start_time", "end_time", "length[min]", "Bx[nT]", "By[nT]", "Bz[nT]", "file"
    );
    for record in records {
        println!(
            "{:<25} {:<25} {:>10.1} {:>8.2} {:>8.2} {:>8.2}  {}",
            record.start_time.format("%Y-%m-%d %H:%M:%S"),
            record.end_time.format("%Y-%m-%d %H:%M:%S"),
            record.duration_minutes(),
            record.bx_mean,
            record.by_mean,
            record.bz_mean,
            record.file.display()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::path::PathBuf;

    #[test]
    fn test_write_event_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("events.csv");
        let t0 = chrono::Utc.with_ymd_and_hms(2014, 1, 11, 12, 5, 0).unwrap();
        let records = vec![MatchRecord {
            start_time: t0,
            end_time: t0 + chrono::Duration::minutes(5),
            bx_mean: 5.0,
            by_mean: -2.0,
            bz_mean: -8.0,
            file: PathBuf::from("dmsp-f16_2014011.bin"),
        }];

        write_event_csv(&path, &records).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        let mut lines = content.lines();
        assert_eq!(
            lines.next().unwrap(),
            "file,start_time,end_time,Bx_mean,By_mean,Bz_mean"
        );
        let row = lines.next().unwrap();
        assert!(row.starts_with("dmsp-f16_2014011.bin,2014-01-11T12:05:00"));
        assert!(row.ends_with("5.00,-2.00,-8.00"));
        assert!(lines.next().is_none());
    }

    #[test]
    fn test_write_event_csv_empty_catalog_has_header_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.csv");
        write_event_csv(&path, &[]).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 1);
    }
}
