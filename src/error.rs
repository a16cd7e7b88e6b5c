use std::fmt;
use std::io;
use std::path::PathBuf;

use chrono::{DateTime, Utc};

#[derive(Debug)]
pub enum SearchError {
    Io(io::Error),
    /// The file could not be parsed as the expected format.
    Malformed { path: PathBuf, reason: String },
    /// A timestamp fell outside the loaded field record.
    OutOfRange {
        t: DateTime<Utc>,
        span: (DateTime<Utc>, DateTime<Utc>),
    },
    /// The merged field record is unusable (empty, unsorted, duplicates).
    BadFieldRecord(String),
}

impl fmt::Display for SearchError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SearchError::Io(err) => write!(f, "IO error: {}", err),
            SearchError::Malformed { path, reason } => {
                write!(f, "malformed file {}: {}", path.display(), reason)
            }
            SearchError::OutOfRange { t, span } => write!(
                f,
                "time {} outside field record span {} - {}",
                t.to_rfc3339(),
                span.0.to_rfc3339(),
                span.1.to_rfc3339()
            ),
            SearchError::BadFieldRecord(reason) => {
                write!(f, "bad field record: {}", reason)
            }
        }
    }
}

impl std::error::Error for SearchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SearchError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for SearchError {
    fn from(err: io::Error) -> SearchError {
        SearchError::Io(err)
    }
}
