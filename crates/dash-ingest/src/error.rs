//! Error types for dashboard data ingestion.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while reading upload sources.
///
/// Parsing itself never fails: malformed lines are dropped and a file without a
/// header parses to an empty table. Errors are reserved for I/O and for the
/// per-file reasons reported by [`crate::parse_batch`].
#[derive(Debug, Error)]
pub enum IngestError {
    /// CSV file not found.
    #[error("CSV file not found: {path}")]
    FileNotFound { path: PathBuf },

    /// Failed to read file.
    #[error("failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File is neither `text/csv` nor named `*.csv`.
    #[error("not a CSV file: {name}")]
    NotCsv { name: String },

    /// No line qualified as a header row.
    #[error("could not detect header row in {name}")]
    NoHeaderDetected { name: String },

    /// Header differs from the batch's authoritative header.
    #[error("header of {name} does not match: expected [{}], found [{}]", expected.join(", "), found.join(", "))]
    HeaderMismatch {
        name: String,
        expected: Vec<String>,
        found: Vec<String>,
    },
}

/// Result type for ingestion operations.
pub type Result<T> = std::result::Result<T, IngestError>;
