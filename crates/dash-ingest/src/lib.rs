//! Analytics dashboard ingestion.
//!
//! Turns uploaded CSV exports into records and classifies their columns.
//!
//! # Features
//!
//! - **CSV Parsing**: header detection past `#` comment blocks, quote-aware data
//!   lines, tolerant dropping of ragged or comment rows
//! - **Upload Batches**: several files merged under the first file's header
//! - **Column Classification**: numeric vs. dimensional by majority threshold
//!
//! # Example
//!
//! ```ignore
//! use dash_ingest::{SourceFile, classify, parse_batch};
//!
//! let files = vec![SourceFile::new("traffic.csv", text)];
//! let batch = parse_batch(&files);
//! let numeric = classify(&batch.records);
//! ```

mod batch;
mod csv;
mod error;
mod hints;

// === Error Types ===
pub use error::{IngestError, Result};

// === CSV Parsing ===
pub use crate::csv::{CsvTable, HeaderLine, find_header_line, parse_csv, read_source_text};

// === Upload Batches ===
pub use batch::{CSV_MIME, ParsedBatch, SkippedFile, SourceFile, parse_batch, read_sources};

// === Column Classification ===
pub use hints::{
    ClassifyOptions, ColumnHint, DEFAULT_NUMERIC_THRESHOLD, DEFAULT_SAMPLE_SIZE,
    build_column_hints, classify, classify_with,
};
