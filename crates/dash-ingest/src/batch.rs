//! Multi-file upload batches.
//!
//! Files uploaded together are parsed independently and concatenated. The first
//! file with a usable header fixes the batch header; later files with a
//! different header are rejected whole. Nothing here touches a category: the
//! caller commits the finished batch in one step.

use std::path::Path;

use dash_model::Record;

use crate::csv::{parse_csv, read_source_text};
use crate::error::{IngestError, Result};

/// MIME type accepted for uploads.
pub const CSV_MIME: &str = "text/csv";

/// One uploaded file, already read into text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub name: String,
    pub mime: Option<String>,
    pub text: String,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mime: None,
            text: text.into(),
        }
    }

    #[must_use]
    pub fn with_mime(mut self, mime: impl Into<String>) -> Self {
        self.mime = Some(mime.into());
        self
    }

    /// Reads a file from disk. The file name becomes the source name.
    pub fn from_path(path: &Path) -> Result<Self> {
        let text = read_source_text(path)?;
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self::new(name, text))
    }

    /// Accepts `text/csv` or a `.csv` file name.
    pub fn is_csv(&self) -> bool {
        let mime_ok = self
            .mime
            .as_deref()
            .is_some_and(|mime| mime.trim().eq_ignore_ascii_case(CSV_MIME));
        mime_ok || self.name.to_ascii_lowercase().ends_with(".csv")
    }

    /// File name without a trailing `.csv`, used as a default dataset title.
    pub fn title(&self) -> &str {
        let len = self.name.len();
        if len >= 4 && self.name.is_char_boundary(len - 4) {
            let (stem, ext) = self.name.split_at(len - 4);
            if ext.eq_ignore_ascii_case(".csv") {
                return stem;
            }
        }
        &self.name
    }
}

/// A file left out of a batch, with the reason.
#[derive(Debug)]
pub struct SkippedFile {
    pub name: String,
    pub reason: IngestError,
}

/// The validated, concatenated content of an upload batch.
#[derive(Debug, Default)]
pub struct ParsedBatch {
    /// Header of the first successfully parsed file; empty if none parsed.
    pub header: Vec<String>,
    pub records: Vec<Record>,
    /// Names of files whose rows are included, in upload order.
    pub accepted: Vec<String>,
    pub skipped: Vec<SkippedFile>,
}

impl ParsedBatch {
    /// True when at least one file contributed a header.
    pub fn has_content(&self) -> bool {
        !self.header.is_empty()
    }

    /// Title of the first accepted file.
    pub fn first_title<'a>(&self, files: &'a [SourceFile]) -> Option<&'a str> {
        let first = self.accepted.first()?;
        files
            .iter()
            .find(|file| &file.name == first)
            .map(SourceFile::title)
    }

    pub fn header_mismatches(&self) -> impl Iterator<Item = &SkippedFile> {
        self.skipped
            .iter()
            .filter(|file| matches!(file.reason, IngestError::HeaderMismatch { .. }))
    }
}

/// Reads upload files from disk. Files that cannot be read are returned as
/// skipped entries so they show up in the upload summary.
pub fn read_sources<P: AsRef<Path>>(paths: &[P]) -> (Vec<SourceFile>, Vec<SkippedFile>) {
    let mut files = Vec::with_capacity(paths.len());
    let mut skipped = Vec::new();
    for path in paths {
        let path = path.as_ref();
        match SourceFile::from_path(path) {
            Ok(file) => files.push(file),
            Err(reason) => {
                tracing::warn!(path = %path.display(), error = %reason, "could not read upload");
                let name = path
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.display().to_string());
                skipped.push(SkippedFile { name, reason });
            }
        }
    }
    (files, skipped)
}

/// Parses every file of an upload and merges them under one header.
pub fn parse_batch(files: &[SourceFile]) -> ParsedBatch {
    let mut batch = ParsedBatch::default();
    for file in files {
        if !file.is_csv() {
            tracing::warn!(file = %file.name, "skipping non-CSV upload");
            batch.skipped.push(SkippedFile {
                name: file.name.clone(),
                reason: IngestError::NotCsv {
                    name: file.name.clone(),
                },
            });
            continue;
        }
        let table = parse_csv(&file.text);
        if !table.has_header() {
            tracing::warn!(file = %file.name, "skipping upload without header row");
            batch.skipped.push(SkippedFile {
                name: file.name.clone(),
                reason: IngestError::NoHeaderDetected {
                    name: file.name.clone(),
                },
            });
            continue;
        }
        if batch.header.is_empty() {
            batch.header = table.header;
        } else if batch.header != table.header {
            tracing::warn!(
                file = %file.name,
                expected = ?batch.header,
                found = ?table.header,
                "rejecting upload with mismatched header"
            );
            batch.skipped.push(SkippedFile {
                name: file.name.clone(),
                reason: IngestError::HeaderMismatch {
                    name: file.name.clone(),
                    expected: batch.header.clone(),
                    found: table.header,
                },
            });
            continue;
        }
        tracing::debug!(file = %file.name, records = table.records.len(), "accepted upload");
        batch.records.extend(table.records);
        batch.accepted.push(file.name.clone());
    }
    batch
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_csv_by_extension_or_mime() {
        assert!(SourceFile::new("report.CSV", "").is_csv());
        assert!(SourceFile::new("export", "").with_mime("text/csv").is_csv());
        assert!(!SourceFile::new("report.xlsx", "").is_csv());
        assert!(
            !SourceFile::new("report.txt", "")
                .with_mime("text/plain")
                .is_csv()
        );
    }

    #[test]
    fn test_title_strips_extension() {
        assert_eq!(SourceFile::new("Traffic.csv", "").title(), "Traffic");
        assert_eq!(SourceFile::new("Traffic.CSV", "").title(), "Traffic");
        assert_eq!(SourceFile::new("Traffic", "").title(), "Traffic");
        assert_eq!(SourceFile::new(".csv", "").title(), "");
    }

    #[test]
    fn test_first_header_is_authoritative() {
        let files = vec![
            SourceFile::new("a.csv", "A,B\n1,2\n"),
            SourceFile::new("b.csv", "A,B,C\n3,4,5\n"),
            SourceFile::new("c.csv", "A,B\n6,7\n"),
        ];
        let batch = parse_batch(&files);
        assert_eq!(batch.header, vec!["A", "B"]);
        assert_eq!(batch.records.len(), 2);
        assert_eq!(batch.accepted, vec!["a.csv", "c.csv"]);
        assert_eq!(batch.header_mismatches().count(), 1);
        assert_eq!(batch.skipped[0].name, "b.csv");
        assert_eq!(batch.first_title(&files), Some("a"));
    }

    #[test]
    fn test_header_order_matters() {
        let files = vec![
            SourceFile::new("a.csv", "A,B\n1,2\n"),
            SourceFile::new("b.csv", "B,A\n3,4\n"),
        ];
        let batch = parse_batch(&files);
        assert_eq!(batch.records.len(), 1);
        assert_eq!(batch.skipped.len(), 1);
    }

    #[test]
    fn test_unparseable_files_do_not_fix_header() {
        let files = vec![
            SourceFile::new("notes.txt", "A,B\n1,2\n"),
            SourceFile::new("empty.csv", "# nothing here\n"),
            SourceFile::new("b.csv", "X,Y\n1,2\n"),
        ];
        let batch = parse_batch(&files);
        assert_eq!(batch.header, vec!["X", "Y"]);
        assert_eq!(batch.accepted, vec!["b.csv"]);
        assert_eq!(batch.skipped.len(), 2);
        assert!(matches!(batch.skipped[0].reason, IngestError::NotCsv { .. }));
        assert!(matches!(
            batch.skipped[1].reason,
            IngestError::NoHeaderDetected { .. }
        ));
    }

    #[test]
    fn test_unreadable_files_are_reported() {
        let dir = tempfile::tempdir().unwrap();
        let present = dir.path().join("traffic.csv");
        std::fs::write(&present, "Source,Users\ngoogle,4\n").unwrap();
        let missing = dir.path().join("gone.csv");

        let (files, skipped) = read_sources(&[present, missing]);
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].name, "traffic.csv");
        assert_eq!(skipped.len(), 1);
        assert_eq!(skipped[0].name, "gone.csv");
        assert!(matches!(skipped[0].reason, IngestError::FileNotFound { .. }));
    }

    #[test]
    fn test_empty_batch() {
        let batch = parse_batch(&[]);
        assert!(!batch.has_content());
        assert!(batch.records.is_empty());
    }
}
