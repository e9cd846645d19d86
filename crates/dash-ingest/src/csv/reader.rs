//! CSV text and file reading.

use std::path::Path;

use ::csv::ReaderBuilder;
use dash_model::Record;

use crate::error::{IngestError, Result};

use super::header::find_header_line;

/// Parsed CSV content: authoritative header plus one record per kept line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CsvTable {
    pub header: Vec<String>,
    pub records: Vec<Record>,
}

impl CsvTable {
    /// True when no header line was found.
    pub fn has_header(&self) -> bool {
        !self.header.is_empty()
    }
}

/// Parses CSV text into a header and records.
///
/// Leading blank and `#` lines are skipped while looking for the header. Data
/// lines are kept only if they have exactly as many fields as the header, at
/// least one non-empty field, and a first field that is not a `#` comment.
/// Everything else is dropped without error. Text without a usable header
/// yields an empty table.
pub fn parse_csv(text: &str) -> CsvTable {
    let Some(header_line) = find_header_line(text) else {
        tracing::debug!("no header row found");
        return CsvTable::default();
    };
    let header = header_line.columns;
    let data = &text[header_line.data_offset..];

    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(data.as_bytes());

    let mut records = Vec::new();
    let mut dropped = 0usize;
    for result in reader.records() {
        let record = match result {
            Ok(record) => record,
            Err(error) => {
                tracing::debug!(%error, "dropping unreadable CSV record");
                dropped += 1;
                continue;
            }
        };
        let fields: Vec<String> = record.iter().map(|field| field.trim().to_string()).collect();
        if !is_data_line(&fields, header.len()) {
            dropped += 1;
            continue;
        }
        records.push(Record::from_fields(&header, &fields));
    }

    tracing::debug!(
        header_line = header_line.line_number,
        columns = header.len(),
        records = records.len(),
        dropped,
        "parsed CSV text"
    );
    CsvTable { header, records }
}

fn is_data_line(fields: &[String], expected: usize) -> bool {
    if fields.len() != expected {
        return false;
    }
    if fields.iter().all(String::is_empty) {
        return false;
    }
    !fields.first().is_some_and(|first| first.starts_with('#'))
}

/// Reads a file into text, honouring UTF-8 and UTF-16 byte order marks.
///
/// Analytics tools export UTF-16 from some locales; invalid sequences are
/// replaced instead of failing the upload.
pub fn read_source_text(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            IngestError::FileNotFound {
                path: path.to_path_buf(),
            }
        } else {
            IngestError::FileRead {
                path: path.to_path_buf(),
                source: e,
            }
        }
    })?;
    let (text, encoding, had_errors) = encoding_rs::UTF_8.decode(&bytes);
    if had_errors {
        tracing::warn!(
            path = %path.display(),
            encoding = encoding.name(),
            "replaced malformed byte sequences while decoding"
        );
    }
    Ok(text.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_csv(content: &[u8]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content).unwrap();
        file
    }

    #[test]
    fn test_parse_drops_comment_and_ragged_lines() {
        let table = parse_csv("A,B\n1,2\n# note,x\n3\n,\n4,5,6\n7,8\n");
        assert_eq!(table.header, vec!["A", "B"]);
        assert_eq!(table.records.len(), 2);
        assert_eq!(table.records[0].get("A"), "1");
        assert_eq!(table.records[1].get("B"), "8");
    }

    #[test]
    fn test_parse_quoted_fields_with_newlines() {
        let table = parse_csv("Page,Views\n\"/a, b\",1\n\"multi\nline\",\"2\"\n");
        assert_eq!(table.records.len(), 2);
        assert_eq!(table.records[0].get("Page"), "/a, b");
        assert_eq!(table.records[1].get("Page"), "multi\nline");
        assert_eq!(table.records[1].get("Views"), "2");
    }

    #[test]
    fn test_parse_trims_cells() {
        let table = parse_csv("A,B\n  x , 1 \n");
        assert_eq!(table.records[0].get("A"), "x");
        assert_eq!(table.records[0].get("B"), "1");
    }

    #[test]
    fn test_parse_without_header() {
        let table = parse_csv("# only comments\n\n");
        assert!(!table.has_header());
        assert!(table.records.is_empty());
    }

    #[test]
    fn test_read_source_text_with_utf8_bom() {
        let file = create_temp_csv("\u{feff}A,B\n1,2\n".as_bytes());
        let text = read_source_text(file.path()).unwrap();
        assert!(text.starts_with("A,B"));
    }

    #[test]
    fn test_read_source_text_utf16le() {
        let mut bytes = vec![0xFF, 0xFE];
        for unit in "A,B\n".encode_utf16() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        let file = create_temp_csv(&bytes);
        let text = read_source_text(file.path()).unwrap();
        assert_eq!(text, "A,B\n");
    }

    #[test]
    fn test_read_source_text_missing_file() {
        let result = read_source_text(Path::new("/definitely/not/here.csv"));
        assert!(matches!(result, Err(IngestError::FileNotFound { .. })));
    }
}
