//! Header row detection for analytics exports.
//!
//! Exports from analytics tools start with a block of `#` comment lines
//! (property name, date range) before the real header. The header is the first
//! line that is not blank, not a comment, and contains a delimiter.

use ::csv::{ReaderBuilder, StringRecord};

/// Location of the detected header within the source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderLine {
    /// Normalized, de-duplicated column names.
    pub columns: Vec<String>,
    /// Byte offset where the data block starts (just past the header's newline).
    pub data_offset: usize,
    /// 1-based line number of the header.
    pub line_number: usize,
}

/// Finds the header line and returns its columns plus the data offset.
pub fn find_header_line(text: &str) -> Option<HeaderLine> {
    let mut offset = 0usize;
    for (idx, raw_line) in text.split_inclusive('\n').enumerate() {
        let line_start = offset;
        offset += raw_line.len();
        let line = raw_line.trim_end_matches(['\n', '\r']);
        let line = if line_start == 0 {
            line.strip_prefix('\u{feff}').unwrap_or(line)
        } else {
            line
        };
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') || !trimmed.contains(',') {
            continue;
        }
        let fields = header_fields(line);
        if fields.is_empty() {
            continue;
        }
        return Some(HeaderLine {
            columns: dedupe_columns(fields),
            data_offset: offset,
            line_number: idx + 1,
        });
    }
    None
}

/// Splits the header line with the same CSV reader used for data lines.
///
/// Cells are trimmed, then one pair of surrounding quotes is removed, so a
/// padded `"Views"` still yields `Views`.
fn header_fields(line: &str) -> Vec<String> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(line.as_bytes());
    let mut record = StringRecord::new();
    match reader.read_record(&mut record) {
        Ok(true) => record.iter().map(clean_header_cell).collect(),
        Ok(false) => Vec::new(),
        Err(error) => {
            tracing::debug!(%error, "unreadable header candidate");
            Vec::new()
        }
    }
}

fn clean_header_cell(cell: &str) -> String {
    let cell = cell.trim();
    cell.strip_prefix('"')
        .and_then(|inner| inner.strip_suffix('"'))
        .unwrap_or(cell)
        .trim()
        .to_string()
}

/// Makes repeated column names unique (`Name`, `Name_1`, `Name_2`) so every
/// column maps to exactly one record key.
fn dedupe_columns(columns: Vec<String>) -> Vec<String> {
    let mut seen: Vec<String> = Vec::with_capacity(columns.len());
    for column in columns {
        let mut candidate = column.clone();
        let mut suffix = 1usize;
        while seen.contains(&candidate) {
            candidate = format!("{column}_{suffix}");
            suffix += 1;
        }
        seen.push(candidate);
    }
    seen
}
