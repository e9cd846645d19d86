//! CSV reading utilities.

mod header;
mod reader;

pub use header::{HeaderLine, find_header_line};
pub use reader::{CsvTable, parse_csv, read_source_text};
