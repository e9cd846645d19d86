#![deny(unsafe_code)]

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::{ModelError, RowId};

/// One parsed CSV line: column name to trimmed cell text.
///
/// Cells stay strings. Numeric interpretation happens where it is needed through
/// [`crate::parse_metric`].
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct Record(BTreeMap<String, String>);

impl Record {
    /// Zips a header with a line's fields. Missing fields become empty strings.
    pub fn from_fields(header: &[String], fields: &[String]) -> Self {
        let cells = header
            .iter()
            .enumerate()
            .map(|(idx, column)| {
                let value = fields.get(idx).map(|v| v.trim()).unwrap_or("");
                (column.clone(), value.to_string())
            })
            .collect();
        Self(cells)
    }

    /// Cell value for `column`, empty when the column is absent.
    pub fn get(&self, column: &str) -> &str {
        self.0.get(column).map(String::as_str).unwrap_or("")
    }

    pub fn contains_column(&self, column: &str) -> bool {
        self.0.contains_key(column)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, String)> for Record {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// A record held by a category, with identity and a selection flag.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Row {
    pub id: RowId,
    #[serde(default = "default_selected")]
    pub selected: bool,
    pub cells: Record,
}

fn default_selected() -> bool {
    true
}

impl Row {
    pub fn new(id: RowId, cells: Record) -> Self {
        Self {
            id,
            selected: true,
            cells,
        }
    }

    pub fn value(&self, column: &str) -> &str {
        self.cells.get(column)
    }
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn flipped(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortDirection {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(Self::Asc),
            "desc" | "descending" => Ok(Self::Desc),
            _ => Err(ModelError::InvalidSortDirection(s.to_string())),
        }
    }
}
