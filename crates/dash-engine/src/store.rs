//! Per-category row storage.

use std::collections::BTreeMap;

use dash_model::{Record, Row, RowId};

/// Authoritative rows of one category together with its column layout.
///
/// Row ids come from a counter that survives deletions and clears, so ids are
/// unique for the lifetime of the category.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowStore {
    columns: Vec<String>,
    column_visibility: BTreeMap<String, bool>,
    rows: Vec<Row>,
    next_row_id: u64,
}

/// Result of [`RowStore::append`] when the header does not fit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderMismatch {
    pub expected: Vec<String>,
    pub found: Vec<String>,
}

impl RowStore {
    /// Rebuilds a store from persisted parts, repairing broken invariants.
    ///
    /// Visibility entries for unknown columns are dropped, missing ones default
    /// to visible, duplicate row ids keep their first occurrence, and records are
    /// re-keyed to exactly the store's columns.
    pub fn from_parts(
        columns: Vec<String>,
        column_visibility: BTreeMap<String, bool>,
        rows: Vec<Row>,
        next_row_id: u64,
    ) -> Self {
        let column_visibility = columns
            .iter()
            .map(|column| {
                let visible = column_visibility.get(column).copied().unwrap_or(true);
                (column.clone(), visible)
            })
            .collect();
        let mut seen = std::collections::BTreeSet::new();
        let mut repaired = Vec::with_capacity(rows.len());
        for row in rows {
            if !seen.insert(row.id) {
                tracing::warn!(row = %row.id, "dropping row with duplicate id");
                continue;
            }
            let fields: Vec<String> = columns
                .iter()
                .map(|column| row.cells.get(column).to_string())
                .collect();
            repaired.push(Row {
                id: row.id,
                selected: row.selected,
                cells: Record::from_fields(&columns, &fields),
            });
        }
        let max_id = repaired.iter().map(|row| row.id.get() + 1).max().unwrap_or(0);
        Self {
            columns,
            column_visibility,
            rows: repaired,
            next_row_id: next_row_id.max(max_id),
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn column_visibility(&self) -> &BTreeMap<String, bool> {
        &self.column_visibility
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub(crate) fn rows_mut(&mut self) -> &mut Vec<Row> {
        &mut self.rows
    }

    pub fn next_row_id(&self) -> u64 {
        self.next_row_id
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// True when no header has been adopted yet.
    pub fn has_columns(&self) -> bool {
        !self.columns.is_empty()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    pub fn is_visible(&self, column: &str) -> bool {
        self.column_visibility.get(column).copied().unwrap_or(false)
    }

    /// Visible columns in column order.
    pub fn visible_columns(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|column| self.is_visible(column))
            .map(String::as_str)
            .collect()
    }

    pub fn get(&self, id: RowId) -> Option<&Row> {
        self.rows.iter().find(|row| row.id == id)
    }

    /// Replaces rows, columns and visibility with a new dataset.
    pub fn replace_all(&mut self, header: Vec<String>, records: Vec<Record>) -> usize {
        self.rows.clear();
        self.column_visibility = header.iter().map(|column| (column.clone(), true)).collect();
        self.columns = header;
        self.push_records(records)
    }

    /// Appends records whose header equals the current columns.
    ///
    /// An empty store adopts `header`. Otherwise the whole batch is refused when
    /// the header differs in names or order, and nothing changes.
    pub fn append(
        &mut self,
        header: &[String],
        records: Vec<Record>,
    ) -> Result<usize, HeaderMismatch> {
        if !self.has_columns() {
            return Ok(self.replace_all(header.to_vec(), records));
        }
        if self.columns != header {
            return Err(HeaderMismatch {
                expected: self.columns.clone(),
                found: header.to_vec(),
            });
        }
        Ok(self.push_records(records))
    }

    fn push_records(&mut self, records: Vec<Record>) -> usize {
        let added = records.len();
        self.rows.reserve(added);
        for record in records {
            let id = RowId::new(self.next_row_id);
            self.next_row_id += 1;
            self.rows.push(Row::new(id, record));
        }
        added
    }

    /// Removes one row. Returns false when the id is unknown.
    pub fn remove(&mut self, id: RowId) -> bool {
        let Some(idx) = self.rows.iter().position(|row| row.id == id) else {
            return false;
        };
        self.rows.remove(idx);
        true
    }

    /// Sets a row's selection flag. Returns false when the id is unknown.
    pub fn set_selected(&mut self, id: RowId, selected: bool) -> bool {
        match self.rows.iter_mut().find(|row| row.id == id) {
            Some(row) => {
                row.selected = selected;
                true
            }
            None => false,
        }
    }

    /// Sets every row's selection flag.
    pub fn set_all_selected(&mut self, selected: bool) {
        for row in &mut self.rows {
            row.selected = selected;
        }
    }

    /// Shows or hides a known column. Returns false when the column is unknown.
    pub fn set_visible(&mut self, column: &str, visible: bool) -> bool {
        match self.column_visibility.get_mut(column) {
            Some(flag) => {
                *flag = visible;
                true
            }
            None => false,
        }
    }

    /// Drops rows, columns and visibility. The id counter keeps counting.
    pub fn clear(&mut self) {
        self.rows.clear();
        self.columns.clear();
        self.column_visibility.clear();
    }
}
