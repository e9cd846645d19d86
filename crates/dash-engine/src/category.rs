//! One dashboard category: rows plus view preferences.

use std::collections::{BTreeMap, BTreeSet};

use dash_ingest::{ClassifyOptions, ColumnHint, build_column_hints, classify_with};
use dash_model::{CategoryKey, Record, Row, RowId, SortDirection};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::sort::{resort_rows, sort_rows, toggle_direction};
use crate::store::RowStore;

/// Persisted shape of a category.
///
/// This is the layout written to the state store and to JSON exports. Derived
/// data (the numeric column set) is not part of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CategorySnapshot {
    pub dataset_title: String,
    pub columns: Vec<String>,
    pub column_visibility: BTreeMap<String, bool>,
    pub rows: Vec<Row>,
    pub next_row_id: u64,
    pub metric_column: Option<String>,
    pub sort_column: Option<String>,
    pub sort_direction: SortDirection,
    pub include_in_pdf: bool,
    pub notes: String,
}

impl Default for CategorySnapshot {
    fn default() -> Self {
        Self {
            dataset_title: String::new(),
            columns: Vec::new(),
            column_visibility: BTreeMap::new(),
            rows: Vec::new(),
            next_row_id: 0,
            metric_column: None,
            sort_column: None,
            sort_direction: SortDirection::Asc,
            include_in_pdf: true,
            notes: String::new(),
        }
    }
}

/// A category's data and settings.
///
/// Every operation that changes the row set re-runs the classifier, so
/// [`Category::numeric_columns`] always describes the current rows.
#[derive(Debug, Clone, PartialEq)]
pub struct Category {
    key: CategoryKey,
    store: RowStore,
    numeric_columns: BTreeSet<String>,
    metric_column: Option<String>,
    sort_column: Option<String>,
    sort_direction: SortDirection,
    dataset_title: String,
    include_in_pdf: bool,
    notes: String,
    classify: ClassifyOptions,
}

impl Category {
    pub fn new(key: CategoryKey, classify: ClassifyOptions) -> Self {
        Self::from_snapshot(key, CategorySnapshot::default(), classify)
    }

    /// Restores a category from its persisted shape and re-derives the rest.
    pub fn from_snapshot(
        key: CategoryKey,
        snapshot: CategorySnapshot,
        classify: ClassifyOptions,
    ) -> Self {
        let store = RowStore::from_parts(
            snapshot.columns,
            snapshot.column_visibility,
            snapshot.rows,
            snapshot.next_row_id,
        );
        let sort_column = snapshot
            .sort_column
            .filter(|column| store.has_column(column));
        let mut category = Self {
            key,
            store,
            numeric_columns: BTreeSet::new(),
            metric_column: snapshot.metric_column,
            sort_column,
            sort_direction: snapshot.sort_direction,
            dataset_title: snapshot.dataset_title,
            include_in_pdf: snapshot.include_in_pdf,
            notes: snapshot.notes,
            classify,
        };
        category.reclassify();
        category
    }

    pub fn snapshot(&self) -> CategorySnapshot {
        CategorySnapshot {
            dataset_title: self.dataset_title.clone(),
            columns: self.store.columns().to_vec(),
            column_visibility: self.store.column_visibility().clone(),
            rows: self.store.rows().to_vec(),
            next_row_id: self.store.next_row_id(),
            metric_column: self.metric_column.clone(),
            sort_column: self.sort_column.clone(),
            sort_direction: self.sort_direction,
            include_in_pdf: self.include_in_pdf,
            notes: self.notes.clone(),
        }
    }

    pub fn key(&self) -> CategoryKey {
        self.key
    }

    pub fn store(&self) -> &RowStore {
        &self.store
    }

    pub fn columns(&self) -> &[String] {
        self.store.columns()
    }

    pub fn rows(&self) -> &[Row] {
        self.store.rows()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    pub fn numeric_columns(&self) -> &BTreeSet<String> {
        &self.numeric_columns
    }

    pub fn is_numeric(&self, column: &str) -> bool {
        self.numeric_columns.contains(column)
    }

    /// Numeric columns in column order.
    pub fn ordered_numeric_columns(&self) -> Vec<&str> {
        self.columns()
            .iter()
            .filter(|column| self.is_numeric(column))
            .map(String::as_str)
            .collect()
    }

    pub fn visible_columns(&self) -> Vec<&str> {
        self.store.visible_columns()
    }

    /// Per-column classifier evidence for the current rows.
    pub fn column_hints(&self) -> BTreeMap<String, ColumnHint> {
        build_column_hints(self.rows().iter().map(|row| &row.cells), &self.classify)
    }

    pub fn metric_column(&self) -> Option<&str> {
        self.metric_column.as_deref()
    }

    pub fn sort_column(&self) -> Option<&str> {
        self.sort_column.as_deref()
    }

    pub fn sort_direction(&self) -> SortDirection {
        self.sort_direction
    }

    pub fn dataset_title(&self) -> &str {
        &self.dataset_title
    }

    pub fn include_in_pdf(&self) -> bool {
        self.include_in_pdf
    }

    pub fn notes(&self) -> &str {
        &self.notes
    }

    /// Replaces the dataset. Metric and sort state are derived afresh.
    pub(crate) fn replace_rows(
        &mut self,
        header: Vec<String>,
        records: Vec<Record>,
        title: Option<&str>,
    ) -> usize {
        let added = self.store.replace_all(header, records);
        self.metric_column = None;
        self.sort_column = None;
        self.sort_direction = SortDirection::Asc;
        if let Some(title) = title {
            self.dataset_title = title.to_string();
        }
        self.reclassify();
        added
    }

    /// Appends rows under the current header.
    pub(crate) fn append_rows(
        &mut self,
        header: &[String],
        records: Vec<Record>,
        title: Option<&str>,
    ) -> Result<usize> {
        let added = self
            .store
            .append(header, records)
            .map_err(|mismatch| EngineError::HeaderMismatch {
                category: self.key,
                expected: mismatch.expected,
                found: mismatch.found,
            })?;
        if self.dataset_title.is_empty()
            && let Some(title) = title
        {
            self.dataset_title = title.to_string();
        }
        self.reclassify();
        if let Some(column) = self.sort_column.clone() {
            let numeric = self.is_numeric(&column);
            resort_rows(self.store.rows_mut(), &column, numeric, self.sort_direction);
        }
        Ok(added)
    }

    pub(crate) fn remove_row(&mut self, id: RowId) -> bool {
        let removed = self.store.remove(id);
        if removed {
            self.reclassify();
        }
        removed
    }

    pub(crate) fn set_row_selected(&mut self, id: RowId, selected: bool) -> bool {
        self.store.set_selected(id, selected)
    }

    pub(crate) fn set_all_selected(&mut self, selected: bool) {
        self.store.set_all_selected(selected);
    }

    /// Empties the category. Title, notes and the export flag are kept.
    pub(crate) fn clear(&mut self) {
        self.store.clear();
        self.metric_column = None;
        self.sort_column = None;
        self.sort_direction = SortDirection::Asc;
        self.reclassify();
    }

    /// Sorts by `column`, toggling direction when it is already the sort column.
    pub(crate) fn sort_by(&mut self, column: &str) -> Result<SortDirection> {
        self.require_column(column)?;
        let direction = toggle_direction(self.sort_column(), self.sort_direction, column);
        let numeric = self.is_numeric(column);
        sort_rows(self.store.rows_mut(), column, numeric, direction);
        self.sort_column = Some(column.to_string());
        self.sort_direction = direction;
        tracing::debug!(category = %self.key, column, %direction, numeric, "sorted rows");
        Ok(direction)
    }

    pub(crate) fn set_metric_column(&mut self, column: Option<&str>) -> Result<()> {
        if let Some(column) = column {
            self.require_column(column)?;
            if !self.is_numeric(column) {
                return Err(EngineError::NotNumeric {
                    category: self.key,
                    column: column.to_string(),
                });
            }
        }
        self.metric_column = column.map(str::to_string);
        Ok(())
    }

    pub(crate) fn set_column_visible(&mut self, column: &str, visible: bool) -> Result<()> {
        self.require_column(column)?;
        self.store.set_visible(column, visible);
        Ok(())
    }

    pub(crate) fn set_dataset_title(&mut self, title: &str) {
        self.dataset_title = title.to_string();
    }

    pub(crate) fn set_notes(&mut self, notes: &str) {
        self.notes = notes.to_string();
    }

    pub(crate) fn set_include_in_pdf(&mut self, include: bool) {
        self.include_in_pdf = include;
    }

    fn require_column(&self, column: &str) -> Result<()> {
        if self.store.has_column(column) {
            Ok(())
        } else {
            Err(EngineError::UnknownColumn {
                category: self.key,
                column: column.to_string(),
            })
        }
    }

    /// Re-runs the classifier and re-validates the metric column.
    ///
    /// A metric column that is no longer numeric, or an unset one, falls back to
    /// the first numeric column in column order.
    fn reclassify(&mut self) {
        self.numeric_columns =
            classify_with(self.store.rows().iter().map(|row| &row.cells), &self.classify);
        let still_valid = self
            .metric_column
            .as_deref()
            .is_some_and(|column| self.numeric_columns.contains(column));
        if !still_valid {
            let fallback = self.ordered_numeric_columns().first().map(|c| c.to_string());
            if self.metric_column.is_some() && fallback != self.metric_column {
                tracing::debug!(
                    category = %self.key,
                    previous = ?self.metric_column,
                    replacement = ?fallback,
                    "metric column no longer numeric"
                );
            }
            self.metric_column = fallback;
        }
    }
}
