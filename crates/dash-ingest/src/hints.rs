//! Column hints and numeric classification.

use std::collections::{BTreeMap, BTreeSet};

use dash_model::{Record, parse_metric};

/// Number of leading records inspected by the classifier.
pub const DEFAULT_SAMPLE_SIZE: usize = 100;

/// Share of numeric cells a column must exceed to count as numeric.
pub const DEFAULT_NUMERIC_THRESHOLD: f64 = 0.7;

/// Classifier tuning.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ClassifyOptions {
    pub sample_size: usize,
    pub numeric_threshold: f64,
}

impl Default for ClassifyOptions {
    fn default() -> Self {
        Self {
            sample_size: DEFAULT_SAMPLE_SIZE,
            numeric_threshold: DEFAULT_NUMERIC_THRESHOLD,
        }
    }
}

/// Cell counts for one column over the sampled records.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ColumnHint {
    pub numeric: usize,
    pub text: usize,
    pub empty: usize,
    pub is_numeric: bool,
}

impl ColumnHint {
    /// Numeric share of the non-empty cells, or 0 with no evidence.
    pub fn numeric_ratio(&self) -> f64 {
        let non_empty = self.numeric + self.text;
        if non_empty == 0 {
            0.0
        } else {
            self.numeric as f64 / non_empty as f64
        }
    }
}

/// Builds column hints from the leading sample of records.
///
/// Columns are those of the first sampled record. Empty cells count toward
/// neither side of the ratio.
pub fn build_column_hints<'a>(
    records: impl IntoIterator<Item = &'a Record>,
    options: &ClassifyOptions,
) -> BTreeMap<String, ColumnHint> {
    let sample: Vec<&Record> = records.into_iter().take(options.sample_size).collect();
    let Some(first) = sample.first() else {
        return BTreeMap::new();
    };

    let mut hints = BTreeMap::new();
    for column in first.columns() {
        let mut hint = ColumnHint::default();
        for record in &sample {
            let value = record.get(column);
            if value.trim().is_empty() {
                hint.empty += 1;
            } else if parse_metric(value).is_some() {
                hint.numeric += 1;
            } else {
                hint.text += 1;
            }
        }
        hint.is_numeric = hint.numeric > 0 && hint.numeric_ratio() > options.numeric_threshold;
        hints.insert(column.to_string(), hint);
    }
    hints
}

/// Returns the numeric columns of `records` with default options.
pub fn classify<'a>(records: impl IntoIterator<Item = &'a Record>) -> BTreeSet<String> {
    classify_with(records, &ClassifyOptions::default())
}

/// Returns the numeric columns of `records`.
pub fn classify_with<'a>(
    records: impl IntoIterator<Item = &'a Record>,
    options: &ClassifyOptions,
) -> BTreeSet<String> {
    build_column_hints(records, options)
        .into_iter()
        .filter(|(_, hint)| hint.is_numeric)
        .map(|(column, _)| column)
        .collect()
}
