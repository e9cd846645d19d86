//! Totals over selected rows.

use std::collections::BTreeSet;

use dash_model::{Row, metric_or_zero, parse_metric};

use crate::format::{NumberLocale, format_number};

/// Decides whether a column is averaged rather than summed, by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AverageRule {
    indicators: Vec<String>,
}

impl AverageRule {
    pub fn new<S: AsRef<str>>(indicators: &[S]) -> Self {
        Self {
            indicators: indicators
                .iter()
                .map(|indicator| indicator.as_ref().to_lowercase())
                .filter(|indicator| !indicator.is_empty())
                .collect(),
        }
    }

    pub fn is_average(&self, column: &str) -> bool {
        let lower = column.to_lowercase();
        self.indicators
            .iter()
            .any(|indicator| lower.contains(indicator.as_str()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateKind {
    Sum,
    Mean,
}

/// One cell of the totals row.
#[derive(Debug, Clone, PartialEq)]
pub enum TotalCell {
    /// The leading marker in the first visible column.
    Label(String),
    /// Exact aggregate of a numeric column.
    Value { value: f64, kind: AggregateKind },
    Empty,
}

impl TotalCell {
    pub fn value(&self) -> Option<f64> {
        match self {
            Self::Value { value, .. } => Some(*value),
            _ => None,
        }
    }

    /// Display text; numbers are rounded here and nowhere else.
    pub fn display(&self, locale: NumberLocale) -> String {
        match self {
            Self::Label(label) => label.clone(),
            Self::Value { value, .. } => format_number(*value, locale),
            Self::Empty => String::new(),
        }
    }
}

/// Totals row keyed by visible column, in display order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Totals {
    cells: Vec<(String, TotalCell)>,
}

impl Totals {
    pub fn get(&self, column: &str) -> Option<&TotalCell> {
        self.cells
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, cell)| cell)
    }

    pub fn value(&self, column: &str) -> Option<f64> {
        self.get(column).and_then(TotalCell::value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &TotalCell)> {
        self.cells.iter().map(|(name, cell)| (name.as_str(), cell))
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn display(&self, locale: NumberLocale) -> Vec<String> {
        self.cells
            .iter()
            .map(|(_, cell)| cell.display(locale))
            .collect()
    }
}

/// Computes the totals row over the visible columns.
///
/// Only selected rows contribute. Numeric columns are summed, or averaged when
/// `rule` matches the column name; a mean over no numeric cells is empty.
/// Dimensional columns are empty except the first visible column, which carries
/// `label`.
pub fn compute_totals<S: AsRef<str>>(
    rows: &[Row],
    visible_columns: &[S],
    numeric_columns: &BTreeSet<String>,
    rule: &AverageRule,
    label: &str,
) -> Totals {
    let selected: Vec<&Row> = rows.iter().filter(|row| row.selected).collect();
    let cells = visible_columns
        .iter()
        .enumerate()
        .map(|(idx, column)| {
            let column = column.as_ref();
            let cell = if numeric_columns.contains(column) {
                aggregate_column(&selected, column, rule.is_average(column))
            } else if idx == 0 {
                TotalCell::Label(label.to_string())
            } else {
                TotalCell::Empty
            };
            (column.to_string(), cell)
        })
        .collect();
    Totals { cells }
}

fn aggregate_column(rows: &[&Row], column: &str, average: bool) -> TotalCell {
    if average {
        let values: Vec<f64> = rows
            .iter()
            .filter_map(|row| parse_metric(row.value(column)))
            .collect();
        if values.is_empty() {
            return TotalCell::Empty;
        }
        TotalCell::Value {
            value: values.iter().sum::<f64>() / values.len() as f64,
            kind: AggregateKind::Mean,
        }
    } else {
        TotalCell::Value {
            value: rows.iter().map(|row| metric_or_zero(row.value(column))).sum(),
            kind: AggregateKind::Sum,
        }
    }
}
