//! Derived, read-only view of a category.

use std::collections::BTreeSet;

use dash_model::{CategoryKey, Row, SortDirection, metric_or_zero};
use serde::Serialize;

use crate::aggregate::{AverageRule, Totals, compute_totals};
use crate::category::Category;

/// Label and series data for the metric chart.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChartData {
    pub metric: Option<String>,
    pub labels: Vec<String>,
    pub values: Vec<f64>,
}

impl ChartData {
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Builds the chart series for `metric` over the selected rows.
///
/// Labels come from the first visible dimensional column, or the 1-based row
/// position when every visible column is numeric. Values that do not parse
/// plot as zero.
pub fn chart_data(
    rows: &[Row],
    visible_columns: &[&str],
    numeric_columns: &BTreeSet<String>,
    metric: Option<&str>,
) -> ChartData {
    let Some(metric) = metric else {
        return ChartData::default();
    };
    let label_column = visible_columns
        .iter()
        .find(|column| !numeric_columns.contains(**column));
    let (labels, values) = rows
        .iter()
        .enumerate()
        .filter(|(_, row)| row.selected)
        .map(|(idx, row)| {
            let label = match label_column {
                Some(column) => row.value(column).to_string(),
                None => (idx + 1).to_string(),
            };
            (label, metric_or_zero(row.value(metric)))
        })
        .unzip();
    ChartData {
        metric: Some(metric.to_string()),
        labels,
        values,
    }
}

/// Everything a presentation layer needs to draw one category.
///
/// Built fresh from the category on every call and never cached.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryView {
    pub key: CategoryKey,
    pub title: String,
    pub visible_columns: Vec<String>,
    pub numeric_columns: BTreeSet<String>,
    pub rows: Vec<Row>,
    pub totals: Totals,
    pub metric_column: Option<String>,
    pub sort: Option<(String, SortDirection)>,
    pub chart: ChartData,
    pub include_in_pdf: bool,
    pub notes: String,
}

impl CategoryView {
    pub fn build(category: &Category, rule: &AverageRule, total_label: &str) -> Self {
        let visible = category.visible_columns();
        let numeric = category.numeric_columns();
        let totals = compute_totals(category.rows(), &visible, numeric, rule, total_label);
        let chart = chart_data(category.rows(), &visible, numeric, category.metric_column());
        Self {
            key: category.key(),
            title: category.dataset_title().to_string(),
            visible_columns: visible.iter().map(|column| column.to_string()).collect(),
            numeric_columns: numeric.clone(),
            rows: category.rows().to_vec(),
            totals,
            metric_column: category.metric_column().map(str::to_string),
            sort: category
                .sort_column()
                .map(|column| (column.to_string(), category.sort_direction())),
            chart,
            include_in_pdf: category.include_in_pdf(),
            notes: category.notes().to_string(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn selected_count(&self) -> usize {
        self.rows.iter().filter(|row| row.selected).count()
    }

    pub fn is_numeric(&self, column: &str) -> bool {
        self.numeric_columns.contains(column)
    }

    /// Cell values of `row` in visible column order.
    pub fn cells<'a>(&'a self, row: &'a Row) -> impl Iterator<Item = &'a str> + 'a {
        self.visible_columns
            .iter()
            .map(move |column| row.value(column))
    }
}
