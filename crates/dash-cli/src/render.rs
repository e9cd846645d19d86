//! Terminal rendering of dashboard views, uploads and reports.

use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::{ASCII_FULL_CONDENSED, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use dash_engine::{
    Block, Category, CategoryView, ChartData, Dashboard, IngestReport, NumberLocale, Report,
    TotalCell, format_number,
};
use dash_model::{SortDirection, parse_metric};

/// Width of the longest chart bar, in characters.
const BAR_WIDTH: usize = 40;

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(160);
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

/// Column header with sort and type markers.
fn column_label(view: &CategoryView, column: &str) -> String {
    let mut label = column.to_string();
    if view.is_numeric(column) {
        label.push_str(" #");
    }
    if let Some((sorted, direction)) = &view.sort
        && sorted == column
    {
        label.push_str(match direction {
            SortDirection::Asc => " ▲",
            SortDirection::Desc => " ▼",
        });
    }
    label
}

/// The category's rows with a trailing totals line.
pub fn category_table(view: &CategoryView, locale: NumberLocale) -> Table {
    let mut table = Table::new();
    let mut header = vec![header_cell("Row"), header_cell("Sel")];
    header.extend(
        view.visible_columns
            .iter()
            .map(|column| header_cell(&column_label(view, column))),
    );
    table.set_header(header);
    apply_table_style(&mut table);
    align_column(&mut table, 0, CellAlignment::Right);
    align_column(&mut table, 1, CellAlignment::Center);
    for (idx, column) in view.visible_columns.iter().enumerate() {
        if view.is_numeric(column) {
            align_column(&mut table, idx + 2, CellAlignment::Right);
        }
    }

    for row in &view.rows {
        let mut cells = vec![
            Cell::new(row.id),
            if row.selected {
                Cell::new("✓").fg(Color::Green)
            } else {
                dim_cell("-")
            },
        ];
        cells.extend(view.cells(row).map(|value| {
            if row.selected {
                Cell::new(value)
            } else {
                dim_cell(value)
            }
        }));
        table.add_row(cells);
    }

    let mut totals = vec![Cell::new(""), Cell::new("")];
    totals.extend(view.totals.iter().map(|(_, cell)| {
        let text = cell.display(locale);
        match cell {
            TotalCell::Label(_) => Cell::new(text)
                .fg(Color::Cyan)
                .add_attribute(Attribute::Bold),
            TotalCell::Value { .. } => Cell::new(text).add_attribute(Attribute::Bold),
            TotalCell::Empty => Cell::new(text),
        }
    }));
    table.add_row(totals);
    table
}

/// Horizontal bar chart of the metric series.
pub fn render_chart(chart: &ChartData, locale: NumberLocale) -> String {
    let Some(metric) = &chart.metric else {
        return "No metric column selected.\n".to_string();
    };
    if chart.is_empty() {
        return format!("{metric}: no selected rows.\n");
    }
    let label_width = chart
        .labels
        .iter()
        .map(|label| label.chars().count())
        .max()
        .unwrap_or(0);
    let peak = chart
        .values
        .iter()
        .fold(0.0_f64, |peak, value| peak.max(value.abs()));
    let mut out = format!("{metric}\n");
    for (label, value) in chart.labels.iter().zip(&chart.values) {
        let bar = if peak > 0.0 {
            ((value.abs() / peak) * BAR_WIDTH as f64).round() as usize
        } else {
            0
        };
        out.push_str(&format!(
            "{label:<label_width$} | {} {}\n",
            "#".repeat(bar),
            format_number(*value, locale)
        ));
    }
    out
}

/// One line per category.
pub fn categories_table(dashboard: &Dashboard) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Category"),
        header_cell("Title"),
        header_cell("Rows"),
        header_cell("Selected"),
        header_cell("Columns"),
        header_cell("Metric"),
        header_cell("Report"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 2, CellAlignment::Right);
    align_column(&mut table, 3, CellAlignment::Right);
    align_column(&mut table, 4, CellAlignment::Right);
    align_column(&mut table, 6, CellAlignment::Center);
    for category in dashboard.categories() {
        let rows = category.rows();
        table.add_row(vec![
            Cell::new(category.key())
                .fg(Color::Blue)
                .add_attribute(Attribute::Bold),
            text_or_dash(category.dataset_title()),
            Cell::new(rows.len()),
            Cell::new(rows.iter().filter(|row| row.selected).count()),
            Cell::new(category.columns().len()),
            text_or_dash(category.metric_column().unwrap_or("")),
            if category.include_in_pdf() {
                Cell::new("✓").fg(Color::Green)
            } else {
                dim_cell("-")
            },
        ]);
    }
    table
}

/// Classifier evidence for each column.
pub fn column_hints_table(category: &Category) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Column"),
        header_cell("Numeric"),
        header_cell("Text"),
        header_cell("Empty"),
        header_cell("Ratio"),
        header_cell("Kind"),
        header_cell("Visible"),
    ]);
    apply_table_style(&mut table);
    for idx in 1..5 {
        align_column(&mut table, idx, CellAlignment::Right);
    }
    let hints = category.column_hints();
    for column in category.columns() {
        let hint = hints.get(column).copied().unwrap_or_default();
        let kind = if category.is_numeric(column) {
            Cell::new("numeric").fg(Color::Green)
        } else {
            Cell::new("dimension")
        };
        table.add_row(vec![
            Cell::new(column),
            Cell::new(hint.numeric),
            Cell::new(hint.text),
            Cell::new(hint.empty),
            Cell::new(format!("{:.2}", hint.numeric_ratio())),
            kind,
            Cell::new(if category.store().is_visible(column) {
                "yes"
            } else {
                "no"
            }),
        ]);
    }
    table
}

fn text_or_dash(value: &str) -> Cell {
    if value.is_empty() {
        dim_cell("-")
    } else {
        Cell::new(value)
    }
}

/// Accepted and skipped files of an upload.
pub fn ingest_summary(report: &IngestReport) -> Table {
    let mut table = Table::new();
    table.set_header(vec![header_cell("File"), header_cell("Status")]);
    apply_table_style(&mut table);
    for name in &report.accepted {
        table.add_row(vec![Cell::new(name), Cell::new("loaded").fg(Color::Green)]);
    }
    for skipped in &report.skipped {
        table.add_row(vec![
            Cell::new(&skipped.name),
            Cell::new(format!("skipped: {}", skipped.reason)).fg(Color::Yellow),
        ]);
    }
    table
}

/// Plain-text rendering of a report, page by page.
pub fn render_report_text(report: &Report, locale: NumberLocale) -> String {
    let mut out = format!(
        "Analytics report {}\n",
        report.generated_on.format("%Y-%m-%d")
    );
    for page in &report.pages {
        out.push_str(&format!(
            "\n=== Page {} of {} ===\n",
            page.number,
            report.page_count()
        ));
        for block in &page.blocks {
            match block {
                Block::Heading { category, title } => {
                    out.push_str(&format!("\n{}", category.label().to_uppercase()));
                    if !title.is_empty() {
                        out.push_str(&format!(" - {title}"));
                    }
                    out.push('\n');
                }
                Block::Table {
                    columns,
                    rows,
                    totals,
                    continued,
                } => {
                    if *continued {
                        out.push_str("(continued)\n");
                    }
                    let mut table = Table::new();
                    table
                        .load_preset(ASCII_FULL_CONDENSED)
                        .set_content_arrangement(ContentArrangement::Disabled)
                        .force_no_tty()
                        .set_header(columns);
                    for row in rows {
                        let mut cells = row.cells.clone();
                        if !row.selected
                            && let Some(first) = cells.first_mut()
                        {
                            *first = format!("({first})");
                        }
                        table.add_row(cells);
                    }
                    if let Some(totals) = totals {
                        table.add_row(totals);
                    }
                    for idx in 0..columns.len() {
                        let numeric = rows.iter().any(|row| {
                            row.cells
                                .get(idx)
                                .is_some_and(|cell| parse_metric(cell).is_some())
                        });
                        if numeric {
                            align_column(&mut table, idx, CellAlignment::Right);
                        }
                    }
                    out.push_str(&format!("{table}\n"));
                }
                Block::Chart(chart) => {
                    out.push('\n');
                    out.push_str(&render_chart(chart, locale));
                }
                Block::Notes { lines } => {
                    out.push_str("\nNotes:\n");
                    for line in lines {
                        out.push_str(&format!("  {line}\n"));
                    }
                }
            }
        }
    }
    out
}
