//! Paginated report composition.
//!
//! The report has one section per category that is marked for export and has
//! rows. A section holds a heading, the table with its totals, the metric chart
//! and the notes. Sections start on a fresh page; tables that overflow a page
//! continue on the next one with the header repeated.

use chrono::NaiveDate;
use dash_model::CategoryKey;
use serde::{Deserialize, Serialize};

use crate::dashboard::Dashboard;
use crate::error::{EngineError, Result};
use crate::view::{CategoryView, ChartData};

/// Page geometry in millimetres.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportLayout {
    pub page_width_mm: f64,
    pub page_height_mm: f64,
    pub margin_mm: f64,
    pub heading_mm: f64,
    pub row_mm: f64,
    pub chart_mm: f64,
    pub note_line_mm: f64,
    /// Vertical space after each block.
    pub gap_mm: f64,
    /// Characters that fit on one line of notes.
    pub chars_per_line: usize,
}

impl Default for ReportLayout {
    /// A4 portrait with a 10 mm margin.
    fn default() -> Self {
        Self {
            page_width_mm: 210.0,
            page_height_mm: 297.0,
            margin_mm: 10.0,
            heading_mm: 10.0,
            row_mm: 6.0,
            chart_mm: 80.0,
            note_line_mm: 4.0,
            gap_mm: 5.0,
            chars_per_line: 95,
        }
    }
}

impl ReportLayout {
    /// Height available for content on one page.
    pub fn content_height(&self) -> f64 {
        (self.page_height_mm - 2.0 * self.margin_mm).max(0.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableRow {
    pub selected: bool,
    pub cells: Vec<String>,
}

/// One positioned piece of a page.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Block {
    Heading {
        category: CategoryKey,
        title: String,
    },
    Table {
        columns: Vec<String>,
        rows: Vec<TableRow>,
        /// Present on the last part of a table only.
        totals: Option<Vec<String>>,
        continued: bool,
    },
    Chart(ChartData),
    Notes {
        lines: Vec<String>,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Page {
    pub number: usize,
    pub blocks: Vec<Block>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub generated_on: NaiveDate,
    pub pages: Vec<Page>,
}

impl Report {
    /// Base file name, e.g. `analytics-rapport-2024-03-01`.
    pub fn file_name(&self) -> String {
        format!("analytics-rapport-{}", self.generated_on.format("%Y-%m-%d"))
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Categories with a section, in report order.
    pub fn categories(&self) -> Vec<CategoryKey> {
        self.pages
            .iter()
            .flat_map(|page| &page.blocks)
            .filter_map(|block| match block {
                Block::Heading { category, .. } => Some(*category),
                _ => None,
            })
            .collect()
    }
}

/// Composes the report for every eligible category.
///
/// Fails with [`EngineError::NothingToExport`] rather than producing an empty
/// document.
pub fn build_report(
    dashboard: &Dashboard,
    layout: &ReportLayout,
    generated_on: NaiveDate,
) -> Result<Report> {
    let views: Vec<CategoryView> = dashboard
        .views()
        .into_iter()
        .filter(|view| view.include_in_pdf && !view.is_empty())
        .collect();
    if views.is_empty() {
        return Err(EngineError::NothingToExport);
    }
    let locale = dashboard.config().locale;

    let mut pager = Paginator::new(layout);
    for view in &views {
        pager.start_section();
        pager.place(
            Block::Heading {
                category: view.key,
                title: view.title.clone(),
            },
            layout.heading_mm,
        );
        let rows: Vec<TableRow> = view
            .rows
            .iter()
            .map(|row| TableRow {
                selected: row.selected,
                cells: view.cells(row).map(str::to_string).collect(),
            })
            .collect();
        pager.place_table(&view.visible_columns, rows, view.totals.display(locale));
        if !view.chart.is_empty() {
            pager.place(Block::Chart(view.chart.clone()), layout.chart_mm);
        }
        if !view.notes.trim().is_empty() {
            pager.place_notes(wrap_text(&view.notes, layout.chars_per_line));
        }
    }
    let pages = pager.finish();
    tracing::info!(
        categories = views.len(),
        pages = pages.len(),
        "built report"
    );
    Ok(Report {
        generated_on,
        pages,
    })
}

struct Paginator<'a> {
    layout: &'a ReportLayout,
    pages: Vec<Page>,
    current: Vec<Block>,
    used: f64,
}

impl<'a> Paginator<'a> {
    fn new(layout: &'a ReportLayout) -> Self {
        Self {
            layout,
            pages: Vec::new(),
            current: Vec::new(),
            used: 0.0,
        }
    }

    fn remaining(&self) -> f64 {
        self.layout.content_height() - self.used
    }

    fn new_page(&mut self) {
        if self.current.is_empty() {
            return;
        }
        let number = self.pages.len() + 1;
        self.pages.push(Page {
            number,
            blocks: std::mem::take(&mut self.current),
        });
        self.used = 0.0;
    }

    fn start_section(&mut self) {
        self.new_page();
    }

    /// Places a block, breaking the page first when it does not fit. A block
    /// taller than a whole page is placed anyway.
    fn place(&mut self, block: Block, height: f64) {
        if height > self.remaining() {
            self.new_page();
        }
        self.current.push(block);
        self.used += height + self.layout.gap_mm;
    }

    /// Lines of `line_mm` that fit in the rest of the page.
    fn lines_left(&self, line_mm: f64) -> usize {
        if line_mm <= 0.0 {
            return usize::MAX;
        }
        (self.remaining() / line_mm).floor().max(0.0) as usize
    }

    /// Splits the table over pages. The totals line comes after the last row.
    fn place_table(&mut self, columns: &[String], rows: Vec<TableRow>, totals: Vec<String>) {
        let row_mm = self.layout.row_mm;
        let total_lines = rows.len() + 1;
        let mut rows = rows.into_iter();
        let mut placed = 0;
        let mut continued = false;
        while placed < total_lines {
            // One line for the header, at least one for content.
            let mut fit = self.lines_left(row_mm).saturating_sub(1);
            if fit == 0 && !self.current.is_empty() {
                self.new_page();
                fit = self.lines_left(row_mm).saturating_sub(1);
            }
            let fit = fit.max(1).min(total_lines - placed);
            let chunk: Vec<TableRow> = rows.by_ref().take(fit).collect();
            let last = placed + fit == total_lines;
            let lines = fit + 1;
            placed += fit;
            self.current.push(Block::Table {
                columns: columns.to_vec(),
                rows: chunk,
                totals: last.then(|| totals.clone()),
                continued,
            });
            self.used += lines as f64 * row_mm;
            if last {
                self.used += self.layout.gap_mm;
            } else {
                self.new_page();
            }
            continued = true;
        }
    }

    fn place_notes(&mut self, lines: Vec<String>) {
        let line_mm = self.layout.note_line_mm;
        let mut lines = lines.into_iter().peekable();
        while lines.peek().is_some() {
            let mut fit = self.lines_left(line_mm);
            if fit == 0 && !self.current.is_empty() {
                self.new_page();
                fit = self.lines_left(line_mm);
            }
            let chunk: Vec<String> = lines.by_ref().take(fit.max(1)).collect();
            self.used += chunk.len() as f64 * line_mm;
            self.current.push(Block::Notes { lines: chunk });
            if lines.peek().is_some() {
                self.new_page();
            } else {
                self.used += self.layout.gap_mm;
            }
        }
    }

    fn finish(mut self) -> Vec<Page> {
        self.new_page();
        self.pages
    }
}

/// Greedy word wrap. Words longer than `width` are split.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();
    for paragraph in text.trim_end().lines() {
        let mut line = String::new();
        let mut line_len = 0;
        for word in paragraph.split_whitespace() {
            let chars: Vec<char> = word.chars().collect();
            for piece in chars.chunks(width) {
                let piece_len = piece.len();
                if line_len > 0 && line_len + 1 + piece_len > width {
                    lines.push(std::mem::take(&mut line));
                    line_len = 0;
                }
                if line_len > 0 {
                    line.push(' ');
                    line_len += 1;
                }
                line.extend(piece);
                line_len += piece_len;
            }
        }
        lines.push(line);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DashConfig;
    use crate::dashboard::IngestMode;
    use dash_ingest::SourceFile;

    fn csv(rows: usize) -> String {
        let mut text = String::from("Page,Views\n");
        for idx in 0..rows {
            text.push_str(&format!("/p{idx},{idx}\n"));
        }
        text
    }

    fn dashboard(rows: usize) -> Dashboard {
        let mut dashboard = Dashboard::new(DashConfig::default());
        dashboard
            .ingest(
                CategoryKey::Behavior,
                &[SourceFile::new("pages.csv", csv(rows))],
                IngestMode::Replace,
            )
            .unwrap();
        dashboard
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    }

    fn tables(report: &Report) -> Vec<&Block> {
        report
            .pages
            .iter()
            .flat_map(|page| &page.blocks)
            .filter(|block| matches!(block, Block::Table { .. }))
            .collect()
    }

    #[test]
    fn test_nothing_to_export() {
        let dashboard = Dashboard::default();
        assert!(matches!(
            build_report(&dashboard, &ReportLayout::default(), date()),
            Err(EngineError::NothingToExport)
        ));

        let mut dashboard = self::dashboard(3);
        dashboard.set_include_in_pdf(CategoryKey::Behavior, false);
        assert!(matches!(
            build_report(&dashboard, &ReportLayout::default(), date()),
            Err(EngineError::NothingToExport)
        ));
    }

    #[test]
    fn test_small_section_fits_one_page() {
        let mut dashboard = dashboard(3);
        dashboard.set_notes(CategoryKey::Behavior, "Views dipped on /p1.");
        let report = build_report(&dashboard, &ReportLayout::default(), date()).unwrap();
        assert_eq!(report.page_count(), 1);
        assert_eq!(report.file_name(), "analytics-rapport-2024-03-01");
        assert_eq!(report.categories(), vec![CategoryKey::Behavior]);
        let kinds: Vec<&str> = report.pages[0]
            .blocks
            .iter()
            .map(|block| match block {
                Block::Heading { .. } => "heading",
                Block::Table { .. } => "table",
                Block::Chart(_) => "chart",
                Block::Notes { .. } => "notes",
            })
            .collect();
        assert_eq!(kinds, vec!["heading", "table", "chart", "notes"]);
    }

    #[test]
    fn test_long_table_repeats_header_and_ends_with_totals() {
        let report = build_report(&dashboard(100), &ReportLayout::default(), date()).unwrap();
        let tables = tables(&report);
        assert!(tables.len() > 1);
        let mut row_count = 0;
        for (idx, block) in tables.iter().enumerate() {
            let Block::Table {
                columns,
                rows,
                totals,
                continued,
            } = block
            else {
                unreachable!()
            };
            assert_eq!(columns, &vec!["Page".to_string(), "Views".to_string()]);
            assert_eq!(*continued, idx > 0);
            assert_eq!(totals.is_some(), idx == tables.len() - 1);
            row_count += rows.len();
        }
        assert_eq!(row_count, 100);
        let Some(Block::Table {
            totals: Some(totals),
            ..
        }) = tables.last().copied()
        else {
            unreachable!()
        };
        assert_eq!(totals, &vec!["Total".to_string(), "4.950".to_string()]);
        assert!(report.pages.iter().enumerate().all(|(idx, page)| page.number == idx + 1));
    }

    #[test]
    fn test_each_section_starts_a_page() {
        let mut dashboard = dashboard(2);
        dashboard
            .ingest(
                CategoryKey::Loyalty,
                &[SourceFile::new("cohorts.csv", csv(2))],
                IngestMode::Replace,
            )
            .unwrap();
        let report = build_report(&dashboard, &ReportLayout::default(), date()).unwrap();
        assert_eq!(report.page_count(), 2);
        assert_eq!(
            report.categories(),
            vec![CategoryKey::Behavior, CategoryKey::Loyalty]
        );
    }

    #[test]
    fn test_wrap_text() {
        assert_eq!(wrap_text("aaa bbb ccc", 7), vec!["aaa bbb", "ccc"]);
        assert_eq!(wrap_text("abcdefgh", 3), vec!["abc", "def", "gh"]);
        assert_eq!(wrap_text("one\n\ntwo", 10), vec!["one", "", "two"]);
    }
}
