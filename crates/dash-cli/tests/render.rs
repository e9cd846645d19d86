//! Integration tests for terminal rendering.

use chrono::NaiveDate;
use dash_cli::render::{
    categories_table, category_table, column_hints_table, ingest_summary, render_chart,
    render_report_text,
};
use dash_engine::{Dashboard, IngestMode, NumberLocale, ReportLayout, build_report, example_dashboard};
use dash_ingest::{SourceFile, read_sources};
use dash_model::CategoryKey;

fn dashboard() -> Dashboard {
    example_dashboard(dash_engine::DashConfig::default())
}

#[test]
fn category_table_marks_sort_and_totals() {
    let mut dashboard = dashboard();
    dashboard.sort(CategoryKey::Behavior, "Views").unwrap();
    let view = dashboard.view(CategoryKey::Behavior);
    let rendered = category_table(&view, NumberLocale::Nl).to_string();
    assert!(rendered.contains("Views # ▲"));
    assert!(rendered.contains("Total"));
    assert!(rendered.contains("3.715"));
}

#[test]
fn deselected_rows_leave_totals() {
    let mut dashboard = dashboard();
    let key = CategoryKey::Behavior;
    let first = dashboard.category(key).rows()[0].id;
    dashboard.set_row_selected(key, first, false);
    let view = dashboard.view(key);
    let rendered = category_table(&view, NumberLocale::En).to_string();
    assert!(rendered.contains("1,405"));
}

#[test]
fn example_chart_renders_selected_series() {
    let dashboard = dashboard();
    let view = dashboard.view(CategoryKey::Conversion);
    insta::assert_snapshot!(render_chart(&view.chart, NumberLocale::Nl), @r"
    Conversions
    sign_up       | ######################################## 84
    purchase      | ############### 31
    generate_lead | ###################### 46
    ");
}

#[test]
fn categories_and_hints_tables_list_everything() {
    let dashboard = dashboard();
    let rendered = categories_table(&dashboard).to_string();
    for key in CategoryKey::ALL {
        assert!(rendered.contains(key.as_str()), "{key} missing");
    }
    let hints = column_hints_table(dashboard.category(CategoryKey::Acquisition)).to_string();
    assert!(hints.contains("Session source"));
    assert!(hints.contains("dimension"));
    assert!(hints.contains("1.00"));
}

#[test]
fn ingest_summary_lists_skipped_files() {
    let mut dashboard = Dashboard::default();
    let report = dashboard
        .ingest(
            CategoryKey::Loyalty,
            &[
                SourceFile::new("cohorts.csv", "Cohort,Users\nW1,4\n"),
                SourceFile::new("notes.pdf", "%PDF"),
            ],
            IngestMode::Replace,
        )
        .unwrap();
    let rendered = ingest_summary(&report).to_string();
    assert!(rendered.contains("cohorts.csv"));
    assert!(rendered.contains("loaded"));
    assert!(rendered.contains("notes.pdf"));
    assert!(rendered.contains("skipped"));
}

#[test]
fn ingest_summary_lists_unreadable_files() {
    let (files, unreadable) = read_sources(&[std::path::Path::new("/nonexistent/dir/gone.csv")]);
    let mut dashboard = Dashboard::default();
    let mut report = dashboard
        .ingest(CategoryKey::Loyalty, &files, IngestMode::Replace)
        .unwrap();
    report.skipped.extend(unreadable);
    assert!(!report.committed());
    let rendered = ingest_summary(&report).to_string();
    assert!(rendered.contains("gone.csv"));
    assert!(rendered.contains("skipped"));
}

#[test]
fn report_text_has_one_section_per_included_category() {
    let mut dashboard = dashboard();
    dashboard.set_include_in_pdf(CategoryKey::Loyalty, false);
    dashboard.set_notes(CategoryKey::Acquisition, "LinkedIn campaign started mid-month.");
    let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
    let report = build_report(&dashboard, &ReportLayout::default(), date).unwrap();
    let text = render_report_text(&report, NumberLocale::Nl);

    assert!(text.starts_with("Analytics report 2024-03-01\n"));
    assert!(text.contains("=== Page 1 of 3 ==="));
    assert!(text.contains("ACQUISITION - Acquisition overview"));
    assert!(text.contains("BEHAVIOR - Pages and screens"));
    assert!(text.contains("CONVERSION - Conversions"));
    assert!(!text.contains("LOYALTY"));
    assert!(text.contains("Notes:\n  LinkedIn campaign started mid-month."));
}
