//! Integration tests for the category manager, persistence and reports.

use chrono::NaiveDate;
use dash_engine::{
    Block, DashConfig, Dashboard, EngineError, FileStore, IngestMode, MemoryStore, ReportLayout,
    Session, StateStore, build_report, export_json, import_json, load_dashboard, save_dashboard,
};
use dash_ingest::SourceFile;
use dash_model::{CategoryKey, RowId, SortDirection};

const SESSIONS: &str = "\
# Sessions by source
# 2024-02-01 - 2024-02-29
Source,Sessions,Average Session Duration,Bounce rate
google,10,2,\"12,5%\"
bing,20,4,30%
direct,30,6,

";

fn upload(dashboard: &mut Dashboard, key: CategoryKey, name: &str, text: &str, mode: IngestMode) {
    let report = dashboard
        .ingest(key, &[SourceFile::new(name, text)], mode)
        .expect("no upload in flight");
    assert!(report.committed(), "{name} was not committed");
}

fn row_ids(dashboard: &Dashboard, key: CategoryKey) -> Vec<RowId> {
    dashboard.category(key).rows().iter().map(|row| row.id).collect()
}

#[test]
fn commented_export_becomes_three_rows() {
    let mut dashboard = Dashboard::default();
    upload(&mut dashboard, CategoryKey::Acquisition, "sessions.csv", SESSIONS, IngestMode::Replace);
    let category = dashboard.category(CategoryKey::Acquisition);
    assert_eq!(category.rows().len(), 3);
    assert_eq!(category.dataset_title(), "sessions");
    assert_eq!(category.metric_column(), Some("Sessions"));
}

#[test]
fn totals_follow_selection() {
    let mut dashboard = Dashboard::default();
    upload(&mut dashboard, CategoryKey::Acquisition, "s.csv", SESSIONS, IngestMode::Replace);
    let key = CategoryKey::Acquisition;
    let view = dashboard.view(key);
    assert_eq!(view.totals.value("Sessions"), Some(60.0));
    assert_eq!(view.totals.value("Average Session Duration"), Some(4.0));

    let bing = view.rows[1].id;
    assert!(dashboard.set_row_selected(key, bing, false));
    let view = dashboard.view(key);
    assert_eq!(view.totals.value("Sessions"), Some(40.0));
    assert_eq!(view.totals.value("Average Session Duration"), Some(4.0));
    assert_eq!(view.chart.values, vec![10.0, 30.0]);

    assert!(dashboard.set_row_selected(key, bing, true));
    assert_eq!(dashboard.view(key).totals.value("Sessions"), Some(60.0));
}

#[test]
fn second_sort_reverses_first() {
    let mut dashboard = Dashboard::default();
    let key = CategoryKey::Behavior;
    upload(&mut dashboard, key, "s.csv", SESSIONS, IngestMode::Replace);

    assert_eq!(dashboard.sort(key, "Source").unwrap(), SortDirection::Asc);
    let mut first = row_ids(&dashboard, key);
    assert_eq!(dashboard.sort(key, "Source").unwrap(), SortDirection::Desc);
    first.reverse();
    assert_eq!(row_ids(&dashboard, key), first);

    assert_eq!(dashboard.sort(key, "Sessions").unwrap(), SortDirection::Asc);
    assert!(matches!(
        dashboard.sort(key, "Missing"),
        Err(EngineError::UnknownColumn { .. })
    ));
}

#[test]
fn append_with_other_header_changes_nothing() {
    let mut dashboard = Dashboard::default();
    let key = CategoryKey::Conversion;
    upload(&mut dashboard, key, "abc.csv", "A,B,C\n1,2,3\n4,5,6\n", IngestMode::Replace);
    let before = dashboard.category(key).clone();

    let report = dashboard
        .ingest(key, &[SourceFile::new("ab.csv", "A,B\n7,8\n")], IngestMode::Append)
        .unwrap();
    assert!(!report.committed());
    let Some(EngineError::HeaderMismatch { expected, found, .. }) = &report.rejection else {
        panic!("expected a header mismatch, got {:?}", report.rejection);
    };
    assert_eq!(expected, &vec!["A", "B", "C"]);
    assert_eq!(found, &vec!["A", "B"]);
    assert_eq!(dashboard.category(key), &before);
}

#[test]
fn persistence_round_trip_through_file_store() {
    let dir = tempfile::tempdir().expect("temp dir");
    let mut store = FileStore::new(dir.path());
    let key = CategoryKey::Loyalty;

    let mut dashboard = Dashboard::default();
    upload(&mut dashboard, key, "s.csv", SESSIONS, IngestMode::Replace);
    dashboard.sort(key, "Sessions").unwrap();
    dashboard.sort(key, "Sessions").unwrap();
    dashboard.set_column_visibility(key, "Bounce rate", false).unwrap();
    let first = row_ids(&dashboard, key)[0];
    dashboard.set_row_selected(key, first, false);
    dashboard.set_notes(key, "Direct traffic doubled");
    save_dashboard(&mut store, &mut dashboard).expect("save");
    assert!(!dashboard.is_dirty());

    let restored = load_dashboard(&store, DashConfig::default());
    let original = dashboard.category(key);
    let category = restored.category(key);
    assert_eq!(category.rows(), original.rows());
    assert_eq!(category.columns(), original.columns());
    assert_eq!(category.store().column_visibility(), original.store().column_visibility());
    assert_eq!(category.sort_column(), Some("Sessions"));
    assert_eq!(category.sort_direction(), SortDirection::Desc);
    assert_eq!(category.numeric_columns(), original.numeric_columns());
    assert_eq!(category.notes(), "Direct traffic doubled");
}

#[test]
fn row_ids_survive_reload_without_reuse() {
    let mut session = Session::open(MemoryStore::new(), DashConfig::default());
    let key = CategoryKey::Acquisition;
    session
        .update(|d| d.ingest(key, &[SourceFile::new("s.csv", SESSIONS)], IngestMode::Replace))
        .unwrap();
    let last = *row_ids(session.dashboard(), key).last().unwrap();
    assert!(session.update(|d| d.remove_row(key, last)));

    let (_, store) = session.into_parts();
    let mut session = Session::open(store, DashConfig::default());
    session
        .update(|d| d.ingest(key, &[SourceFile::new("s.csv", SESSIONS)], IngestMode::Append))
        .unwrap();
    let ids = row_ids(session.dashboard(), key);
    assert_eq!(ids.len(), 5);
    assert!(!ids.contains(&last));
    assert_eq!(ids.last().map(|id| id.get()), Some(5));
}

#[test]
fn corrupt_state_never_blocks_startup() {
    let mut store = MemoryStore::new();
    store
        .save(dash_engine::DEFAULT_STORAGE_KEY, "{\"categories\": 12}")
        .unwrap();
    let config = DashConfig {
        seed_example: true,
        ..DashConfig::default()
    };
    let dashboard = load_dashboard(&store, config);
    assert!(dashboard.categories().all(|category| !category.is_empty()));
}

#[test]
fn export_import_moves_one_category() {
    let mut source = Dashboard::default();
    upload(&mut source, CategoryKey::Behavior, "pages.csv", SESSIONS, IngestMode::Replace);
    let json = export_json(&source, Some(&[CategoryKey::Behavior])).unwrap();

    let mut target = Dashboard::default();
    upload(&mut target, CategoryKey::Behavior, "old.csv", "X,Y\n1,2\n", IngestMode::Replace);
    let imported = import_json(&mut target, &json).unwrap();
    assert_eq!(imported, vec![CategoryKey::Behavior]);
    assert_eq!(target.category(CategoryKey::Behavior).dataset_title(), "pages");
    assert_eq!(target.category(CategoryKey::Behavior).rows().len(), 3);
}

#[test]
fn report_covers_included_categories_only() {
    let mut dashboard = Dashboard::default();
    upload(&mut dashboard, CategoryKey::Acquisition, "a.csv", SESSIONS, IngestMode::Replace);
    upload(&mut dashboard, CategoryKey::Loyalty, "l.csv", SESSIONS, IngestMode::Replace);
    dashboard.set_include_in_pdf(CategoryKey::Loyalty, false);

    let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
    let report = build_report(&dashboard, &ReportLayout::default(), date).unwrap();
    assert_eq!(report.categories(), vec![CategoryKey::Acquisition]);
    let totals = report
        .pages
        .iter()
        .flat_map(|page| &page.blocks)
        .find_map(|block| match block {
            Block::Table {
                totals: Some(totals),
                ..
            } => Some(totals.join(" | ")),
            _ => None,
        })
        .unwrap();
    insta::assert_snapshot!(totals, @"Total | 60 | 4 | 42,5");
}
