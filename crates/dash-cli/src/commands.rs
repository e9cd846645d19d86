use std::fs;
use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use tracing::info;

use dash_cli::render::{
    categories_table, category_table, column_hints_table, ingest_summary, render_chart,
    render_report_text,
};
use dash_engine::{
    DashConfig, EngineError, FileStore, IngestMode, Session, build_report, example_files,
    export_json, import_json,
};
use dash_ingest::read_sources;
use dash_model::CategoryKey;

use crate::cli::{Cli, ExportArgs, ReportArgs, ReportFormatArg, SelectArgs, SetArgs, ShowArgs, UploadArgs};

pub type DashSession = Session<FileStore>;

/// Opens the saved dashboard named by the global flags.
pub fn open_session(cli: &Cli) -> Result<DashSession> {
    let config = match &cli.config {
        Some(path) => DashConfig::load(path).context("load configuration")?,
        None => DashConfig::default(),
    };
    let store = match &cli.state_dir {
        Some(dir) => FileStore::new(dir),
        None => FileStore::default_location().context("locate state directory")?,
    };
    info!(state_dir = %store.dir().display(), "opening dashboard");
    Ok(Session::open(store, config))
}

pub fn run_upload(session: &mut DashSession, args: &UploadArgs) -> Result<i32> {
    let mode = if args.append {
        IngestMode::Append
    } else {
        IngestMode::Replace
    };
    let (files, unreadable) = read_sources(&args.files);
    let mut report = session.try_update(|dashboard| -> Result<_, EngineError> {
        let ticket = dashboard.begin_upload(args.category)?;
        Ok(dashboard.commit_upload(ticket, &files, mode))
    })?;
    report.skipped = unreadable
        .into_iter()
        .chain(std::mem::take(&mut report.skipped))
        .collect();

    println!("{}", ingest_summary(&report));
    if let Some(rejection) = &report.rejection {
        eprintln!("error: {rejection}");
        return Ok(1);
    }
    if !report.committed() {
        eprintln!("error: no usable CSV in upload");
        return Ok(1);
    }
    println!(
        "{} row(s) loaded into {} ({mode})",
        report.rows_added, report.category
    );
    Ok(0)
}

pub fn run_show(session: &DashSession, args: &ShowArgs) -> Result<()> {
    let dashboard = session.dashboard();
    let locale = dashboard.config().locale;
    let keys: Vec<CategoryKey> = match args.category {
        Some(key) => vec![key],
        None => CategoryKey::ALL.to_vec(),
    };
    for key in keys {
        let view = dashboard.view(key);
        let title = if view.title.is_empty() {
            String::new()
        } else {
            format!(" - {}", view.title)
        };
        println!(
            "\n{}{title} ({} rows, {} selected)",
            key.label().to_uppercase(),
            view.rows.len(),
            view.selected_count()
        );
        if view.is_empty() {
            println!("(no data)");
            continue;
        }
        println!("{}", category_table(&view, locale));
        if args.chart {
            print!("{}", render_chart(&view.chart, locale));
        }
        if args.columns {
            println!("{}", column_hints_table(dashboard.category(key)));
        }
        if !view.notes.is_empty() {
            println!("Notes: {}", view.notes);
        }
    }
    Ok(())
}

pub fn run_sort(session: &mut DashSession, category: CategoryKey, column: &str) -> Result<()> {
    let direction = session.try_update(|dashboard| dashboard.sort(category, column))?;
    println!("{category} sorted by '{column}' ({direction})");
    Ok(())
}

pub fn run_select(session: &mut DashSession, args: &SelectArgs) -> Result<i32> {
    let selected = !args.off;
    if args.all {
        session.update(|dashboard| dashboard.set_all_selected(args.category, selected));
        println!("all rows of {} {}", args.category, selection_word(selected));
        return Ok(0);
    }
    let missing = session.update(|dashboard| {
        args.rows
            .iter()
            .filter(|id| !dashboard.set_row_selected(args.category, **id, selected))
            .copied()
            .collect::<Vec<_>>()
    });
    for id in &missing {
        eprintln!("warning: row {id} not found in {}", args.category);
    }
    println!(
        "{} row(s) {}",
        args.rows.len() - missing.len(),
        selection_word(selected)
    );
    Ok(if missing.is_empty() { 0 } else { 1 })
}

fn selection_word(selected: bool) -> &'static str {
    if selected { "selected" } else { "deselected" }
}

pub fn run_remove_row(
    session: &mut DashSession,
    category: CategoryKey,
    row: dash_model::RowId,
) -> Result<()> {
    if !session.update(|dashboard| dashboard.remove_row(category, row)) {
        return Err(anyhow!("row {row} not found in {category}"));
    }
    println!("removed row {row} from {category}");
    Ok(())
}

pub fn run_clear(session: &mut DashSession, category: CategoryKey) {
    session.update(|dashboard| dashboard.clear(category));
    println!("cleared {category}");
}

pub fn run_set(session: &mut DashSession, args: &SetArgs) -> Result<()> {
    let key = args.category;
    session.try_update(|dashboard| -> Result<(), EngineError> {
        if let Some(title) = &args.title {
            dashboard.set_title(key, title);
        }
        if let Some(notes) = &args.notes {
            dashboard.set_notes(key, notes);
        }
        if args.no_metric {
            dashboard.set_metric_column(key, None)?;
        } else if let Some(metric) = &args.metric {
            dashboard.set_metric_column(key, Some(metric))?;
        }
        for column in &args.show {
            dashboard.set_column_visibility(key, column, true)?;
        }
        for column in &args.hide {
            dashboard.set_column_visibility(key, column, false)?;
        }
        if let Some(include) = args.include_in_report {
            dashboard.set_include_in_pdf(key, include);
        }
        Ok(())
    })?;
    println!("updated {key}");
    Ok(())
}

pub fn run_export_json(session: &DashSession, args: &ExportArgs) -> Result<()> {
    let keys = (!args.categories.is_empty()).then_some(args.categories.as_slice());
    let json = export_json(session.dashboard(), keys)?;
    match &args.out {
        Some(path) => {
            fs::write(path, &json).with_context(|| format!("write {}", path.display()))?;
            println!("exported to {}", path.display());
        }
        None => {
            let mut stdout = io::stdout().lock();
            writeln!(stdout, "{json}")?;
        }
    }
    Ok(())
}

pub fn run_import_json(session: &mut DashSession, path: &Path) -> Result<()> {
    let text = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let imported = session.try_update(|dashboard| import_json(dashboard, &text))?;
    if imported.is_empty() {
        println!("no categories found in {}", path.display());
    } else {
        let names: Vec<&str> = imported.iter().map(|key| key.as_str()).collect();
        println!("imported {}", names.join(", "));
    }
    Ok(())
}

pub fn run_report(session: &DashSession, args: &ReportArgs) -> Result<()> {
    let dashboard = session.dashboard();
    let date = args
        .date
        .unwrap_or_else(|| chrono::Local::now().date_naive());
    let report = match build_report(dashboard, &dashboard.config().report, date) {
        Ok(report) => report,
        Err(EngineError::NothingToExport) => {
            println!("Nothing to export: no category is included in the report and has rows.");
            return Ok(());
        }
        Err(error) => return Err(error.into()),
    };
    let (extension, body) = match args.format {
        ReportFormatArg::Text => ("txt", render_report_text(&report, dashboard.config().locale)),
        ReportFormatArg::Json => ("json", serde_json::to_string_pretty(&report)?),
    };
    let dir = args.out_dir.as_deref().unwrap_or(Path::new("."));
    fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
    let path = dir.join(format!("{}.{extension}", report.file_name()));
    fs::write(&path, body).with_context(|| format!("write {}", path.display()))?;
    info!(path = %path.display(), pages = report.page_count(), "wrote report");
    println!(
        "wrote {} ({} page(s))",
        path.display(),
        report.page_count()
    );
    Ok(())
}

pub fn run_categories(session: &DashSession) {
    println!("{}", categories_table(session.dashboard()));
}

pub fn run_example(session: &mut DashSession) -> Result<()> {
    let rows = session.try_update(|dashboard| -> Result<usize, EngineError> {
        let mut rows = 0;
        for (key, file) in example_files() {
            let report = dashboard.ingest(key, std::slice::from_ref(&file), IngestMode::Replace)?;
            rows += report.rows_added;
        }
        Ok(rows)
    })?;
    println!("loaded {rows} example row(s) into every category");
    Ok(())
}
