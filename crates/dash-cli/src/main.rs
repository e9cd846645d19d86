//! Analytics dashboard CLI.

use clap::Parser;
use dash_cli::logging::init_logging;

mod cli;
mod commands;

use crate::cli::{Cli, Command};
use crate::commands::{
    open_session, run_categories, run_clear, run_example, run_export_json, run_import_json,
    run_remove_row, run_report, run_select, run_set, run_show, run_sort, run_upload,
};

fn main() {
    let cli = Cli::parse();
    cli.color.write_global();
    let log_config = cli.log_config();
    if let Err(error) = init_logging(&log_config) {
        eprintln!("error: failed to initialize logging: {error}");
        std::process::exit(1);
    }
    let exit_code = match run(&cli) {
        Ok(code) => code,
        Err(error) => {
            eprintln!("error: {error:#}");
            1
        }
    };
    std::process::exit(exit_code);
}

fn run(cli: &Cli) -> anyhow::Result<i32> {
    let mut session = open_session(cli)?;
    match &cli.command {
        Command::Upload(args) => return run_upload(&mut session, args),
        Command::Show(args) => run_show(&session, args)?,
        Command::Sort { category, column } => run_sort(&mut session, *category, column)?,
        Command::Select(args) => return run_select(&mut session, args),
        Command::RemoveRow { category, row } => run_remove_row(&mut session, *category, *row)?,
        Command::Clear { category } => run_clear(&mut session, *category),
        Command::Set(args) => run_set(&mut session, args)?,
        Command::ExportJson(args) => run_export_json(&session, args)?,
        Command::ImportJson { path } => run_import_json(&mut session, path)?,
        Command::Report(args) => run_report(&session, args)?,
        Command::Categories => run_categories(&session),
        Command::Example => run_example(&mut session)?,
    }
    Ok(0)
}
