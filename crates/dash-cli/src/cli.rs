//! CLI argument definitions for the analytics dashboard.

use std::io::{self, IsTerminal};
use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, ColorChoice, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;
use dash_cli::logging::{LogConfig, LogFormat};
use dash_model::{CategoryKey, RowId};
use tracing::level_filters::LevelFilter;

#[derive(Parser)]
#[command(
    name = "dashboard",
    version,
    about = "Analytics dashboard over uploaded CSV exports",
    long_about = "Keep four analytics categories (acquisition, behavior, conversion, loyalty)\n\
                  filled from CSV exports. State is saved after every command.\n\n\
                  Columns are classified numeric or dimensional automatically; totals\n\
                  cover the selected rows only."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Directory holding the saved dashboard state (default: platform data dir).
    #[arg(long = "state-dir", value_name = "DIR", global = true)]
    pub state_dir: Option<PathBuf>,

    /// TOML configuration file.
    #[arg(long = "config", value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Adjust log verbosity (-v for debug, -vv for trace, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    /// Logging setup from the flags. An explicit `--log-level` or `-v`/`-q`
    /// wins over `RUST_LOG`.
    pub fn log_config(&self) -> LogConfig {
        let explicit = self.log_level.map(LevelFilter::from);
        LogConfig {
            level_filter: explicit.unwrap_or_else(|| self.verbosity.tracing_level_filter()),
            use_env_filter: explicit.is_none() && !self.verbosity.is_present(),
            format: self.log_format.into(),
            log_file: self.log_file.clone(),
            with_ansi: match self.color.color {
                ColorChoice::Always => true,
                ColorChoice::Never => false,
                ColorChoice::Auto => self.log_file.is_none() && io::stderr().is_terminal(),
            },
            ..LogConfig::default()
        }
    }
}

#[derive(Subcommand)]
pub enum Command {
    /// Load CSV files into a category.
    Upload(UploadArgs),

    /// Print the table, totals and chart series of one or all categories.
    Show(ShowArgs),

    /// Sort a category by a column (repeat to reverse).
    Sort {
        category: CategoryKey,
        column: String,
    },

    /// Select or deselect rows for totals and charts.
    Select(SelectArgs),

    /// Delete a row.
    RemoveRow { category: CategoryKey, row: RowId },

    /// Empty a category.
    Clear { category: CategoryKey },

    /// Change category settings.
    Set(SetArgs),

    /// Write categories as JSON.
    ExportJson(ExportArgs),

    /// Replace categories from a JSON export.
    ImportJson {
        #[arg(value_name = "PATH")]
        path: PathBuf,
    },

    /// Build the paginated report.
    Report(ReportArgs),

    /// List the categories with row counts and settings.
    Categories,

    /// Fill every category with the built-in example data.
    Example,
}

#[derive(Args)]
pub struct UploadArgs {
    pub category: CategoryKey,

    /// CSV files, merged under the first file's header.
    #[arg(value_name = "FILE", required = true)]
    pub files: Vec<PathBuf>,

    /// Add rows to the existing dataset instead of replacing it.
    #[arg(long)]
    pub append: bool,
}

#[derive(Args)]
pub struct ShowArgs {
    /// Category to show (all when omitted).
    pub category: Option<CategoryKey>,

    /// Also print the chart series.
    #[arg(long)]
    pub chart: bool,

    /// Show the classifier evidence per column.
    #[arg(long)]
    pub columns: bool,
}

#[derive(Args)]
pub struct SelectArgs {
    pub category: CategoryKey,

    /// Row ids to change.
    #[arg(value_name = "ROW", required_unless_present = "all")]
    pub rows: Vec<RowId>,

    /// Apply to every row.
    #[arg(long, conflicts_with = "rows")]
    pub all: bool,

    /// Deselect instead of select.
    #[arg(long)]
    pub off: bool,
}

#[derive(Args)]
pub struct SetArgs {
    pub category: CategoryKey,

    #[arg(long)]
    pub title: Option<String>,

    #[arg(long)]
    pub notes: Option<String>,

    /// Numeric column to chart.
    #[arg(long, value_name = "COLUMN", conflicts_with = "no_metric")]
    pub metric: Option<String>,

    /// Chart nothing.
    #[arg(long)]
    pub no_metric: bool,

    /// Columns to show.
    #[arg(long = "show", value_name = "COLUMN")]
    pub show: Vec<String>,

    /// Columns to hide.
    #[arg(long = "hide", value_name = "COLUMN")]
    pub hide: Vec<String>,

    /// Whether the category goes into the report.
    #[arg(long = "include-in-report", value_name = "BOOL")]
    pub include_in_report: Option<bool>,
}

#[derive(Args)]
pub struct ExportArgs {
    /// Categories to export (all when omitted).
    #[arg(long = "category", value_name = "CATEGORY")]
    pub categories: Vec<CategoryKey>,

    /// Output file (stdout when omitted).
    #[arg(long = "out", value_name = "PATH")]
    pub out: Option<PathBuf>,
}

#[derive(Args)]
pub struct ReportArgs {
    /// Directory for the report file (default: current directory).
    #[arg(long = "out-dir", value_name = "DIR")]
    pub out_dir: Option<PathBuf>,

    /// Report date (default: today).
    #[arg(long = "date", value_name = "YYYY-MM-DD")]
    pub date: Option<NaiveDate>,

    #[arg(long = "format", value_enum, default_value = "text")]
    pub format: ReportFormatArg,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum ReportFormatArg {
    Text,
    Json,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}

impl From<LogLevelArg> for LevelFilter {
    fn from(level: LogLevelArg) -> Self {
        match level {
            LogLevelArg::Error => LevelFilter::ERROR,
            LogLevelArg::Warn => LevelFilter::WARN,
            LogLevelArg::Info => LevelFilter::INFO,
            LogLevelArg::Debug => LevelFilter::DEBUG,
            LogLevelArg::Trace => LevelFilter::TRACE,
        }
    }
}

impl From<LogFormatArg> for LogFormat {
    fn from(format: LogFormatArg) -> Self {
        match format {
            LogFormatArg::Pretty => LogFormat::Pretty,
            LogFormatArg::Compact => LogFormat::Compact,
            LogFormatArg::Json => LogFormat::Json,
        }
    }
}
