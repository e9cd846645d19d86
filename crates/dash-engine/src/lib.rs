//! Analytics dashboard engine.
//!
//! Owns the four dashboard categories and everything derived from them.
//!
//! # Features
//!
//! - **Row Store**: per-category rows with stable ids and selection flags
//! - **Aggregation**: selection-aware totals, summed or averaged by column name
//! - **Sorting**: numeric-aware, toggling, with unparseable values kept last
//! - **Category Manager**: guarded uploads in replace or append mode
//! - **Persistence**: one JSON document in a key-value store, merged per category
//! - **Exchange**: JSON export and import of selected categories
//! - **Reports**: paginated sections with tables, charts and notes
//!
//! # Example
//!
//! ```ignore
//! use dash_engine::{DashConfig, FileStore, IngestMode, Session};
//! use dash_ingest::SourceFile;
//! use dash_model::CategoryKey;
//!
//! let mut session = Session::open(FileStore::default_location()?, DashConfig::default());
//! let files = vec![SourceFile::from_path(Path::new("traffic.csv"))?];
//! let report = session.update(|d| d.ingest(CategoryKey::Acquisition, &files, IngestMode::Replace))?;
//! let view = session.dashboard().view(CategoryKey::Acquisition);
//! ```
//!
//! # Architecture
//!
//! - `store.rs` - Row storage and id allocation
//! - `category.rs` - One category: rows, classification, view settings
//! - `dashboard.rs` - The category manager and upload guard
//! - `view.rs` - Derived view and chart series
//! - `persist.rs` - State stores, load/save, sessions

mod aggregate;
mod category;
mod config;
mod dashboard;
mod error;
mod example;
mod exchange;
mod format;
mod persist;
mod report;
mod sort;
mod store;
mod view;

// === Error Types ===
pub use error::{EngineError, Result};

// === Configuration ===
pub use config::{DEFAULT_STORAGE_KEY, DashConfig};

// === Rows and Categories ===
pub use category::{Category, CategorySnapshot};
pub use dashboard::{Dashboard, DashboardSnapshot, IngestMode, IngestReport, UploadTicket};
pub use store::{HeaderMismatch, RowStore};

// === Derived Data ===
pub use aggregate::{AggregateKind, AverageRule, TotalCell, Totals, compute_totals};
pub use format::{NumberLocale, format_number};
pub use sort::{compare_text, resort_rows, sort_rows, toggle_direction};
pub use view::{CategoryView, ChartData, chart_data};

// === Persistence and Exchange ===
pub use example::{example_dashboard, example_files};
pub use exchange::{export_json, import_json};
pub use persist::{
    FileStore, MemoryStore, Session, StateStore, StoreLock, load_dashboard, save_dashboard,
};

// === Reports ===
pub use report::{Block, Page, Report, ReportLayout, TableRow, build_report, wrap_text};
