//! Error types for the dashboard engine.

use std::path::PathBuf;

use dash_model::CategoryKey;
use thiserror::Error;

/// Errors raised by category operations, configuration and persistence.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Column is not part of the category's columns.
    #[error("{category}: unknown column '{column}'")]
    UnknownColumn {
        category: CategoryKey,
        column: String,
    },

    /// Column exists but is not classified numeric.
    #[error("{category}: column '{column}' is not numeric")]
    NotNumeric {
        category: CategoryKey,
        column: String,
    },

    /// An upload into the category has started and not finished.
    #[error("{category}: an upload is already in progress")]
    UploadInFlight { category: CategoryKey },

    /// Appended header differs from the category's columns.
    #[error("{category}: header [{}] does not match columns [{}]", found.join(", "), expected.join(", "))]
    HeaderMismatch {
        category: CategoryKey,
        expected: Vec<String>,
        found: Vec<String>,
    },

    /// No category qualifies for the report.
    #[error("nothing to export: no category is included with at least one row")]
    NothingToExport,

    /// Imported document is not a JSON object of categories.
    #[error("invalid import: {message}")]
    InvalidImport { message: String },

    /// Failed to read or write the state store.
    #[error("state store error at {path}: {source}")]
    StoreIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// No platform directory for the state store.
    #[error("could not determine a state directory")]
    NoStateDirectory,

    /// Configuration file could not be read or parsed.
    #[error("invalid configuration {path}: {message}")]
    Config { path: PathBuf, message: String },

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;
