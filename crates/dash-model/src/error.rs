use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    #[error("unknown category: {0}")]
    UnknownCategory(String),
    #[error("invalid row id: {0}")]
    InvalidRowId(String),
    #[error("unknown sort direction: {0}")]
    InvalidSortDirection(String),
}

pub type Result<T> = std::result::Result<T, ModelError>;
