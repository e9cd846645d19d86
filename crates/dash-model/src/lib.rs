//! Data model for the analytics dashboard engine.
//!
//! Records are immutable string maps produced by CSV ingestion. Rows wrap a
//! record with an id and a selection flag, and are owned by exactly one
//! category of the fixed [`CategoryKey`] taxonomy.

pub mod error;
pub mod ids;
pub mod numeric;
pub mod table;

pub use error::{ModelError, Result};
pub use ids::{CategoryKey, RowId};
pub use numeric::{metric_or_zero, normalize_numeric, parse_metric};
pub use table::{Record, Row, SortDirection};
