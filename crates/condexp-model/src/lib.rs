//! Data model for the condition-specific expenditure pipeline.
//!
//! Table schemas per role, canonical column names, event category
//! definitions and the options that drive a pipeline run.

pub mod columns;
pub mod error;
pub mod options;
pub mod schema;

pub use columns::CategoryColumns;
pub use error::OptionsError;
pub use options::{CodeMatch, EventCategory, MAX_CODE_COLUMNS, PipelineOptions, SourceColumns};
pub use schema::{ColumnKind, ColumnSpec, TableRole, TableSchema};
