//! Error types for table loading.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading a table.
#[derive(Debug, Error)]
pub enum IngestError {
    // === File System Errors ===
    /// Input file not found.
    #[error("CSV file not found: {path}")]
    FileNotFound { path: PathBuf },

    /// Failed to read file.
    #[error("failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // === CSV Parsing Errors ===
    /// Failed to parse CSV with Polars.
    #[error("failed to parse CSV {path}: {message}")]
    CsvParse { path: PathBuf, message: String },

    /// CSV file has no header line.
    #[error("CSV file is empty: {path}")]
    EmptyCsv { path: PathBuf },

    /// Two header cells normalize to the same column name.
    #[error("duplicate column '{column}' in {path} after lower-casing")]
    DuplicateColumn { column: String, path: PathBuf },

    // === Schema Errors ===
    /// A declared column is absent from the table.
    #[error("schema mismatch in {table}: required column '{column}' not found")]
    SchemaMismatch { table: String, column: String },

    /// A declared column holds values that cannot be read as its kind.
    #[error("column '{column}' in {table} has {count} value(s) that are not {expected}")]
    ColumnType {
        table: String,
        column: String,
        expected: &'static str,
        count: usize,
    },

    // === DataFrame Errors ===
    /// Failed DataFrame operation.
    #[error("DataFrame operation failed: {message}")]
    DataFrame { message: String },
}

impl From<polars::prelude::PolarsError> for IngestError {
    fn from(err: polars::prelude::PolarsError) -> Self {
        Self::DataFrame {
            message: err.to_string(),
        }
    }
}

/// Result type for ingestion operations.
pub type Result<T> = std::result::Result<T, IngestError>;
