//! Error types for the linkage pipeline.
//!
//! Every variant except [`PipelineError::DataFrame`] is a logic or schema
//! defect in the inputs. None of them is retried.

use thiserror::Error;

use condexp_model::OptionsError;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid pipeline options: {0}")]
    Options(#[from] OptionsError),

    /// An expected column is absent from an input table.
    #[error("schema mismatch in {table}: required column '{column}' not found")]
    SchemaMismatch { table: String, column: String },

    /// The link filter let through a row of another event type.
    #[error(
        "event-type contamination in '{category}': expected code {expected}, found {found}"
    )]
    EventTypeContamination {
        category: String,
        expected: i64,
        found: i64,
    },

    /// A person-indexed table no longer has one row per cohort person.
    #[error("row count invariant violated after {stage}: expected {expected} rows, got {actual}")]
    RowCountInvariantViolation {
        stage: String,
        expected: usize,
        actual: usize,
    },

    /// A join produced more rows than its left side allows.
    #[error("join fan-out in {stage}: at most {bound} rows expected, got {actual}")]
    JoinFanOut {
        stage: String,
        bound: usize,
        actual: usize,
    },

    /// A key expected to be unique occurs more than once.
    #[error("duplicate key in {table}: {count} key value(s) repeat, first: {example}")]
    DuplicateKey {
        table: String,
        count: usize,
        example: String,
    },

    #[error("null key in {table}: column '{column}' has {count} null value(s)")]
    NullKey {
        table: String,
        column: String,
        count: usize,
    },

    /// A weight, cost or utilization value is negative, NaN or infinite.
    #[error("invalid values in {table}: column '{column}' has {count} negative or non-finite value(s), first: {example}")]
    InvalidValue {
        table: String,
        column: String,
        count: usize,
        example: String,
    },

    /// A numeric output column still has nulls after zero-fill.
    #[error("column '{column}' has {count} null value(s) after zero-fill")]
    UnfilledNull { column: String, count: usize },

    #[error("no event table loaded for category '{label}'")]
    MissingEventTable { label: String },

    #[error("DataFrame operation failed: {message}")]
    DataFrame { message: String },
}

impl From<polars::prelude::PolarsError> for PipelineError {
    fn from(err: polars::prelude::PolarsError) -> Self {
        Self::DataFrame {
            message: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_count_message_names_stage() {
        let err = PipelineError::RowCountInvariantViolation {
            stage: "person aggregate [office]".to_string(),
            expected: 3,
            actual: 4,
        };
        assert_eq!(
            err.to_string(),
            "row count invariant violated after person aggregate [office]: expected 3 rows, got 4"
        );
    }

    #[test]
    fn options_errors_convert() {
        let err: PipelineError = OptionsError::NoCategories.into();
        assert!(matches!(err, PipelineError::Options(OptionsError::NoCategories)));
    }
}
