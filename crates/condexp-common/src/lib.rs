//! Shared utilities for condexp crates.
//!
//! Polars helpers used across the workspace for diagnostics and reporting.

pub mod polars;

pub use polars::{any_to_string, column_value_string, describe_row, format_numeric, missing_columns};
