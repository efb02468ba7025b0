//! Table loading for the expenditure pipeline.
//!
//! This crate reads survey extracts (CSV) into Polars DataFrames and enforces
//! the statically declared schema of each table role at the load boundary.
//!
//! # Features
//!
//! - **CSV Loading**: header normalization to lowercase, identifiers read as text
//! - **Schema Enforcement**: required columns, dtype casts, canonical renames
//! - **Dataset Loading**: one call loads cohort, conditions, link and event tables
//!
//! # Example
//!
//! ```ignore
//! use condexp_ingest::{CsvDataset, load_dataset};
//! use condexp_model::PipelineOptions;
//!
//! let options = PipelineOptions::default();
//! let files = CsvDataset {
//!     cohort: "h209.csv".into(),
//!     conditions: "h207.csv".into(),
//!     link: "h206if1.csv".into(),
//!     events: [("office".to_string(), "h206g.csv".into())].into(),
//! };
//! let dataset = load_dataset(&files, &options)?;
//! ```

mod csv;
mod dataset;
mod error;
mod schema;

// === Error Types ===
pub use error::{IngestError, Result};

// === CSV Reading ===
pub use csv::{read_csv_header, read_csv_table};

// === Schema Enforcement ===
pub use schema::{apply_schema, column_dtype};

// === Dataset Loading ===
pub use dataset::{CsvDataset, Dataset, TableSource, load_dataset};
