//! CSV file reading into Polars DataFrames.

use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::Arc;

use polars::prelude::*;

use crate::error::{IngestError, Result};

use super::header::{normalize_header, parse_csv_line};

fn open(path: &Path) -> Result<File> {
    File::open(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            IngestError::FileNotFound {
                path: path.to_path_buf(),
            }
        } else {
            IngestError::FileRead {
                path: path.to_path_buf(),
                source: e,
            }
        }
    })
}

/// Reads the raw header cells of a CSV file.
pub fn read_csv_header(path: &Path) -> Result<Vec<String>> {
    let reader = BufReader::new(open(path)?);
    let Some(line) = reader.lines().next() else {
        return Err(IngestError::EmptyCsv {
            path: path.to_path_buf(),
        });
    };
    let line = line.map_err(|e| IngestError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    // Skip BOM if present
    let cleaned = line.strip_prefix('\u{feff}').unwrap_or(&line);
    let columns = parse_csv_line(cleaned);
    if columns.iter().all(String::is_empty) {
        return Err(IngestError::EmptyCsv {
            path: path.to_path_buf(),
        });
    }
    Ok(columns)
}

/// Reads a CSV file into a DataFrame with lower-cased column names.
///
/// Columns whose lower-cased name appears in `text_columns` are read as
/// strings so identifiers keep leading zeros; all others are inferred.
pub fn read_csv_table(path: &Path, text_columns: &[&str]) -> Result<DataFrame> {
    let header = read_csv_header(path)?;

    let mut overwrite = Schema::default();
    for raw in &header {
        if text_columns.contains(&normalize_header(raw).as_str()) {
            overwrite.with_column(raw.as_str().into(), DataType::String);
        }
    }

    let mut df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(1000))
        .with_schema_overwrite(Some(Arc::new(overwrite)))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .map_err(|e| IngestError::CsvParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?
        .finish()
        .map_err(|e| IngestError::CsvParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    let names: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|name| normalize_header(name.as_str()))
        .collect();
    let mut seen = BTreeSet::new();
    for name in &names {
        if !seen.insert(name.as_str()) {
            return Err(IngestError::DuplicateColumn {
                column: name.clone(),
                path: path.to_path_buf(),
            });
        }
    }
    df.set_column_names(names.iter().map(String::as_str))?;

    tracing::debug!(
        path = %path.display(),
        rows = df.height(),
        columns = df.width(),
        "read csv"
    );
    Ok(df)
}
