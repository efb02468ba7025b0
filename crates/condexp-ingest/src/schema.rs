//! Schema enforcement at the load boundary.
//!
//! After this step every table holds exactly its declared columns, under
//! canonical names, with the declared dtypes. Downstream stages never
//! inspect source names again.

use polars::prelude::*;

use condexp_model::{ColumnKind, TableSchema};

use crate::error::{IngestError, Result};

/// Polars dtype for a declared column kind.
pub fn column_dtype(kind: ColumnKind) -> DataType {
    match kind {
        ColumnKind::Text => DataType::String,
        ColumnKind::Integer => DataType::Int64,
        ColumnKind::Float => DataType::Float64,
    }
}

/// Validate, cast and rename a raw table to its declared schema.
///
/// Column lookup uses the lower-cased source names. Values that become null
/// only because of the cast are reported as [`IngestError::ColumnType`];
/// nulls present in the source are kept.
///
/// # Errors
///
/// [`IngestError::SchemaMismatch`] when a declared column is absent.
pub fn apply_schema(df: &DataFrame, schema: &TableSchema) -> Result<DataFrame> {
    let table = schema.role.to_string();
    let mut columns = Vec::with_capacity(schema.columns.len());
    for spec in &schema.columns {
        let source = df
            .column(&spec.source)
            .map_err(|_| IngestError::SchemaMismatch {
                table: table.clone(),
                column: spec.source.clone(),
            })?;
        let dtype = column_dtype(spec.kind);
        let cast = source.cast(&dtype)?;
        let lost = cast.null_count().saturating_sub(source.null_count());
        if lost > 0 {
            return Err(IngestError::ColumnType {
                table,
                column: spec.source.clone(),
                expected: spec.kind.as_str(),
                count: lost,
            });
        }
        columns.push(cast.with_name(spec.canonical.as_str().into()));
    }
    let out = DataFrame::new(columns)?;
    tracing::debug!(
        table = %table,
        rows = out.height(),
        dropped_columns = df.width().saturating_sub(out.width()),
        "applied schema"
    );
    Ok(out)
}
