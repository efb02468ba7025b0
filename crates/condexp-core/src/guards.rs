//! Executable invariants checked directly after the operation that can
//! break them.

use polars::prelude::*;

use condexp_common::{describe_row, missing_columns};
use condexp_model::EventCategory;
use condexp_model::columns::{COST, EVENT_KEY, PERSON_ID, PERSON_KEY, UTILIZATION, WEIGHT};

use crate::error::{PipelineError, Result};

const ROWS: &str = "__rows";

/// Column expressions for a key.
pub(crate) fn key_exprs(keys: &[&str]) -> Vec<Expr> {
    keys.iter().map(|name| col(*name)).collect()
}

/// Fails with `SchemaMismatch` on the first absent column.
pub fn require_columns(df: &DataFrame, table: &str, columns: &[&str]) -> Result<()> {
    match missing_columns(df, columns).first() {
        Some(column) => Err(PipelineError::SchemaMismatch {
            table: table.to_string(),
            column: (*column).to_string(),
        }),
        None => Ok(()),
    }
}

/// Fails with `DuplicateKey` when any key value occurs more than once.
pub fn ensure_unique_keys(df: &DataFrame, table: &str, keys: &[&str]) -> Result<()> {
    require_columns(df, table, keys)?;
    let repeated = df
        .clone()
        .lazy()
        .group_by(key_exprs(keys))
        .agg([len().alias(ROWS)])
        .filter(col(ROWS).gt(lit(1)))
        .sort(keys.to_vec(), SortMultipleOptions::default())
        .collect()?;
    if repeated.height() == 0 {
        return Ok(());
    }
    let example = format!(
        "{} ({} rows)",
        describe_row(&repeated, keys, 0),
        condexp_common::column_value_string(&repeated, ROWS, 0)
    );
    Err(PipelineError::DuplicateKey {
        table: table.to_string(),
        count: repeated.height(),
        example,
    })
}

/// Fails with `RowCountInvariantViolation` unless `df` has `expected` rows.
pub fn ensure_row_count(stage: &str, expected: usize, df: &DataFrame) -> Result<()> {
    if df.height() == expected {
        return Ok(());
    }
    Err(PipelineError::RowCountInvariantViolation {
        stage: stage.to_string(),
        expected,
        actual: df.height(),
    })
}

pub(crate) fn is_numeric(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

/// Fails with `UnfilledNull` on the first numeric column holding a null.
pub fn ensure_no_numeric_nulls(df: &DataFrame) -> Result<()> {
    for column in df.get_columns() {
        if !is_numeric(column.dtype()) {
            continue;
        }
        let count = column.null_count();
        if count > 0 {
            return Err(PipelineError::UnfilledNull {
                column: column.name().to_string(),
                count,
            });
        }
    }
    Ok(())
}

/// Fails with `InvalidValue` on the first column holding a negative, NaN or
/// infinite value. Nulls pass; they mean "no data" and are zero-filled later.
///
/// `describe_by` names the columns quoted in the error example.
pub fn ensure_non_negative(
    df: &DataFrame,
    table: &str,
    columns: &[&str],
    describe_by: &[&str],
) -> Result<()> {
    require_columns(df, table, columns)?;
    require_columns(df, table, describe_by)?;
    for &name in columns {
        let value = col(name).cast(DataType::Float64);
        let invalid = df
            .clone()
            .lazy()
            .filter(value.clone().lt(lit(0.0)).or(value.is_finite().not()))
            .collect()?;
        if invalid.height() == 0 {
            continue;
        }
        let mut shown = describe_by.to_vec();
        shown.push(name);
        return Err(PipelineError::InvalidValue {
            table: table.to_string(),
            column: name.to_string(),
            count: invalid.height(),
            example: describe_row(&invalid, &shown, 0),
        });
    }
    Ok(())
}

/// Checks the cohort can anchor person-level joins.
///
/// The composite key must be complete, the person identifier unique and
/// weights finite and non-negative. Zero weights (persons outside the survey
/// population) are allowed and logged.
pub fn validate_cohort(cohort: &DataFrame) -> Result<()> {
    require_columns(cohort, "cohort", &PERSON_KEY)?;
    for name in PERSON_KEY {
        let count = cohort.column(name)?.null_count();
        if count > 0 {
            return Err(PipelineError::NullKey {
                table: "cohort".to_string(),
                column: name.to_string(),
                count,
            });
        }
    }
    ensure_unique_keys(cohort, "cohort", &[PERSON_ID])?;
    ensure_non_negative(cohort, "cohort", &[WEIGHT], &[PERSON_ID])?;

    let zero = cohort
        .column(WEIGHT)?
        .f64()?
        .into_iter()
        .filter(|weight| *weight == Some(0.0))
        .count();
    if zero > 0 {
        tracing::warn!(persons = zero, "cohort persons with zero sampling weight");
    }
    Ok(())
}

/// Checks event values before attribution: cost and, when the category
/// declares it, utilization must be non-negative.
pub fn validate_events(events: &DataFrame, category: &EventCategory) -> Result<()> {
    let mut values = vec![COST];
    if category.utilization_column.is_some() {
        values.push(UTILIZATION);
    }
    ensure_non_negative(
        events,
        &format!("events[{}]", category.label),
        &values,
        &EVENT_KEY,
    )
}
