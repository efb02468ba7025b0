//! Weighted point estimates over the comprehensive record.
//!
//! Population means use the person weight only. No variance or confidence
//! intervals are produced.

use anyhow::{Context, Result, bail};
use comfy_table::{Cell, CellAlignment, Table};
use polars::prelude::{DataFrame, DataType, IntoLazy, col, lit};
use serde::{Deserialize, Serialize};

use condexp_model::columns::{HAS_CONDITION, WEIGHT};

use crate::summary::{align_column, apply_table_style, header_cell};

const WEIGHTED_SUM: &str = "__weighted_sum";
const WEIGHT_SUM: &str = "__weight_sum";

/// Reporting settings. Passed explicitly; nothing here affects the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportOptions {
    /// Decimal places in rendered estimates.
    pub decimals: usize,
    /// Columns to estimate. Empty means every cost and utilization column.
    pub metrics: Vec<String>,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            decimals: 2,
            metrics: Vec::new(),
        }
    }
}

/// Rows a mean is taken over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subgroup {
    All,
    /// Persons with `has_condition == 1`.
    WithCondition,
}

/// Weighted means of one metric.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Estimate {
    pub metric: String,
    /// Mean over all persons.
    pub population: Option<f64>,
    /// Mean over persons with the condition.
    pub with_condition: Option<f64>,
}

/// Weighted mean `sum(w * x) / sum(w)` of `value` over `subgroup`.
///
/// Returns `None` when the selected rows carry no weight.
pub fn weighted_mean(
    df: &DataFrame,
    value: &str,
    weight: &str,
    subgroup: Subgroup,
) -> Result<Option<f64>> {
    df.column(value)
        .with_context(|| format!("metric column '{value}'"))?;
    df.column(weight)
        .with_context(|| format!("weight column '{weight}'"))?;
    let mut rows = df
        .clone()
        .lazy()
        .filter(col(value).is_not_null().and(col(weight).is_not_null()));
    if subgroup == Subgroup::WithCondition {
        df.column(HAS_CONDITION)
            .context("subgroup needs the has_condition column")?;
        rows = rows.filter(col(HAS_CONDITION).cast(DataType::Int32).eq(lit(1i32)));
    }

    let x = col(value).cast(DataType::Float64);
    let w = col(weight).cast(DataType::Float64);
    let sums = rows
        .select([
            (x * w.clone()).sum().alias(WEIGHTED_SUM),
            w.sum().alias(WEIGHT_SUM),
        ])
        .collect()?;
    let weighted = sums.column(WEIGHTED_SUM)?.f64()?.get(0).unwrap_or(0.0);
    let total = sums.column(WEIGHT_SUM)?.f64()?.get(0).unwrap_or(0.0);
    if total == 0.0 {
        return Ok(None);
    }
    Ok(Some(weighted / total))
}

/// Metric columns the report covers.
pub fn metric_columns(df: &DataFrame, options: &ReportOptions) -> Result<Vec<String>> {
    if !options.metrics.is_empty() {
        for metric in &options.metrics {
            if df.column(metric).is_err() {
                bail!("report metric '{metric}' is not an output column");
            }
        }
        return Ok(options.metrics.clone());
    }
    Ok(df
        .get_column_names()
        .into_iter()
        .filter(|name| name.ends_with("_cost") || name.ends_with("_util"))
        .map(ToString::to_string)
        .collect())
}

/// Population and subgroup estimates for every metric.
pub fn estimate_all(df: &DataFrame, options: &ReportOptions) -> Result<Vec<Estimate>> {
    metric_columns(df, options)?
        .into_iter()
        .map(|metric| {
            Ok(Estimate {
                population: weighted_mean(df, &metric, WEIGHT, Subgroup::All)?,
                with_condition: weighted_mean(df, &metric, WEIGHT, Subgroup::WithCondition)?,
                metric,
            })
        })
        .collect()
}

pub fn format_estimate(value: Option<f64>, decimals: usize) -> String {
    match value {
        Some(v) => format!("{v:.decimals$}"),
        None => "-".to_string(),
    }
}

/// Estimates as a terminal table.
pub fn estimate_table(estimates: &[Estimate], decimals: usize) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Metric"),
        header_cell("Mean (all persons)"),
        header_cell("Mean (with condition)"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    align_column(&mut table, 2, CellAlignment::Right);
    for estimate in estimates {
        table.add_row(vec![
            Cell::new(&estimate.metric),
            Cell::new(format_estimate(estimate.population, decimals)),
            Cell::new(format_estimate(estimate.with_condition, decimals)),
        ]);
    }
    table
}
