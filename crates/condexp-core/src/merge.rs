//! Cohort Merger: assembles the comprehensive person-level record.

use polars::prelude::*;

use condexp_model::columns::{COND_TOTAL_COST, HAS_CONDITION, PERSON_ID, PERSON_KEY};

use crate::aggregate::PersonAggregate;
use crate::error::Result;
use crate::guards::{
    ensure_no_numeric_nulls, ensure_row_count, ensure_unique_keys, is_numeric, key_exprs,
    require_columns,
};

/// Left-join every category aggregate and the condition presence onto the
/// cohort.
///
/// The result has one row per cohort person, sorted by `dupersid`, with
/// every numeric column zero-filled.
pub fn merge_cohort(
    cohort: &DataFrame,
    aggregates: &[PersonAggregate],
    presence: &DataFrame,
) -> Result<DataFrame> {
    require_columns(cohort, "cohort", &PERSON_KEY)?;
    let expected = cohort.height();

    let mut merged = cohort.clone();
    for aggregate in aggregates {
        let mut selected: Vec<&str> = PERSON_KEY.to_vec();
        selected.extend(aggregate.columns.all());
        let stage = format!("cohort merge [{}]", aggregate.label);
        require_columns(&aggregate.frame, &stage, &selected)?;

        let right = aggregate.frame.clone().lazy().select(key_exprs(&selected));
        merged = merged
            .lazy()
            .join(
                right,
                key_exprs(&PERSON_KEY),
                key_exprs(&PERSON_KEY),
                JoinArgs::new(JoinType::Left),
            )
            .collect()?;
        ensure_row_count(&stage, expected, &merged)?;
    }

    let fills: Vec<Expr> = merged
        .get_columns()
        .iter()
        .filter(|column| is_numeric(column.dtype()))
        .filter(|column| !PERSON_KEY.contains(&column.name().as_str()))
        .map(|column| col(column.name().clone()).fill_null(lit(0)))
        .collect();
    let total_cost = aggregates
        .iter()
        .map(|aggregate| col(aggregate.columns.cost.as_str()))
        .reduce(|acc, cost| acc + cost)
        .unwrap_or_else(|| lit(0.0));

    require_columns(presence, "condition presence", &[PERSON_ID, HAS_CONDITION])?;
    ensure_unique_keys(presence, "condition presence", &[PERSON_ID])?;
    let presence_persons = presence.height();
    let presence = presence
        .clone()
        .lazy()
        .select([col(PERSON_ID), col(HAS_CONDITION)]);

    let merged = merged
        .lazy()
        .with_columns(fills)
        .with_column(total_cost.alias(COND_TOTAL_COST))
        .join(
            presence,
            [col(PERSON_ID)],
            [col(PERSON_ID)],
            JoinArgs::new(JoinType::Left),
        )
        .with_column(col(HAS_CONDITION).fill_null(lit(0i32)))
        .sort([PERSON_ID], SortMultipleOptions::default())
        .collect()?;
    ensure_row_count("condition presence merge", expected, &merged)?;
    ensure_no_numeric_nulls(&merged)?;

    let flagged = merged
        .column(HAS_CONDITION)?
        .i32()?
        .into_iter()
        .filter(|flag| *flag == Some(1))
        .count();
    let outside = presence_persons.saturating_sub(flagged);
    if outside > 0 {
        tracing::warn!(
            persons = outside,
            "persons with the condition are not in the cohort"
        );
    }
    tracing::info!(
        persons = merged.height(),
        columns = merged.width(),
        with_condition = flagged,
        "merged comprehensive record"
    );
    Ok(merged)
}
