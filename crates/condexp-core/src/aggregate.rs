//! Person Aggregator: rolls attributed events up to one row per cohort person.

use polars::prelude::*;

use condexp_model::columns::{COND_FLAG, COST, PERSON_ID, PERSON_KEY, UTILIZATION};
use condexp_model::{CategoryColumns, EventCategory};

use crate::error::Result;
use crate::guards::{ensure_row_count, key_exprs, require_columns};

const IN_COHORT: &str = "__in_cohort";

/// Person-level totals for one event category.
#[derive(Debug, Clone)]
pub struct PersonAggregate {
    pub label: String,
    /// Composite key, category columns and carried totals, sorted by person.
    pub frame: DataFrame,
    pub columns: CategoryColumns,
    /// Cohort persons with at least one attributed event.
    pub persons_with_events: usize,
    /// Persons with attributed events who are not in the cohort.
    pub outside_cohort: usize,
}

/// Aggregate attributed events to exactly one row per cohort person.
///
/// `carried` names cohort columns passed through with a mean reduction; they
/// are constant within a person, so the mean returns the cohort value.
///
/// # Errors
///
/// `SchemaMismatch` when an input lacks a required column and
/// `RowCountInvariantViolation` when the output is not cohort-sized.
pub fn aggregate_persons(
    attributed: &DataFrame,
    cohort: &DataFrame,
    category: &EventCategory,
    carried: &[String],
) -> Result<PersonAggregate> {
    let columns = CategoryColumns::new(&category.label, category.utilization_column.is_some());
    let mut event_columns = vec![PERSON_ID, COST, COND_FLAG];
    if columns.utilization.is_some() {
        event_columns.push(UTILIZATION);
    }
    require_columns(attributed, "attributed events", &event_columns)?;
    let mut cohort_columns: Vec<&str> = PERSON_KEY.to_vec();
    cohort_columns.extend(carried.iter().map(String::as_str));
    require_columns(cohort, "cohort", &cohort_columns)?;

    let cohort_side = cohort
        .clone()
        .lazy()
        .select(key_exprs(&cohort_columns))
        .with_column(lit(true).alias(IN_COHORT));
    let joined = attributed
        .clone()
        .lazy()
        .select(key_exprs(&event_columns))
        .join(
            cohort_side,
            [col(PERSON_ID)],
            [col(PERSON_ID)],
            JoinArgs::new(JoinType::Full).with_coalesce(JoinCoalesce::CoalesceColumns),
        )
        .collect()?;

    let outside_cohort = joined
        .clone()
        .lazy()
        .filter(col(IN_COHORT).is_null())
        .select([col(PERSON_ID)])
        .unique_stable(None, UniqueKeepStrategy::First)
        .collect()?
        .height();
    if outside_cohort > 0 {
        tracing::warn!(
            category = %category.label,
            persons = outside_cohort,
            "attributed events for persons outside the cohort dropped"
        );
    }

    let mut aggs = vec![
        col(COST).sum().alias(columns.cost.as_str()),
        col(COND_FLAG)
            .cast(DataType::Int64)
            .sum()
            .alias(columns.events.as_str()),
        col(COND_FLAG).max().alias(columns.flag.as_str()),
    ];
    let mut fills = vec![
        col(columns.cost.as_str()).fill_null(lit(0.0)),
        col(columns.events.as_str()).fill_null(lit(0i64)),
        col(columns.flag.as_str())
            .cast(DataType::Int32)
            .fill_null(lit(0i32)),
    ];
    if let Some(util) = &columns.utilization {
        aggs.push(
            col(UTILIZATION)
                .cast(DataType::Int64)
                .sum()
                .alias(util.as_str()),
        );
        fills.push(col(util.as_str()).fill_null(lit(0i64)));
    }
    for name in carried {
        aggs.push(col(name.as_str()).mean().alias(name.as_str()));
        fills.push(col(name.as_str()).fill_null(lit(0.0)));
    }

    let mut output: Vec<&str> = PERSON_KEY.to_vec();
    output.extend(columns.all());
    output.extend(carried.iter().map(String::as_str));

    let frame = joined
        .lazy()
        .filter(col(IN_COHORT).is_not_null())
        .group_by(key_exprs(&PERSON_KEY))
        .agg(aggs)
        .with_columns(fills)
        .select(key_exprs(&output))
        .sort([PERSON_ID], SortMultipleOptions::default())
        .collect()?;

    ensure_row_count(
        &format!("person aggregate [{}]", category.label),
        cohort.height(),
        &frame,
    )?;

    let persons_with_events = frame
        .column(&columns.events)?
        .i64()?
        .into_iter()
        .filter(|count| count.is_some_and(|n| n > 0))
        .count();
    tracing::info!(
        category = %category.label,
        persons = frame.height(),
        persons_with_events,
        "aggregated person totals"
    );
    Ok(PersonAggregate {
        label: category.label.clone(),
        frame,
        columns,
        persons_with_events,
        outside_cohort,
    })
}
