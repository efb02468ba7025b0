//! End-to-end run: condition filter, link resolution, attribution,
//! aggregation and the cohort merge.

use std::time::Instant;

use polars::prelude::DataFrame;
use serde::Serialize;
use tracing::{debug, info, info_span};

use condexp_ingest::Dataset;
use condexp_model::{EventCategory, PipelineOptions};

use crate::aggregate::{PersonAggregate, aggregate_persons};
use crate::attribution::attribute_events;
use crate::condition::{condition_presence, filter_conditions};
use crate::error::{PipelineError, Result};
use crate::guards::validate_cohort;
use crate::link::resolve_links;
use crate::merge::merge_cohort;

/// Counts collected for one event category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryReport {
    pub label: String,
    pub event_type: i64,
    /// Link rows of this event type.
    pub link_rows: usize,
    /// Link rows joined to a target condition.
    pub matched_link_rows: usize,
    /// Distinct `(person, event)` associations.
    pub associations: usize,
    pub orphan_associations: usize,
    pub attributed_events: usize,
    pub persons_with_events: usize,
    pub persons_outside_cohort: usize,
}

/// Counts collected over one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PipelineReport {
    pub target_code: String,
    pub cohort_persons: usize,
    pub matched_conditions: usize,
    pub persons_with_condition: usize,
    pub categories: Vec<CategoryReport>,
}

/// Result of a pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// One row per cohort person.
    pub comprehensive: DataFrame,
    /// Per-category person aggregates, in configured order.
    pub aggregates: Vec<PersonAggregate>,
    pub report: PipelineReport,
}

/// Canonical names of the carried cohort totals.
pub fn carried_columns(options: &PipelineOptions) -> Vec<String> {
    options
        .carried_totals
        .iter()
        .map(|name| name.trim().to_lowercase())
        .collect()
}

/// Run every stage over a loaded dataset.
///
/// # Errors
///
/// Returns the first failed invariant. Nothing is written on failure.
pub fn run_pipeline(dataset: &Dataset, options: &PipelineOptions) -> Result<PipelineOutput> {
    options.validate()?;
    validate_cohort(&dataset.cohort)?;
    let carried = carried_columns(options);

    let (subset, presence) = info_span!("condition_filter", target = %options.target_code)
        .in_scope(|| -> Result<_> {
            let start = Instant::now();
            let subset = filter_conditions(
                &dataset.conditions,
                &options.target_code,
                &options.code_columns,
                options.code_match,
            )?;
            let presence = condition_presence(&subset)?;
            debug!(
                matched = subset.height(),
                persons = presence.height(),
                duration_ms = start.elapsed().as_millis(),
                "condition filter complete"
            );
            Ok((subset, presence))
        })?;

    let mut aggregates = Vec::with_capacity(options.categories.len());
    let mut categories = Vec::with_capacity(options.categories.len());
    for category in &options.categories {
        let (aggregate, report) = info_span!("category", label = %category.label)
            .in_scope(|| run_category(dataset, &subset, category, &carried))?;
        aggregates.push(aggregate);
        categories.push(report);
    }

    let comprehensive = info_span!("cohort_merge")
        .in_scope(|| merge_cohort(&dataset.cohort, &aggregates, &presence))?;

    let report = PipelineReport {
        target_code: options.target_code.clone(),
        cohort_persons: comprehensive.height(),
        matched_conditions: subset.height(),
        persons_with_condition: presence.height(),
        categories,
    };
    info!(
        target = %report.target_code,
        persons = report.cohort_persons,
        persons_with_condition = report.persons_with_condition,
        categories = report.categories.len(),
        "pipeline complete"
    );
    Ok(PipelineOutput {
        comprehensive,
        aggregates,
        report,
    })
}

fn run_category(
    dataset: &Dataset,
    subset: &DataFrame,
    category: &EventCategory,
    carried: &[String],
) -> Result<(PersonAggregate, CategoryReport)> {
    let start = Instant::now();
    let events = dataset
        .events
        .get(&category.label)
        .ok_or_else(|| PipelineError::MissingEventTable {
            label: category.label.clone(),
        })?;

    let resolution = resolve_links(&dataset.link, subset, category)?;
    let attribution = attribute_events(events, &resolution.associations, category)?;
    let aggregate = aggregate_persons(&attribution.events, &dataset.cohort, category, carried)?;

    let report = CategoryReport {
        label: category.label.clone(),
        event_type: category.event_type,
        link_rows: resolution.link_rows,
        matched_link_rows: resolution.matched_rows,
        associations: resolution.associations.height(),
        orphan_associations: attribution.orphans,
        attributed_events: attribution.events.height(),
        persons_with_events: aggregate.persons_with_events,
        persons_outside_cohort: aggregate.outside_cohort,
    };
    debug!(
        associations = report.associations,
        attributed = report.attributed_events,
        duration_ms = start.elapsed().as_millis(),
        "category complete"
    );
    Ok((aggregate, report))
}
