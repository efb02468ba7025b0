//! Link Resolver: maps condition rows to the events of one category.

use polars::prelude::*;

use condexp_model::EventCategory;
use condexp_model::columns::{CONDITION_KEY, EVENT_KEY, EVENT_TYPE};

use crate::error::{PipelineError, Result};
use crate::guards::{key_exprs, require_columns};

/// Associations between target conditions and the events of one category.
#[derive(Debug, Clone)]
pub struct LinkResolution {
    /// Distinct `(dupersid, evntidx)` pairs, sorted.
    pub associations: DataFrame,
    /// Link rows of this category before the condition join.
    pub link_rows: usize,
    /// Link rows matching a target condition, before deduplication.
    pub matched_rows: usize,
}

/// Keep link rows whose event type equals `event_type`.
pub fn filter_event_type(link: &DataFrame, event_type: i64) -> Result<DataFrame> {
    require_columns(link, "link", &[EVENT_TYPE])?;
    let filtered = link
        .clone()
        .lazy()
        .filter(col(EVENT_TYPE).eq(lit(event_type)))
        .collect()?;
    Ok(filtered)
}

/// Fails with `EventTypeContamination` when any row's event type differs
/// from the category's.
pub fn ensure_event_type_purity(filtered: &DataFrame, category: &EventCategory) -> Result<()> {
    let types = filtered.column(EVENT_TYPE)?.i64()?;
    for found in types.into_iter().flatten() {
        if found != category.event_type {
            return Err(PipelineError::EventTypeContamination {
                category: category.label.clone(),
                expected: category.event_type,
                found,
            });
        }
    }
    Ok(())
}

/// Distinct event keys of a joined frame, sorted.
///
/// A condition that occurs twice for the same event (or two target conditions
/// linked to one event) must not count that event twice.
pub fn dedup_associations(joined: &DataFrame) -> Result<DataFrame> {
    require_columns(joined, "associations", &EVENT_KEY)?;
    let deduped = joined
        .clone()
        .lazy()
        .select(key_exprs(&EVENT_KEY))
        .unique_stable(None, UniqueKeepStrategy::First)
        .sort(EVENT_KEY.to_vec(), SortMultipleOptions::default())
        .collect()?;
    Ok(deduped)
}

/// Resolve which events of `category` are associated with a target condition.
pub fn resolve_links(
    link: &DataFrame,
    subset: &DataFrame,
    category: &EventCategory,
) -> Result<LinkResolution> {
    let mut required: Vec<&str> = CONDITION_KEY.to_vec();
    required.extend(EVENT_KEY);
    required.push(EVENT_TYPE);
    require_columns(link, "link", &required)?;
    require_columns(subset, "conditions", &CONDITION_KEY)?;

    let filtered = filter_event_type(link, category.event_type)?;
    ensure_event_type_purity(&filtered, category)?;

    let targets = subset
        .clone()
        .lazy()
        .select(key_exprs(&CONDITION_KEY))
        .unique_stable(None, UniqueKeepStrategy::First);
    let matched = filtered
        .clone()
        .lazy()
        .join(
            targets,
            key_exprs(&CONDITION_KEY),
            key_exprs(&CONDITION_KEY),
            JoinArgs::new(JoinType::Inner),
        )
        .collect()?;
    let associations = dedup_associations(&matched)?;

    tracing::debug!(
        category = %category.label,
        link_rows = filtered.height(),
        matched_rows = matched.height(),
        associations = associations.height(),
        "resolved condition links"
    );
    Ok(LinkResolution {
        associations,
        link_rows: filtered.height(),
        matched_rows: matched.height(),
    })
}
