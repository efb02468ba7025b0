//! Event Attributor: attaches event records to resolved associations.

use polars::prelude::*;

use condexp_model::EventCategory;
use condexp_model::columns::{COND_FLAG, EVENT_KEY};

use crate::error::{PipelineError, Result};
use crate::guards::{ensure_unique_keys, key_exprs, require_columns, validate_events};

/// Events of one category attributed to the target condition.
#[derive(Debug, Clone)]
pub struct Attribution {
    /// Event rows with `cond_flag = 1`, one per association that matched.
    pub events: DataFrame,
    /// Associations with no event record.
    pub orphans: usize,
}

/// Inner-join `events` with `associations` on `(dupersid, evntidx)`.
///
/// Each association matches at most one event, so the result never has more
/// rows than `associations`. Event keys must be unique and cost and
/// utilization non-negative.
pub fn attribute_events(
    events: &DataFrame,
    associations: &DataFrame,
    category: &EventCategory,
) -> Result<Attribution> {
    let table = format!("events[{}]", category.label);
    ensure_unique_keys(events, &table, &EVENT_KEY)?;
    validate_events(events, category)?;
    require_columns(associations, "associations", &EVENT_KEY)?;

    let attributed = events
        .clone()
        .lazy()
        .join(
            associations.clone().lazy(),
            key_exprs(&EVENT_KEY),
            key_exprs(&EVENT_KEY),
            JoinArgs::new(JoinType::Inner),
        )
        .with_column(lit(1i32).alias(COND_FLAG))
        .sort(EVENT_KEY.to_vec(), SortMultipleOptions::default())
        .collect()?;

    if attributed.height() > associations.height() {
        return Err(PipelineError::JoinFanOut {
            stage: format!("event attribution [{}]", category.label),
            bound: associations.height(),
            actual: attributed.height(),
        });
    }
    let orphans = associations.height() - attributed.height();
    if orphans > 0 {
        tracing::warn!(
            category = %category.label,
            orphans,
            "associations without a matching event record"
        );
    }
    tracing::debug!(
        category = %category.label,
        attributed = attributed.height(),
        "attributed events"
    );
    Ok(Attribution {
        events: attributed,
        orphans,
    })
}
