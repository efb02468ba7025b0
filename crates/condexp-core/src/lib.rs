//! Condition-to-event linkage and person-level aggregation.
//!
//! Stages, in run order:
//!
//! 1. **Condition Filter**: condition rows carrying the target code
//! 2. **Link Resolver**: distinct `(person, event)` pairs per category
//! 3. **Event Attributor**: event records for those pairs
//! 4. **Person Aggregator**: one row per cohort person and category
//! 5. **Cohort Merger**: the comprehensive person-level record
//!
//! Every stage that can change a table's cardinality is followed by a guard
//! from [`guards`]; a failed guard aborts the run with a [`PipelineError`].

mod aggregate;
mod attribution;
mod condition;
mod error;
pub mod guards;
mod link;
mod merge;
mod pipeline;

// === Error Types ===
pub use error::{PipelineError, Result};

// === Stages ===
pub use aggregate::{PersonAggregate, aggregate_persons};
pub use attribution::{Attribution, attribute_events};
pub use condition::{code_matches, condition_presence, filter_conditions};
pub use link::{
    LinkResolution, dedup_associations, ensure_event_type_purity, filter_event_type,
    resolve_links,
};
pub use merge::merge_cohort;

// === Pipeline ===
pub use pipeline::{CategoryReport, PipelineOutput, PipelineReport, carried_columns, run_pipeline};
