use thiserror::Error;

/// Errors raised while validating pipeline options.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OptionsError {
    #[error("target condition code is empty")]
    EmptyTargetCode,

    #[error("no diagnosis code columns configured")]
    NoCodeColumns,

    #[error("at most {max} diagnosis code columns are supported, got {count}")]
    TooManyCodeColumns { count: usize, max: usize },

    #[error("no event categories configured")]
    NoCategories,

    #[error("invalid event category label '{label}': {reason}")]
    InvalidLabel { label: String, reason: &'static str },

    #[error("event category label '{label}' is configured more than once")]
    DuplicateLabel { label: String },

    #[error("event type {event_type} is used by both '{first}' and '{second}'")]
    DuplicateEventType {
        event_type: i64,
        first: String,
        second: String,
    },

    #[error("source column name for {field} is empty")]
    EmptyColumnName { field: String },
}
