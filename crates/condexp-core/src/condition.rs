//! Condition Filter: selects condition rows carrying the target code.

use polars::prelude::*;

use condexp_model::CodeMatch;
use condexp_model::columns::{CONDITION_KEY, HAS_CONDITION, PERSON_ID};

use crate::error::Result;
use crate::guards::require_columns;

fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

/// Whether `target` occurs in the space-joined `codes` of one condition.
///
/// Both sides are trimmed and compared case-insensitively. An empty target
/// never matches.
///
/// # Examples
///
/// ```
/// use condexp_core::code_matches;
/// use condexp_model::CodeMatch;
///
/// assert!(code_matches("CIR007 NVS010", "nvs010", CodeMatch::Token));
/// assert!(!code_matches("NVS0101", "NVS010", CodeMatch::Token));
/// assert!(code_matches("NVS0101", "NVS010", CodeMatch::Substring));
/// ```
pub fn code_matches(codes: &str, target: &str, mode: CodeMatch) -> bool {
    let target = normalize_code(target);
    if target.is_empty() {
        return false;
    }
    let codes = codes.to_uppercase();
    match mode {
        CodeMatch::Token => codes.split_whitespace().any(|token| token == target),
        CodeMatch::Substring => codes.contains(&target),
    }
}

/// Keep the condition rows whose code columns match `target`.
///
/// The schema is unchanged. A person may keep zero, one or several rows.
pub fn filter_conditions(
    conditions: &DataFrame,
    target: &str,
    code_columns: &[String],
    mode: CodeMatch,
) -> Result<DataFrame> {
    let mut required: Vec<&str> = CONDITION_KEY.to_vec();
    required.extend(code_columns.iter().map(String::as_str));
    require_columns(conditions, "conditions", &required)?;

    let codes = code_columns
        .iter()
        .map(|name| conditions.column(name).and_then(|column| column.str()))
        .collect::<PolarsResult<Vec<_>>>()?;

    let mut keep = Vec::with_capacity(conditions.height());
    let mut joined = String::new();
    for idx in 0..conditions.height() {
        joined.clear();
        for ca in &codes {
            let Some(code) = ca.get(idx).map(str::trim) else {
                continue;
            };
            if code.is_empty() {
                continue;
            }
            if !joined.is_empty() {
                joined.push(' ');
            }
            joined.push_str(code);
        }
        keep.push(code_matches(&joined, target, mode));
    }
    let mask = BooleanChunked::from_slice("condition_match".into(), &keep);
    let subset = conditions.filter(&mask)?;
    tracing::info!(
        target = %target,
        rows = conditions.height(),
        matched = subset.height(),
        "filtered conditions"
    );
    Ok(subset)
}

/// Distinct persons in a condition subset, each with `has_condition = 1`.
pub fn condition_presence(subset: &DataFrame) -> Result<DataFrame> {
    require_columns(subset, "conditions", &[PERSON_ID])?;
    let presence = subset
        .clone()
        .lazy()
        .select([col(PERSON_ID)])
        .unique_stable(None, UniqueKeepStrategy::First)
        .with_column(lit(1i32).alias(HAS_CONDITION))
        .sort([PERSON_ID], SortMultipleOptions::default())
        .collect()?;
    Ok(presence)
}
