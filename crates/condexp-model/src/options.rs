//! Configuration options for the linkage pipeline.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::OptionsError;

/// Largest number of diagnosis code columns a condition row carries.
pub const MAX_CODE_COLUMNS: usize = 3;

/// How the target code is matched against a condition's codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodeMatch {
    /// Target must equal one of the codes.
    #[default]
    Token,
    /// Target may appear anywhere in the concatenated codes.
    Substring,
}

/// Source column names for the fixed parts of each table.
///
/// Names are matched after lower-casing the file headers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceColumns {
    pub person_id: String,
    pub stratum: String,
    pub cluster: String,
    pub weight: String,
    pub condition_id: String,
    pub event_id: String,
    pub event_type: String,
}

impl Default for SourceColumns {
    fn default() -> Self {
        Self {
            person_id: "dupersid".to_string(),
            stratum: "varstr".to_string(),
            cluster: "varpsu".to_string(),
            weight: "perwt18f".to_string(),
            condition_id: "condidx".to_string(),
            event_id: "evntidx".to_string(),
            event_type: "eventype".to_string(),
        }
    }
}

/// One event table and the link-table code that selects its events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventCategory {
    /// Short label used as output column prefix (e.g. `office`).
    pub label: String,
    /// Event-type code in the link table.
    pub event_type: i64,
    /// Source column holding the per-event cost.
    pub cost_column: String,
    /// Source column holding the per-event utilization count, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub utilization_column: Option<String>,
}

impl EventCategory {
    pub fn new(label: impl Into<String>, event_type: i64, cost_column: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            event_type,
            cost_column: cost_column.into(),
            utilization_column: None,
        }
    }

    #[must_use]
    pub fn with_utilization(mut self, column: impl Into<String>) -> Self {
        self.utilization_column = Some(column.into());
        self
    }

    /// Office-based medical provider visits.
    pub fn office_based() -> Self {
        Self::new("office", 1, "obxp18x")
    }

    /// Hospital inpatient stays, with nights as utilization.
    pub fn inpatient() -> Self {
        Self::new("inpatient", 4, "ipxp18x").with_utilization("numnighx")
    }
}

/// Options controlling one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineOptions {
    /// Diagnosis code identifying the target condition.
    pub target_code: String,
    /// Condition columns searched for the target code.
    pub code_columns: Vec<String>,
    pub code_match: CodeMatch,
    pub source_columns: SourceColumns,
    /// Cohort totals carried through to the output unchanged.
    pub carried_totals: Vec<String>,
    pub categories: Vec<EventCategory>,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            target_code: "NVS010".to_string(),
            code_columns: vec![
                "ccsr1x".to_string(),
                "ccsr2x".to_string(),
                "ccsr3x".to_string(),
            ],
            code_match: CodeMatch::Token,
            source_columns: SourceColumns::default(),
            carried_totals: vec!["totexp18".to_string()],
            categories: vec![EventCategory::office_based(), EventCategory::inpatient()],
        }
    }
}

impl PipelineOptions {
    pub fn new(target_code: impl Into<String>) -> Self {
        Self {
            target_code: target_code.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_categories(mut self, categories: Vec<EventCategory>) -> Self {
        self.categories = categories;
        self
    }

    /// Look up a category by label.
    pub fn category(&self, label: &str) -> Option<&EventCategory> {
        self.categories.iter().find(|c| c.label == label)
    }

    /// Check the options before any table is touched.
    ///
    /// # Errors
    ///
    /// Returns the first inconsistency found.
    pub fn validate(&self) -> Result<(), OptionsError> {
        if self.target_code.trim().is_empty() {
            return Err(OptionsError::EmptyTargetCode);
        }
        if self.code_columns.is_empty() {
            return Err(OptionsError::NoCodeColumns);
        }
        if self.code_columns.len() > MAX_CODE_COLUMNS {
            return Err(OptionsError::TooManyCodeColumns {
                count: self.code_columns.len(),
                max: MAX_CODE_COLUMNS,
            });
        }
        let sources = &self.source_columns;
        for (field, name) in [
            ("person_id", &sources.person_id),
            ("stratum", &sources.stratum),
            ("cluster", &sources.cluster),
            ("weight", &sources.weight),
            ("condition_id", &sources.condition_id),
            ("event_id", &sources.event_id),
            ("event_type", &sources.event_type),
        ] {
            if name.trim().is_empty() {
                return Err(OptionsError::EmptyColumnName {
                    field: field.to_string(),
                });
            }
        }
        if self.categories.is_empty() {
            return Err(OptionsError::NoCategories);
        }
        let mut labels = BTreeMap::new();
        let mut event_types: BTreeMap<i64, &str> = BTreeMap::new();
        for category in &self.categories {
            validate_label(&category.label)?;
            if category.cost_column.trim().is_empty() {
                return Err(OptionsError::EmptyColumnName {
                    field: format!("{}.cost_column", category.label),
                });
            }
            if labels.insert(category.label.as_str(), ()).is_some() {
                return Err(OptionsError::DuplicateLabel {
                    label: category.label.clone(),
                });
            }
            if let Some(first) = event_types.insert(category.event_type, &category.label) {
                return Err(OptionsError::DuplicateEventType {
                    event_type: category.event_type,
                    first: first.to_string(),
                    second: category.label.clone(),
                });
            }
        }
        Ok(())
    }
}

fn validate_label(label: &str) -> Result<(), OptionsError> {
    let invalid = |reason| OptionsError::InvalidLabel {
        label: label.to_string(),
        reason,
    };
    let mut chars = label.chars();
    let Some(first) = chars.next() else {
        return Err(invalid("label is empty"));
    };
    if !first.is_ascii_lowercase() {
        return Err(invalid("must start with a lowercase letter"));
    }
    if !chars.all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '_') {
        return Err(invalid("only lowercase letters, digits and '_' are allowed"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_options_are_valid() {
        assert_eq!(PipelineOptions::default().validate(), Ok(()));
    }

    #[test]
    fn rejects_blank_target() {
        let options = PipelineOptions::new("  ");
        assert_eq!(options.validate(), Err(OptionsError::EmptyTargetCode));
    }

    #[test]
    fn rejects_duplicate_event_type() {
        let options = PipelineOptions::default().with_categories(vec![
            EventCategory::new("office", 1, "obxp18x"),
            EventCategory::new("clinic", 1, "opxp18x"),
        ]);
        assert!(matches!(
            options.validate(),
            Err(OptionsError::DuplicateEventType { event_type: 1, .. })
        ));
    }

    #[test]
    fn rejects_duplicate_label() {
        let options = PipelineOptions::default().with_categories(vec![
            EventCategory::new("office", 1, "obxp18x"),
            EventCategory::new("office", 2, "opxp18x"),
        ]);
        assert!(matches!(
            options.validate(),
            Err(OptionsError::DuplicateLabel { .. })
        ));
    }

    #[test]
    fn rejects_label_that_is_not_a_column_prefix() {
        let options = PipelineOptions::default()
            .with_categories(vec![EventCategory::new("Office Visits", 1, "obxp18x")]);
        assert!(matches!(
            options.validate(),
            Err(OptionsError::InvalidLabel { .. })
        ));
    }

    #[test]
    fn rejects_too_many_code_columns() {
        let mut options = PipelineOptions::default();
        options.code_columns.push("ccsr4x".to_string());
        assert_eq!(
            options.validate(),
            Err(OptionsError::TooManyCodeColumns { count: 4, max: 3 })
        );
    }

    #[test]
    fn partial_config_fills_defaults() {
        let options: PipelineOptions =
            serde_json::from_str(r#"{"target_code": "CIR007", "code_match": "substring"}"#)
                .expect("parse options");
        assert_eq!(options.target_code, "CIR007");
        assert_eq!(options.code_match, CodeMatch::Substring);
        assert_eq!(options.categories.len(), 2);
        assert_eq!(options.source_columns.weight, "perwt18f");
    }
}
