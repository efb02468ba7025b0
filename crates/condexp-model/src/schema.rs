//! Statically declared schemas for each table role.
//!
//! A [`TableSchema`] lists the columns a role must provide, their value kind,
//! and the canonical name each source column is renamed to on load.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::columns::{
    CLUSTER, CONDITION_ID, COST, EVENT_ID, EVENT_TYPE, PERSON_ID, STRATUM, UTILIZATION, WEIGHT,
};
use crate::options::{EventCategory, PipelineOptions};

/// Value kind of a declared column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnKind {
    Text,
    Integer,
    Float,
}

impl ColumnKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ColumnKind::Text => "str",
            ColumnKind::Integer => "i64",
            ColumnKind::Float => "f64",
        }
    }
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One declared column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    /// Lower-cased name in the source file.
    pub source: String,
    /// Name inside the pipeline.
    pub canonical: String,
    pub kind: ColumnKind,
}

impl ColumnSpec {
    pub fn new(source: &str, canonical: &str, kind: ColumnKind) -> Self {
        Self {
            source: source.trim().to_lowercase(),
            canonical: canonical.to_string(),
            kind,
        }
    }

    /// Column whose canonical name equals its source name.
    pub fn passthrough(source: &str, kind: ColumnKind) -> Self {
        let name = source.trim().to_lowercase();
        Self::new(&name, &name, kind)
    }
}

/// Logical role of a table in the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TableRole {
    Cohort,
    Conditions,
    Link,
    Event(String),
}

impl fmt::Display for TableRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableRole::Cohort => f.write_str("cohort"),
            TableRole::Conditions => f.write_str("conditions"),
            TableRole::Link => f.write_str("link"),
            TableRole::Event(label) => write!(f, "events[{label}]"),
        }
    }
}

/// Declared columns of one table role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    pub role: TableRole,
    pub columns: Vec<ColumnSpec>,
}

impl TableSchema {
    /// Cohort: person key plus carried totals.
    pub fn cohort(options: &PipelineOptions) -> Self {
        let src = &options.source_columns;
        let mut columns = vec![
            ColumnSpec::new(&src.person_id, PERSON_ID, ColumnKind::Text),
            ColumnSpec::new(&src.stratum, STRATUM, ColumnKind::Integer),
            ColumnSpec::new(&src.cluster, CLUSTER, ColumnKind::Integer),
            ColumnSpec::new(&src.weight, WEIGHT, ColumnKind::Float),
        ];
        columns.extend(
            options
                .carried_totals
                .iter()
                .map(|name| ColumnSpec::passthrough(name, ColumnKind::Float)),
        );
        Self {
            role: TableRole::Cohort,
            columns,
        }
    }

    /// Conditions: person, condition id and the diagnosis code columns.
    pub fn conditions(options: &PipelineOptions) -> Self {
        let src = &options.source_columns;
        let mut columns = vec![
            ColumnSpec::new(&src.person_id, PERSON_ID, ColumnKind::Text),
            ColumnSpec::new(&src.condition_id, CONDITION_ID, ColumnKind::Text),
        ];
        columns.extend(
            options
                .code_columns
                .iter()
                .map(|name| ColumnSpec::passthrough(name, ColumnKind::Text)),
        );
        Self {
            role: TableRole::Conditions,
            columns,
        }
    }

    /// Link: condition-to-event associations tagged with an event type.
    pub fn link(options: &PipelineOptions) -> Self {
        let src = &options.source_columns;
        Self {
            role: TableRole::Link,
            columns: vec![
                ColumnSpec::new(&src.person_id, PERSON_ID, ColumnKind::Text),
                ColumnSpec::new(&src.condition_id, CONDITION_ID, ColumnKind::Text),
                ColumnSpec::new(&src.event_id, EVENT_ID, ColumnKind::Text),
                ColumnSpec::new(&src.event_type, EVENT_TYPE, ColumnKind::Integer),
            ],
        }
    }

    /// Events of one category: person, event id, cost and optional utilization.
    pub fn event(options: &PipelineOptions, category: &EventCategory) -> Self {
        let src = &options.source_columns;
        let mut columns = vec![
            ColumnSpec::new(&src.person_id, PERSON_ID, ColumnKind::Text),
            ColumnSpec::new(&src.event_id, EVENT_ID, ColumnKind::Text),
            ColumnSpec::new(&category.cost_column, COST, ColumnKind::Float),
        ];
        if let Some(util) = &category.utilization_column {
            columns.push(ColumnSpec::new(util, UTILIZATION, ColumnKind::Integer));
        }
        Self {
            role: TableRole::Event(category.label.clone()),
            columns,
        }
    }

    /// Every schema the options describe, cohort first.
    pub fn all(options: &PipelineOptions) -> Vec<Self> {
        let mut schemas = vec![
            Self::cohort(options),
            Self::conditions(options),
            Self::link(options),
        ];
        schemas.extend(
            options
                .categories
                .iter()
                .map(|category| Self::event(options, category)),
        );
        schemas
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canonical_names(schema: &TableSchema) -> Vec<&str> {
        schema.columns.iter().map(|c| c.canonical.as_str()).collect()
    }

    #[test]
    fn cohort_schema_renames_weight() {
        let schema = TableSchema::cohort(&PipelineOptions::default());
        let weight = schema
            .columns
            .iter()
            .find(|c| c.canonical == WEIGHT)
            .expect("weight column");
        assert_eq!(weight.source, "perwt18f");
        assert_eq!(weight.kind, ColumnKind::Float);
        assert_eq!(
            canonical_names(&schema),
            vec![PERSON_ID, STRATUM, CLUSTER, WEIGHT, "totexp18"]
        );
    }

    #[test]
    fn source_names_are_lowercased() {
        let spec = ColumnSpec::new(" DUPERSID ", PERSON_ID, ColumnKind::Text);
        assert_eq!(spec.source, "dupersid");
    }

    #[test]
    fn event_schema_includes_utilization_only_when_configured() {
        let options = PipelineOptions::default();
        let office = TableSchema::event(&options, &EventCategory::office_based());
        let inpatient = TableSchema::event(&options, &EventCategory::inpatient());
        assert_eq!(canonical_names(&office), vec![PERSON_ID, EVENT_ID, COST]);
        assert_eq!(
            canonical_names(&inpatient),
            vec![PERSON_ID, EVENT_ID, COST, UTILIZATION]
        );
        assert_eq!(inpatient.role.to_string(), "events[inpatient]");
    }

    #[test]
    fn all_lists_one_schema_per_event_category() {
        let schemas = TableSchema::all(&PipelineOptions::default());
        assert_eq!(schemas.len(), 5);
        assert_eq!(schemas[0].role, TableRole::Cohort);
    }
}
