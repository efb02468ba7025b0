//! Table Loader: produces the validated base tables of one survey dataset.

use std::collections::BTreeMap;
use std::path::PathBuf;

use polars::prelude::DataFrame;

use condexp_model::{ColumnKind, PipelineOptions, TableRole, TableSchema};

use crate::csv::read_csv_table;
use crate::error::{IngestError, Result};
use crate::schema::apply_schema;

/// A source of raw tables addressed by role.
pub trait TableSource {
    /// Returns the raw table for `role` with lower-cased column names.
    ///
    /// `text_columns` lists lower-cased source columns to read as strings.
    fn raw_table(&self, role: &TableRole, text_columns: &[&str]) -> Result<DataFrame>;

    /// Load a table and enforce its schema.
    fn load(&self, schema: &TableSchema) -> Result<DataFrame> {
        let text: Vec<&str> = schema
            .columns
            .iter()
            .filter(|c| c.kind == ColumnKind::Text)
            .map(|c| c.source.as_str())
            .collect();
        let raw = self.raw_table(&schema.role, &text)?;
        apply_schema(&raw, schema)
    }
}

/// File locations for one dataset, one CSV per table role.
#[derive(Debug, Clone, Default)]
pub struct CsvDataset {
    pub cohort: PathBuf,
    pub conditions: PathBuf,
    pub link: PathBuf,
    /// Event files keyed by category label.
    pub events: BTreeMap<String, PathBuf>,
}

impl TableSource for CsvDataset {
    fn raw_table(&self, role: &TableRole, text_columns: &[&str]) -> Result<DataFrame> {
        let path = match role {
            TableRole::Cohort => &self.cohort,
            TableRole::Conditions => &self.conditions,
            TableRole::Link => &self.link,
            TableRole::Event(label) => {
                self.events
                    .get(label)
                    .ok_or_else(|| IngestError::SchemaMismatch {
                        table: role.to_string(),
                        column: format!("<no event file configured for '{label}'>"),
                    })?
            }
        };
        read_csv_table(path, text_columns)
    }
}

/// The base tables of one dataset, each under its canonical schema.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub cohort: DataFrame,
    pub conditions: DataFrame,
    pub link: DataFrame,
    /// Event tables keyed by category label.
    pub events: BTreeMap<String, DataFrame>,
}

/// Load every table the options describe.
///
/// # Errors
///
/// Fails on the first table that cannot be read or does not match its schema.
pub fn load_dataset(source: &impl TableSource, options: &PipelineOptions) -> Result<Dataset> {
    let cohort = load_role(source, &TableSchema::cohort(options))?;
    let conditions = load_role(source, &TableSchema::conditions(options))?;
    let link = load_role(source, &TableSchema::link(options))?;
    let mut events = BTreeMap::new();
    for category in &options.categories {
        let table = load_role(source, &TableSchema::event(options, category))?;
        events.insert(category.label.clone(), table);
    }
    Ok(Dataset {
        cohort,
        conditions,
        link,
        events,
    })
}

fn load_role(source: &impl TableSource, schema: &TableSchema) -> Result<DataFrame> {
    let df = source.load(schema)?;
    tracing::info!(
        table = %schema.role,
        rows = df.height(),
        columns = df.width(),
        "loaded table"
    );
    Ok(df)
}

#[cfg(test)]
mod tests {
    use super::*;
    use condexp_model::{EventCategory, columns};
    use polars::prelude::*;

    struct InMemory {
        tables: BTreeMap<String, DataFrame>,
    }

    impl TableSource for InMemory {
        fn raw_table(&self, role: &TableRole, _text: &[&str]) -> Result<DataFrame> {
            self.tables
                .get(&role.to_string())
                .cloned()
                .ok_or_else(|| IngestError::SchemaMismatch {
                    table: role.to_string(),
                    column: "*".to_string(),
                })
        }
    }

    fn options() -> PipelineOptions {
        PipelineOptions::default()
            .with_categories(vec![EventCategory::new("office", 1, "obxp18x")])
    }

    fn source() -> InMemory {
        let mut tables = BTreeMap::new();
        tables.insert(
            "cohort".to_string(),
            df! {
                "dupersid" => ["P1", "P2"],
                "varstr" => [1i64, 1],
                "varpsu" => [1i64, 2],
                "perwt18f" => [100.0, 200.0],
                "totexp18" => [10.0, 20.0],
            }
            .unwrap(),
        );
        tables.insert(
            "conditions".to_string(),
            df! {
                "dupersid" => ["P1"],
                "condidx" => ["C1"],
                "ccsr1x" => ["NVS010"],
                "ccsr2x" => [None::<&str>],
                "ccsr3x" => [None::<&str>],
            }
            .unwrap(),
        );
        tables.insert(
            "link".to_string(),
            df! {
                "dupersid" => ["P1"],
                "condidx" => ["C1"],
                "evntidx" => ["E1"],
                "eventype" => [1i64],
            }
            .unwrap(),
        );
        tables.insert(
            "events[office]".to_string(),
            df! {
                "dupersid" => ["P1"],
                "evntidx" => ["E1"],
                "obxp18x" => [100.0],
            }
            .unwrap(),
        );
        InMemory { tables }
    }

    #[test]
    fn loads_all_roles_under_canonical_names() {
        let dataset = load_dataset(&source(), &options()).unwrap();

        assert_eq!(dataset.cohort.height(), 2);
        assert!(dataset.cohort.column(columns::WEIGHT).is_ok());
        assert_eq!(dataset.events.len(), 1);
        assert!(dataset.events["office"].column(columns::COST).is_ok());
    }

    #[test]
    fn missing_event_table_fails() {
        let mut source = source();
        source.tables.remove("events[office]");

        let result = load_dataset(&source, &options());

        assert!(matches!(result, Err(IngestError::SchemaMismatch { .. })));
    }
}
