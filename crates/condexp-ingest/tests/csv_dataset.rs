//! Integration tests for loading a dataset from CSV files.

use std::fs;
use std::path::{Path, PathBuf};

use polars::prelude::DataType;
use tempfile::TempDir;

use condexp_ingest::{CsvDataset, IngestError, load_dataset};
use condexp_model::{EventCategory, PipelineOptions, columns};

fn write_csv(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).unwrap();
    path
}

fn options() -> PipelineOptions {
    PipelineOptions::default().with_categories(vec![EventCategory::inpatient()])
}

fn dataset(dir: &TempDir, cohort: &str) -> CsvDataset {
    let root = dir.path();
    CsvDataset {
        cohort: write_csv(root, "cohort.csv", cohort),
        conditions: write_csv(
            root,
            "conditions.csv",
            "DUPERSID,CONDIDX,CCSR1X,CCSR2X,CCSR3X\n\
             0010001,0010001001,NVS010,,\n\
             0010002,0010002001,CIR007,NVS010,\n",
        ),
        link: write_csv(
            root,
            "link.csv",
            "DUPERSID,CONDIDX,EVNTIDX,EVENTYPE\n\
             0010001,0010001001,0010001004,4\n",
        ),
        events: [(
            "inpatient".to_string(),
            write_csv(
                root,
                "inpatient.csv",
                "DUPERSID,EVNTIDX,IPXP18X,NUMNIGHX\n\
                 0010001,0010001004,5200.75,3\n",
            ),
        )]
        .into(),
    }
}

#[test]
fn loads_uppercase_extract_into_canonical_tables() {
    let dir = TempDir::new().unwrap();
    let files = dataset(
        &dir,
        "DUPERSID,VARSTR,VARPSU,PERWT18F,TOTEXP18,AGE18X\n\
         0010001,2001,1,4512.3,9000,31\n\
         0010002,2001,2,3120.0,0,44\n",
    );

    let data = load_dataset(&files, &options()).unwrap();

    assert_eq!(data.cohort.height(), 2);
    let ids = data.cohort.column(columns::PERSON_ID).unwrap().str().unwrap();
    assert_eq!(ids.get(0), Some("0010001"));
    assert_eq!(
        data.cohort.column(columns::STRATUM).unwrap().dtype(),
        &DataType::Int64
    );
    let events = &data.events["inpatient"];
    let cost = events.column(columns::COST).unwrap().f64().unwrap();
    assert_eq!(cost.get(0), Some(5200.75));
    let nights = events.column(columns::UTILIZATION).unwrap().i64().unwrap();
    assert_eq!(nights.get(0), Some(3));
}

#[test]
fn missing_weight_column_is_reported_by_source_name() {
    let dir = TempDir::new().unwrap();
    let files = dataset(
        &dir,
        "DUPERSID,VARSTR,VARPSU,TOTEXP18\n0010001,2001,1,9000\n",
    );

    let err = load_dataset(&files, &options()).unwrap_err();

    match err {
        IngestError::SchemaMismatch { table, column } => {
            assert_eq!(table, "cohort");
            assert_eq!(column, "perwt18f");
        }
        other => panic!("unexpected error: {other}"),
    }
}
