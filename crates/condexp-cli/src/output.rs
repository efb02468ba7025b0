//! Writers for the comprehensive record and the run report.

use std::fs::{self, File};
use std::path::Path;

use anyhow::{Context, Result};
use polars::prelude::{CsvWriter, DataFrame, SerWriter};
use tracing::{debug, info, trace};

use condexp_core::PipelineReport;
use condexp_model::columns::{COND_TOTAL_COST, PERSON_ID};

use crate::logging::redact_value;

/// Write the comprehensive record as CSV with a header row.
pub fn write_record(df: &mut DataFrame, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    log_person_costs(df);
    let mut file = File::create(path).with_context(|| format!("create {}", path.display()))?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(df)
        .with_context(|| format!("write {}", path.display()))?;
    info!(
        path = %path.display(),
        rows = df.height(),
        columns = df.width(),
        "wrote comprehensive record"
    );
    Ok(())
}

/// Write the run counts as pretty JSON.
pub fn write_report(report: &PipelineReport, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(report).context("serialize run report")?;
    fs::write(path, json).with_context(|| format!("write {}", path.display()))?;
    debug!(path = %path.display(), "wrote run report");
    Ok(())
}

fn log_person_costs(df: &DataFrame) {
    if !tracing::enabled!(tracing::Level::TRACE) {
        return;
    }
    let (Ok(ids), Ok(costs)) = (df.column(PERSON_ID), df.column(COND_TOTAL_COST)) else {
        return;
    };
    let (Ok(ids), Ok(costs)) = (ids.str(), costs.f64()) else {
        return;
    };
    for (id, cost) in ids.into_iter().zip(costs) {
        if let (Some(id), Some(cost)) = (id, cost)
            && cost > 0.0
        {
            trace!(person = redact_value(id), cost, "condition cost");
        }
    }
}
