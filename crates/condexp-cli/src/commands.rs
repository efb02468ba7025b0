use std::time::Instant;

use anyhow::{Context, Result};
use tracing::{info, info_span};

use condexp_cli::config::RunConfig;
use condexp_cli::output::{write_record, write_report};
use condexp_cli::report::estimate_all;
use condexp_cli::schema::schema_table;
use condexp_cli::summary::RunSummary;
use condexp_core::run_pipeline;
use condexp_ingest::load_dataset;

use crate::cli::{RunArgs, SchemaArgs};

pub fn run_config() -> Result<()> {
    let json = serde_json::to_string_pretty(&RunConfig::default())
        .context("serialize default configuration")?;
    println!("{json}");
    Ok(())
}

pub fn run_schema(args: &SchemaArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    println!("{}", schema_table(&config.pipeline));
    Ok(())
}

pub fn run_run(args: &RunArgs) -> Result<RunSummary> {
    let config = resolve_config(args)?;
    let options = &config.pipeline;
    options.validate().context("invalid configuration")?;
    let run_span = info_span!("run", target = %options.target_code);
    let _run_guard = run_span.enter();
    let start = Instant::now();

    let files = config.inputs.to_dataset(options)?;
    let dataset = info_span!("load")
        .in_scope(|| load_dataset(&files, options))
        .context("load input tables")?;
    let mut output = run_pipeline(&dataset, options).context("run pipeline")?;
    let estimates = estimate_all(&output.comprehensive, &config.report)?;

    write_record(&mut output.comprehensive, &args.output)?;
    if let Some(path) = &args.report {
        write_report(&output.report, path)?;
    }
    info!(
        persons = output.report.cohort_persons,
        duration_ms = start.elapsed().as_millis(),
        "run complete"
    );
    Ok(RunSummary {
        output: args.output.clone(),
        report_path: args.report.clone(),
        report: output.report,
        estimates,
        decimals: config.report.decimals,
    })
}

fn load_config(path: Option<&std::path::Path>) -> Result<RunConfig> {
    match path {
        Some(path) => RunConfig::load(path),
        None => Ok(RunConfig::default()),
    }
}

/// The config file (or defaults) with command-line flags applied on top.
fn resolve_config(args: &RunArgs) -> Result<RunConfig> {
    let mut config = load_config(args.config.as_deref())?;
    if let Some(code) = &args.code {
        config.pipeline.target_code = code.clone();
    }
    if let Some(code_match) = args.code_match {
        config.pipeline.code_match = code_match.into();
    }
    let inputs = &mut config.inputs;
    for (slot, flag) in [
        (&mut inputs.cohort, &args.cohort),
        (&mut inputs.conditions, &args.conditions),
        (&mut inputs.link, &args.link),
    ] {
        if flag.is_some() {
            slot.clone_from(flag);
        }
    }
    for (label, path) in &args.events {
        inputs.events.insert(label.clone(), path.clone());
    }
    if let Some(decimals) = args.decimals {
        config.report.decimals = decimals;
    }
    Ok(config)
}
