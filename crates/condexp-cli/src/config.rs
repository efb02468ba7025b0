//! Run configuration: pipeline options plus input locations, read from JSON.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail};
use serde::{Deserialize, Serialize};

use condexp_ingest::CsvDataset;
use condexp_model::PipelineOptions;

use crate::report::ReportOptions;

/// Input file locations. Any of them may come from the command line instead.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputFiles {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cohort: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conditions: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<PathBuf>,
    /// Event files keyed by category label.
    pub events: BTreeMap<String, PathBuf>,
}

/// Contents of a `--config` file. Every field has a default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    #[serde(flatten)]
    pub pipeline: PipelineOptions,
    pub inputs: InputFiles,
    pub report: ReportOptions,
}

impl RunConfig {
    /// Read a configuration file. Relative input paths are resolved against
    /// the file's directory.
    pub fn load(path: &Path) -> Result<Self> {
        let text =
            fs::read_to_string(path).with_context(|| format!("read config {}", path.display()))?;
        let mut config: Self = serde_json::from_str(&text)
            .with_context(|| format!("parse config {}", path.display()))?;
        if let Some(base) = path.parent() {
            config.inputs.resolve_relative(base);
        }
        Ok(config)
    }
}

impl InputFiles {
    fn resolve_relative(&mut self, base: &Path) {
        let resolve = |path: &mut PathBuf| {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        };
        for path in [&mut self.cohort, &mut self.conditions, &mut self.link]
            .into_iter()
            .flatten()
        {
            resolve(path);
        }
        self.events.values_mut().for_each(resolve);
    }

    /// Pair the files with the configured categories.
    ///
    /// # Errors
    ///
    /// Fails when a table has no file or an event file names an unknown
    /// category.
    pub fn to_dataset(&self, options: &PipelineOptions) -> Result<CsvDataset> {
        let require = |path: &Option<PathBuf>, flag: &str| {
            path.clone()
                .ok_or_else(|| anyhow!("no {flag} file given (use --{flag} or the config file)"))
        };
        for label in self.events.keys() {
            if options.category(label).is_none() {
                bail!("event file given for unknown category '{label}'");
            }
        }
        let mut events = BTreeMap::new();
        for category in &options.categories {
            let path = self.events.get(&category.label).ok_or_else(|| {
                anyhow!(
                    "no event file for category '{}' (use --event {}=PATH)",
                    category.label,
                    category.label
                )
            })?;
            events.insert(category.label.clone(), path.clone());
        }
        Ok(CsvDataset {
            cohort: require(&self.cohort, "cohort")?,
            conditions: require(&self.conditions, "conditions")?,
            link: require(&self.link, "link")?,
            events,
        })
    }
}

/// Parse a `LABEL=PATH` event argument.
pub fn parse_event_arg(value: &str) -> std::result::Result<(String, PathBuf), String> {
    let (label, path) = value
        .split_once('=')
        .ok_or_else(|| format!("expected LABEL=PATH, got '{value}'"))?;
    let label = label.trim();
    if label.is_empty() || path.trim().is_empty() {
        return Err(format!("expected LABEL=PATH, got '{value}'"));
    }
    Ok((label.to_string(), PathBuf::from(path.trim())))
}
