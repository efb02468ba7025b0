//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

use condexp_cli::config::parse_event_arg;
use condexp_model::CodeMatch;

#[derive(Parser)]
#[command(
    name = "condexp",
    version,
    about = "Condition-specific healthcare expenditure from household survey files",
    long_about = "Link a conditions file to event files through a condition-event link file,\n\
                  attribute event costs to a target diagnosis code, and roll them up to one\n\
                  row per cohort person."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// Allow person identifiers in trace-level logs.
    #[arg(long = "log-data", global = true)]
    pub log_data: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the pipeline and write the person-level record.
    Run(RunArgs),

    /// List the columns each input table must provide.
    Schema(SchemaArgs),

    /// Print the default configuration as JSON.
    Config,
}

#[derive(Parser)]
pub struct RunArgs {
    /// JSON configuration file; command-line flags override it.
    #[arg(long = "config", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Diagnosis code identifying the target condition.
    #[arg(long = "code", value_name = "CODE")]
    pub code: Option<String>,

    /// How the code is matched against a condition's code columns.
    #[arg(long = "match", value_enum)]
    pub code_match: Option<CodeMatchArg>,

    /// Person-level file (one row per cohort person).
    #[arg(long = "cohort", value_name = "PATH")]
    pub cohort: Option<PathBuf>,

    /// Conditions file.
    #[arg(long = "conditions", value_name = "PATH")]
    pub conditions: Option<PathBuf>,

    /// Condition-event link file.
    #[arg(long = "link", value_name = "PATH")]
    pub link: Option<PathBuf>,

    /// Event file for one category, e.g. `office=h206g.csv` (repeatable).
    #[arg(long = "event", value_name = "LABEL=PATH", value_parser = parse_event_arg)]
    pub events: Vec<(String, PathBuf)>,

    /// Output CSV for the person-level record.
    #[arg(long = "output", value_name = "PATH", default_value = "condexp_output.csv")]
    pub output: PathBuf,

    /// Also write run counts as JSON.
    #[arg(long = "report", value_name = "PATH")]
    pub report: Option<PathBuf>,

    /// Decimal places for the printed estimates.
    #[arg(long = "decimals", value_name = "N")]
    pub decimals: Option<usize>,
}

#[derive(Parser)]
pub struct SchemaArgs {
    /// Configuration whose source column names to list.
    #[arg(long = "config", value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum CodeMatchArg {
    Token,
    Substring,
}

impl From<CodeMatchArg> for CodeMatch {
    fn from(arg: CodeMatchArg) -> Self {
        match arg {
            CodeMatchArg::Token => CodeMatch::Token,
            CodeMatchArg::Substring => CodeMatch::Substring,
        }
    }
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
