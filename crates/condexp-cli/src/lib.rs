//! Library side of the `condexp` command-line tool.

pub mod config;
pub mod logging;
pub mod output;
pub mod report;
pub mod schema;
pub mod summary;
