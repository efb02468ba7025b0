//! CSV reading utilities.

mod header;
mod reader;

pub use reader::{read_csv_header, read_csv_table};
