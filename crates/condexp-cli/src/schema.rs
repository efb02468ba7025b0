//! Listing of the declared table schemas.

use comfy_table::{Cell, Color, Table};

use condexp_model::{PipelineOptions, TableSchema};

use crate::summary::{apply_table_style, header_cell};

/// One line per declared column: `role: source -> canonical (kind)`.
pub fn schema_listing(options: &PipelineOptions) -> String {
    TableSchema::all(options)
        .iter()
        .flat_map(|schema| {
            schema.columns.iter().map(move |column| {
                format!(
                    "{}: {} -> {} ({})",
                    schema.role, column.source, column.canonical, column.kind
                )
            })
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// The declared schemas as a terminal table.
pub fn schema_table(options: &PipelineOptions) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Table"),
        header_cell("Source column"),
        header_cell("Column"),
        header_cell("Type"),
    ]);
    apply_table_style(&mut table);
    for schema in TableSchema::all(options) {
        let role = schema.role.to_string();
        for column in &schema.columns {
            let renamed = if column.source == column.canonical {
                Cell::new(&column.canonical).fg(Color::DarkGrey)
            } else {
                Cell::new(&column.canonical)
            };
            table.add_row(vec![
                Cell::new(&role),
                Cell::new(&column.source),
                renamed,
                Cell::new(column.kind),
            ]);
        }
    }
    table
}
