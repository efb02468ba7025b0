use std::path::PathBuf;

use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use condexp_core::PipelineReport;

use crate::report::{Estimate, estimate_table};

/// What a completed `run` produced.
#[derive(Debug)]
pub struct RunSummary {
    pub output: PathBuf,
    pub report_path: Option<PathBuf>,
    pub report: PipelineReport,
    pub estimates: Vec<Estimate>,
    pub decimals: usize,
}

pub fn print_summary(summary: &RunSummary) {
    let report = &summary.report;
    println!("Target code: {}", report.target_code);
    println!("Output: {}", summary.output.display());
    if let Some(path) = &summary.report_path {
        println!("Run report: {}", path.display());
    }
    println!(
        "Cohort persons: {}  Matching conditions: {}  Persons with condition: {}",
        report.cohort_persons, report.matched_conditions, report.persons_with_condition
    );
    println!("{}", category_table(report));
    if !summary.estimates.is_empty() {
        println!();
        println!("Weighted means:");
        println!("{}", estimate_table(&summary.estimates, summary.decimals));
    }
}

/// Per-category linkage counts.
pub fn category_table(report: &PipelineReport) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Category"),
        header_cell("Type"),
        header_cell("Link rows"),
        header_cell("Matched"),
        header_cell("Associations"),
        header_cell("Orphans"),
        header_cell("Events"),
        header_cell("Persons"),
    ]);
    apply_summary_table_style(&mut table);
    for index in 1..8 {
        align_column(&mut table, index, CellAlignment::Right);
    }
    for category in &report.categories {
        table.add_row(vec![
            Cell::new(&category.label)
                .fg(Color::Blue)
                .add_attribute(Attribute::Bold),
            Cell::new(category.event_type),
            Cell::new(category.link_rows),
            Cell::new(category.matched_link_rows),
            Cell::new(category.associations),
            count_cell(category.orphan_associations, Color::Yellow),
            Cell::new(category.attributed_events),
            Cell::new(category.persons_with_events),
        ]);
    }
    table
}

fn count_cell(count: usize, color: Color) -> Cell {
    if count > 0 {
        Cell::new(count).fg(color).add_attribute(Attribute::Bold)
    } else {
        Cell::new(count).fg(Color::DarkGrey)
    }
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn apply_summary_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(140);
}

pub fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

pub fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}
