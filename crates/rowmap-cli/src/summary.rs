use anyhow::Result;
use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use rowmap_model::Value;

use crate::cli::OutputFormatArg;
use crate::types::{InspectResult, MapResult, PropertyBinding};

pub fn print_bindings(result: &InspectResult) {
    println!("Target: {}", result.target);
    println!("Command: {}", result.command);
    println!("Fingerprint: {}", result.fingerprint);
    println!("{}", bindings_table(&result.bindings));
}

pub fn print_records(result: &MapResult, format: OutputFormatArg) -> Result<()> {
    match format {
        OutputFormatArg::Json => {
            for line in json_lines(result)? {
                println!("{line}");
            }
        }
        OutputFormatArg::Table => {
            println!("{}", records_table(result));
            println!("{} records ({})", result.records.len(), result.target);
        }
    }
    Ok(())
}

/// One compact JSON object per record.
pub fn json_lines(result: &MapResult) -> Result<Vec<String>> {
    result
        .records
        .iter()
        .map(|record| serde_json::to_string(record).map_err(Into::into))
        .collect()
}

pub fn bindings_table(bindings: &[PropertyBinding]) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Property"),
        header_cell("Alias"),
        header_cell("Column"),
        header_cell("Kind"),
        header_cell("Processors"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 2, CellAlignment::Right);
    for binding in bindings {
        let column = match binding.ordinal {
            Some(ordinal) => Cell::new(ordinal),
            None => Cell::new("absent")
                .fg(Color::Yellow)
                .add_attribute(Attribute::Bold),
        };
        let processors = if binding.processors.is_empty() {
            dim_cell("-")
        } else {
            Cell::new(binding.processors.join(", "))
        };
        table.add_row(vec![
            Cell::new(&binding.property).add_attribute(Attribute::Bold),
            Cell::new(&binding.alias),
            column,
            Cell::new(binding.kind),
            processors,
        ]);
    }
    table
}

pub fn records_table(result: &MapResult) -> Table {
    let mut table = Table::new();
    table.set_header(
        result
            .properties
            .iter()
            .map(|name| header_cell(name))
            .collect::<Vec<_>>(),
    );
    apply_table_style(&mut table);
    for record in &result.records {
        table.add_row(
            result
                .properties
                .iter()
                .map(|name| match record.get(name) {
                    None => dim_cell("-"),
                    Some(Value::Null) => dim_cell("NULL"),
                    Some(value) => Cell::new(value),
                })
                .collect::<Vec<_>>(),
        );
    }
    table
}

fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
