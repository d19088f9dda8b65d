use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use qsf_cli::types::ConvertResult;

pub fn print_summary(result: &ConvertResult) {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.apply_modifier(UTF8_ROUND_CORNERS);
    table.apply_modifier(UTF8_SOLID_INNER_BORDERS);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![header_cell("Item"), header_cell("Value")]);

    let title = if result.title.is_empty() {
        dim_cell("(untitled)")
    } else {
        Cell::new(&result.title)
    };
    table.add_row(vec![Cell::new("Survey"), title]);
    table.add_row(vec![Cell::new("Survey ID"), Cell::new(&result.survey_id)]);
    table.add_row(vec![Cell::new("Questions"), count_cell(result.questions)]);
    table.add_row(vec![
        Cell::new("Columns"),
        Cell::new(format!(
            "{} ({} categorical)",
            result.columns, result.factor_columns
        )),
    ]);
    table.add_row(vec![Cell::new("Responses"), count_cell(result.responses)]);

    let unresolved = if result.unresolved.is_empty() {
        dim_cell("0")
    } else {
        Cell::new(result.unresolved.len()).fg(Color::Yellow)
    };
    table.add_row(vec![Cell::new("Unresolved dynamic choices"), unresolved]);

    table.add_row(vec![
        Cell::new("CSV"),
        Cell::new(result.csv_path.display().to_string()),
    ]);
    let script = result.r_script_path.as_ref().map_or_else(
        || dim_cell("-"),
        |path| Cell::new(path.display().to_string()),
    );
    table.add_row(vec![Cell::new("R script"), script]);
    if let Some(path) = &result.survey_dump_path {
        table.add_row(vec![
            Cell::new("Survey model"),
            Cell::new(path.display().to_string()),
        ]);
    }

    println!("{table}");

    for entry in &result.unresolved {
        eprintln!(
            "warning: {} copies choices from {} ({:?}): {}",
            entry.question_id, entry.source, entry.kind, entry.reason
        );
    }
}

fn count_cell(value: usize) -> Cell {
    Cell::new(value).set_alignment(CellAlignment::Right)
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
