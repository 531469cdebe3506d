use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color as TableColor, ContentArrangement, Table};

use crate::monitor::{classify, StatusColor};

/// Table and cell creation helpers
pub fn create_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

pub fn create_cyan_header(labels: &[&str]) -> Vec<Cell> {
    labels
        .iter()
        .map(|label| Cell::new(*label).fg(TableColor::Cyan))
        .collect()
}

fn table_color(color: StatusColor) -> TableColor {
    match color {
        StatusColor::Green => TableColor::Green,
        StatusColor::Yellow => TableColor::Yellow,
        StatusColor::Red => TableColor::Red,
        StatusColor::Blue => TableColor::Blue,
    }
}

/// Cell colored by the bucket of `status`.
pub fn status_cell(text: impl ToString, status: &str) -> Cell {
    Cell::new(text.to_string()).fg(table_color(classify(status)))
}
