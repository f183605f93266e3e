//! Column-aligned listings for `list`, `search`, `outdated` and `history`.

use comfy_table::presets::NOTHING;
use comfy_table::{Cell, CellAlignment, Color, ContentArrangement, Table};

/// A borderless table in the house style: dim headers, no separators.
pub fn listing(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(NOTHING)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(headers.iter().map(|h| Cell::new(h).fg(Color::DarkGrey)));
    table
}

pub fn token_cell(token: &str) -> Cell {
    Cell::new(token).fg(Color::Cyan)
}

pub fn dim_cell(text: impl std::fmt::Display) -> Cell {
    Cell::new(text).fg(Color::DarkGrey)
}

pub fn right_cell(text: impl std::fmt::Display) -> Cell {
    Cell::new(text).set_alignment(CellAlignment::Right)
}

/// Print a table indented under the section header.
pub fn print(table: &Table) {
    println!();
    for line in table.lines() {
        println!(" {line}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_rows_without_borders() {
        let mut table = listing(&["token", "version"]);
        table.add_row(vec![token_cell("skype"), Cell::new("8.34.0.78")]);
        let rendered = table.to_string();
        assert!(rendered.contains("skype"));
        assert!(rendered.contains("8.34.0.78"));
        assert!(!rendered.contains('|'));
    }
}
