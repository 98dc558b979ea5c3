//! Terminal tables.

use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use tariff_model::{Level, SearchHit};
use tariff_navigator::{NavigatorView, TreeRow, VisibleItem, WidgetMode};

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

/// Browse tree rows with indentation and expansion markers.
pub fn tree_table(rows: &[TreeRow], favorites: &[String]) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Code"),
        header_cell("Level"),
        header_cell("Description"),
        header_cell("★"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 3, CellAlignment::Center);
    for row in rows {
        table.add_row(vec![
            tree_code_cell(row),
            level_cell(row.node.level),
            Cell::new(&row.node.description),
            favorite_cell(favorites.iter().any(|f| f == row.code())),
        ]);
    }
    table
}

/// Ranked search hits.
pub fn hits_table(hits: &[SearchHit]) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("#"),
        header_cell("Code"),
        header_cell("Level"),
        header_cell("Description"),
        header_cell("Score"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 0, CellAlignment::Right);
    align_column(&mut table, 4, CellAlignment::Right);
    for (index, hit) in hits.iter().enumerate() {
        table.add_row(vec![
            dim_cell(index),
            Cell::new(&hit.code).add_attribute(Attribute::Bold),
            level_cell(hit.level),
            Cell::new(&hit.description),
            match hit.score {
                Some(score) => Cell::new(format!("{score:.2}")),
                None => dim_cell("-"),
            },
        ]);
    }
    table
}

/// The navigator's visible list with the highlighted row marked.
pub fn view_table(view: &NavigatorView) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell(""),
        header_cell("Code"),
        header_cell("Level"),
        header_cell("Description"),
    ]);
    apply_table_style(&mut table);
    for (index, item) in view.items.iter().enumerate() {
        let highlighted = view.highlighted == Some(index);
        let code = match item {
            VisibleItem::Row(row) => tree_code_cell(row),
            VisibleItem::Hit(hit) => Cell::new(&hit.code),
        };
        let marker = if highlighted {
            Cell::new("›").fg(Color::Cyan).add_attribute(Attribute::Bold)
        } else {
            Cell::new("")
        };
        let code = if highlighted {
            code.fg(Color::Cyan).add_attribute(Attribute::Bold)
        } else {
            code
        };
        table.add_row(vec![
            marker,
            code,
            level_cell(item.level()),
            Cell::new(item.description()),
        ]);
    }
    table
}

/// One-line status for a navigator view.
pub fn view_status(view: &NavigatorView) -> String {
    let mode = match view.mode {
        WidgetMode::Closed => "closed",
        WidgetMode::Browsing => "browsing",
        WidgetMode::Searching => "searching",
    };
    let mut status = format!("Mode: {mode}");
    if !view.query.is_empty() {
        status.push_str(&format!("  Query: {:?}", view.query));
    }
    if view.search_pending {
        status.push_str("  (waiting for results)");
    }
    if let Some(error) = &view.search_error {
        status.push_str(&format!("  Search failed: {}", error.user_message()));
    }
    if let Some(error) = &view.fetch_error {
        status.push_str(&format!("  Tree unavailable: {}", error.user_message()));
    }
    status
}

/// Numbered list of codes, most recent first.
pub fn code_list_table(title: &str, codes: &[String]) -> Table {
    let mut table = Table::new();
    table.set_header(vec![header_cell("#"), header_cell(title)]);
    apply_table_style(&mut table);
    align_column(&mut table, 0, CellAlignment::Right);
    for (index, code) in codes.iter().enumerate() {
        table.add_row(vec![dim_cell(index + 1), Cell::new(code)]);
    }
    table
}

fn tree_code_cell(row: &TreeRow) -> Cell {
    let marker = match (row.node.has_children, row.expanded) {
        (false, _) => " ",
        (true, false) => "▸",
        (true, true) => "▾",
    };
    Cell::new(format!("{}{} {}", "  ".repeat(row.depth), marker, row.code()))
}

fn level_cell(level: Level) -> Cell {
    let color = match level {
        Level::Section => Color::Magenta,
        Level::Chapter => Color::Blue,
        Level::Heading => Color::Green,
        Level::Subheading => Color::White,
    };
    Cell::new(level.label()).fg(color)
}

fn favorite_cell(favorite: bool) -> Cell {
    if favorite {
        Cell::new("★").fg(Color::Yellow)
    } else {
        dim_cell("")
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label).add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value.to_string()).add_attribute(Attribute::Dim)
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}
