use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color as TableColor, ContentArrangement, Table};

use crate::providers::{BuildId, ResourceStatus};

/// Table and cell creation helpers
pub fn create_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

pub fn cyan_header(labels: &[&str]) -> Vec<Cell> {
    labels
        .iter()
        .map(|label| Cell::new(*label).fg(TableColor::Cyan))
        .collect()
}

pub fn status_cell(status: &ResourceStatus) -> Cell {
    match status {
        ResourceStatus::Downloaded { artifacts } => {
            Cell::new(format!("downloaded ({artifacts} artifacts)")).fg(TableColor::Green)
        }
        ResourceStatus::UpToDate => Cell::new("up to date").fg(TableColor::DarkGrey),
    }
}

pub fn build_cell(build_id: Option<BuildId>) -> Cell {
    match build_id {
        Some(id) => Cell::new(id),
        None => Cell::new("-").fg(TableColor::DarkGrey),
    }
}
