use chrono::{DateTime, Utc};
use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color as TableColor, ContentArrangement, Table};

/// Table and cell creation helpers
pub fn create_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

pub fn header_cells(labels: &[&str]) -> Vec<Cell> {
    labels
        .iter()
        .map(|label| Cell::new(*label).fg(TableColor::Cyan))
        .collect()
}

pub fn status_cell(status: Option<&str>) -> Cell {
    let Some(status) = status else {
        return Cell::new("-").fg(TableColor::DarkGrey);
    };
    let color = match status {
        "SUCCESS" => TableColor::Green,
        "FAILED" | "ABORTED" => TableColor::Red,
        "UNSTABLE" | "IN_PROGRESS" | "PAUSED_PENDING_INPUT" => TableColor::Yellow,
        _ => TableColor::DarkGrey,
    };
    Cell::new(status).fg(color)
}

/// Epoch milliseconds as a UTC timestamp, or `-`.
pub fn format_millis(millis: Option<i64>) -> String {
    millis
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .map_or_else(
            || "-".to_string(),
            |at| at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        )
}

pub fn format_duration(millis: Option<i64>) -> String {
    let Some(millis) = millis.filter(|ms| *ms >= 0) else {
        return "-".to_string();
    };
    let seconds = millis / 1000;
    if seconds >= 60 {
        format!("{}m {:02}s", seconds / 60, seconds % 60)
    } else {
        format!("{}.{}s", seconds, (millis % 1000) / 100)
    }
}
