//! Presentation: table and lookup result formatters (text and JSON).

use crate::error::ApiError;
use crate::query::PageShortIdResponse;
use crate::table::TableSnapshot;
use comfy_table::Table;

pub fn format_table_text(snapshot: &TableSnapshot, space_short_id: Option<&str>) -> String {
    let mut table = Table::new();
    table.load_preset(comfy_table::presets::UTF8_BORDERS_ONLY);
    table.set_header(snapshot.columns.iter().map(|c| {
        if c.name.is_empty() {
            c.property.clone()
        } else {
            c.name.clone()
        }
    }));
    for row in &snapshot.rows {
        table.add_row(row.cells.iter());
    }

    let mut s = String::new();
    if !snapshot.name.is_empty() {
        s.push_str(&format!("{}\n", snapshot.name));
    }
    s.push_str(&table.to_string());
    s.push_str(&format!(
        "\n{} rows, {} columns (size hint {}{})",
        snapshot.rows.len(),
        snapshot.columns.len(),
        snapshot.size_hint,
        if snapshot.has_more { ", more available" } else { "" }
    ));
    if let Some(short_id) = space_short_id {
        s.push_str(&format!("\nWorkspace short id: {}", short_id));
    }
    s
}

pub fn format_table_json(
    snapshot: &TableSnapshot,
    space_short_id: Option<&str>,
) -> Result<String, ApiError> {
    let mut value = serde_json::to_value(snapshot)
        .map_err(|e| ApiError::ConfigError(format!("Failed to render table: {}", e)))?;
    if let (Some(short_id), Some(obj)) = (space_short_id, value.as_object_mut()) {
        obj.insert("space_short_id".to_string(), serde_json::json!(short_id));
    }
    serde_json::to_string_pretty(&value)
        .map_err(|e| ApiError::ConfigError(format!("Failed to render table: {}", e)))
}

pub fn format_short_id_text(rsp: &PageShortIdResponse) -> String {
    format!(
        "Page: {}\nWorkspace: {} ({})\nWorkspace id: {}\nShort id: {}",
        rsp.page_id, rsp.space_name, rsp.space_domain, rsp.space_id, rsp.space_short_id
    )
}

pub fn format_short_id_json(rsp: &PageShortIdResponse) -> Result<String, ApiError> {
    serde_json::to_string_pretty(rsp)
        .map_err(|e| ApiError::ConfigError(format!("Failed to render response: {}", e)))
}
