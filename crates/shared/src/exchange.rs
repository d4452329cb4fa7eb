//! Marker list JSON: `[{ "id", "x", "y", "type", "number", "label"? }, ..]`.
use serde_json::Value;
use tracing::warn;

use crate::models::Marker;

/// Suggested file name for downloads.
pub const EXPORT_FILE_NAME: &str = "markers.json";

/// Parse an imported marker list. Anything but an array of well-formed
/// markers is rejected as a whole.
pub fn parse_markers(text: &str) -> Result<Vec<Marker>, String> {
    let value: Value = serde_json::from_str(text).map_err(|e| format!("Invalid JSON: {}", e))?;
    if !value.is_array() {
        return Err("Expected a JSON array of markers".to_string());
    }
    serde_json::from_value(value).map_err(|e| format!("Invalid marker: {}", e))
}

/// Pretty-printed marker list, two-space indented.
pub fn export_markers(markers: &[Marker]) -> Result<String, String> {
    serde_json::to_string_pretty(markers).map_err(|e| e.to_string())
}

/// Markers to start with given the outcome of the initial fetch. Errors and
/// empty lists fall back to the built-in marker.
pub fn initial_markers(fetched: Result<Vec<Marker>, String>) -> Vec<Marker> {
    match fetched {
        Ok(markers) if !markers.is_empty() => markers,
        Ok(_) => vec![Marker::fallback()],
        Err(e) => {
            warn!(error = %e, "initial markers unavailable, using fallback");
            vec![Marker::fallback()]
        }
    }
}
