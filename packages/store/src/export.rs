//! JSON export of the filtered event list.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use gdelt_pulse_event_models::EventRecord;

/// Errors that can occur while exporting events.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Serializes `events` as indented JSON.
///
/// # Errors
///
/// Returns [`ExportError::Json`] if serialization fails.
pub fn export_json(events: &[EventRecord]) -> Result<String, ExportError> {
    Ok(serde_json::to_string_pretty(events)?)
}

/// `gdelt-events-YYYY-MM-DD.json`
#[must_use]
pub fn export_file_name(date: NaiveDate) -> String {
    format!("gdelt-events-{}.json", date.format("%Y-%m-%d"))
}

/// Writes `events` to [`export_file_name`] inside `dir`, returning the
/// path written. An existing file of the same name is overwritten.
///
/// # Errors
///
/// Returns [`ExportError`] if serialization or the write fails.
pub fn write_export(
    dir: &Path,
    events: &[EventRecord],
    date: NaiveDate,
) -> Result<PathBuf, ExportError> {
    let path = dir.join(export_file_name(date));
    std::fs::write(&path, export_json(events)?)?;
    log::info!("Exported {} events to {}", events.len(), path.display());
    Ok(path)
}
