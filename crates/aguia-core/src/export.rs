//! Privacy export of a user's stored preferences.
//!
//! Exported keys use the legacy column names, which is what the data subject
//! request format has always listed.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::models::{FieldValue, PreferenceRecord};
use crate::translate::{to_row, COLUMNS};

/// Export output format shared by the CLI and the HTTP service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Json,
    Markdown,
}

impl ExportFormat {
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Markdown => "md",
        }
    }
}

/// Everything stored about one user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrivacyExport {
    pub user_id: String,
    pub exported_at: i64,
    pub preferences: BTreeMap<String, serde_json::Value>,
}

impl PrivacyExport {
    /// Build an export from a stored record, keyed by legacy column name.
    #[must_use]
    pub fn from_record(record: &PreferenceRecord, exported_at: i64) -> Self {
        let row = to_row(record);
        let preferences = COLUMNS
            .iter()
            .filter_map(|column| {
                let value = match row.get(column.legacy)? {
                    FieldValue::Integer(value) => serde_json::Value::from(*value),
                    FieldValue::Real(value) => serde_json::Value::from(*value),
                    FieldValue::Text(text) => serde_json::Value::from(text.as_str()),
                };
                Some((column.legacy.to_string(), value))
            })
            .collect();

        Self {
            user_id: record.user_id.to_string(),
            exported_at,
            preferences,
        }
    }
}

/// Render an export as pretty-printed JSON.
pub fn render_json_export(export: &PrivacyExport) -> serde_json::Result<String> {
    serde_json::to_string_pretty(export)
}

/// Render an export in Markdown with a frontmatter block.
#[must_use]
pub fn render_markdown_export(export: &PrivacyExport) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "---");
    let _ = writeln!(output, "user_id: {}", export.user_id);
    let _ = writeln!(output, "exported_at: {}", export.exported_at);
    let _ = writeln!(output, "---");
    let _ = writeln!(output);
    let _ = writeln!(output, "# Accessibility preferences");
    let _ = writeln!(output);
    for (key, value) in &export.preferences {
        match value {
            serde_json::Value::String(text) => {
                let _ = writeln!(output, "- {key}: {text}");
            }
            other => {
                let _ = writeln!(output, "- {key}: {other}");
            }
        }
    }

    output
}

/// Render an export based on the selected format.
pub fn render_privacy_export(
    export: &PrivacyExport,
    format: ExportFormat,
) -> serde_json::Result<String> {
    match format {
        ExportFormat::Json => render_json_export(export),
        ExportFormat::Markdown => Ok(render_markdown_export(export)),
    }
}

/// Build a deterministic default file name for export flows.
#[must_use]
pub fn suggested_export_file_name(user_id: &str, format: ExportFormat, timestamp: i64) -> String {
    format!("aguia-{user_id}-{timestamp}.{}", format.extension())
}
