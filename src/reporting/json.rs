//! Machine-readable JSON reporter.
//!
//! Emits the report in its own shape: the canonical report object, or
//! `{"raw_analysis": ..}` for a fallback, or `{"error": ..}` for a failed
//! call. Output is pretty-printed UTF-8 with non-ASCII text left as is.

use crate::models::{Report, Reporter};
use crate::TfaError;

/// Formats the report as a pretty-printed JSON string.
pub fn format_json(report: &Report) -> Result<String, TfaError> {
    let mut json = serde_json::to_string_pretty(report)
        .map_err(|e| TfaError::Report(format!("JSON serialization failed: {e}")))?;
    json.push('\n');
    Ok(json)
}

/// JSON reporter for piping to `jq` or archiving next to the HTML report.
pub struct JsonReporter;

impl Reporter for JsonReporter {
    fn format_name(&self) -> &str {
        "json"
    }

    fn render(&self, report: &Report) -> Result<String, TfaError> {
        format_json(report)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
