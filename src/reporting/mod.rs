//! Output reporters: terminal (human), JSON (machine), and HTML (shareable).
//!
//! All implement the [`Reporter`] trait from `crate::models` and only read
//! the report they are given. Writing to disk goes through
//! [`output::write_atomic`], so a failed write never leaves a partial file.

pub mod html;
pub mod json;
pub mod labels;
pub mod output;
pub mod terminal;

use std::path::Path;

use crate::models::{Report, Reporter};
use crate::TfaError;

pub use html::{format_html, HtmlOptions, HtmlReporter};
pub use json::{format_json, JsonReporter};
pub use labels::Labels;
pub use output::write_atomic;
pub use terminal::{format_terminal, TerminalOptions, TerminalReporter};

/// Renders `report` with `reporter` and writes the result to `path`.
pub fn write_report(reporter: &dyn Reporter, report: &Report, path: &Path) -> Result<(), TfaError> {
    let rendered = reporter.render(report)?;
    write_atomic(path, rendered.as_bytes()).map_err(|e| match e {
        TfaError::Io(io) => TfaError::Report(format!(
            "cannot write {} report to {}: {io}",
            reporter.format_name(),
            path.display()
        )),
        other => other,
    })
}
