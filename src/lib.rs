pub mod analysis;
pub mod cli;
pub mod client;
pub mod config;
pub mod models;
pub mod reporting;

use thiserror::Error;

/// Top-level error type for tfavail.
///
/// Parsing and validation problems with a model response are not errors:
/// they become a fallback report. Everything here is fatal to the current
/// invocation.
#[derive(Debug, Error)]
pub enum TfaError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Input error: {0}")]
    Input(String),

    #[error("Model invocation failed: {0}")]
    Upstream(String),

    #[error("Report error: {0}")]
    Report(String),
}
