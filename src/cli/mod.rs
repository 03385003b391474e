//! CLI argument parsing and pipeline orchestration.
//!
//! This module is the entry point for the `tfavail` binary. It parses
//! command-line arguments via `clap`, loads the layered configuration, sets
//! up logging, and runs one of the subcommands:
//!
//! - `analyze`: resources → prompt → model → report → sinks
//! - `render`: a saved response or JSON report → sinks, no model call
//! - `prompt`: print the prompt `analyze` would send
//! - `init`: write a commented default config file
//!
//! # Exit codes
//!
//! | Code | Meaning |
//! |------|---------|
//! | 0    | Report produced (structured or unstructured) |
//! | 1    | The model call failed; an error report was produced |
//! | 2    | Fatal error (config, input, or report I/O) |

use std::path::PathBuf;
use std::time::Instant;

use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::analysis::{self, Analysis, Analyzer, PromptBuilder};
use crate::client::BedrockClient;
use crate::config::{CliOverrides, Language, TfaConfig};
use crate::models::{Emphasis, Report, Reporter, Tone};
use crate::reporting::terminal::paint;
use crate::reporting::{
    self, HtmlOptions, HtmlReporter, JsonReporter, Labels, TerminalOptions, TerminalReporter,
};
use crate::TfaError;

// ---------------------------------------------------------------------------
// Exit codes
// ---------------------------------------------------------------------------

/// A report was produced.
const EXIT_OK: i32 = 0;
/// The model call failed; the error report was still rendered.
const EXIT_ANALYSIS_FAILED: i32 = 1;
/// Fatal error (config parse failure, unreadable input, failed write).
const EXIT_ERROR: i32 = 2;

// ---------------------------------------------------------------------------
// Clap argument definitions
// ---------------------------------------------------------------------------

/// tfavail - Availability review for Terraform-defined AWS infrastructure
#[derive(Parser)]
#[command(
    name = "tfavail",
    version,
    about = "Availability review for Terraform-defined AWS infrastructure"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Analyze a Terraform resource export with a Bedrock model
    Analyze(AnalyzeArgs),
    /// Re-render a saved model response or JSON report
    Render(RenderArgs),
    /// Print the prompt that `analyze` would send
    Prompt(PromptArgs),
    /// Create a default config file
    Init {
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
}

/// Sink and presentation flags shared by `analyze` and `render`.
#[derive(Args, Clone, Debug, Default)]
struct OutputArgs {
    /// Write the JSON report to this file
    #[arg(long, value_name = "PATH")]
    report_output: Option<PathBuf>,

    /// Write the HTML report to this file
    #[arg(long, value_name = "PATH")]
    html: Option<PathBuf>,

    /// Directory for relative report paths [default: output]
    #[arg(long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Report language [ja|en]
    #[arg(short, long, value_name = "LANG")]
    language: Option<String>,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    /// Verbose diagnostics on stderr
    #[arg(long)]
    debug: bool,
}

#[derive(Args, Clone, Debug)]
struct AnalyzeArgs {
    /// JSON export of the parsed Terraform project
    #[arg(value_name = "RESOURCES_JSON")]
    resources: PathBuf,

    #[command(flatten)]
    output: OutputArgs,

    /// Also save the model's raw answer to this file
    #[arg(long, value_name = "PATH")]
    save_response: Option<PathBuf>,

    /// AWS region for Bedrock
    #[arg(long, value_name = "REGION")]
    region: Option<String>,

    /// Bedrock model ID
    #[arg(long, value_name = "MODEL_ID")]
    model: Option<String>,
}

#[derive(Args, Clone, Debug)]
struct RenderArgs {
    /// Saved model response or JSON report
    #[arg(value_name = "FILE")]
    file: PathBuf,

    #[command(flatten)]
    output: OutputArgs,
}

#[derive(Args, Clone, Debug)]
struct PromptArgs {
    /// JSON export of the parsed Terraform project
    #[arg(value_name = "RESOURCES_JSON")]
    resources: PathBuf,

    /// Prompt language [ja|en]
    #[arg(short, long, value_name = "LANG")]
    language: Option<String>,
}

fn parse_language(value: Option<&String>) -> Result<Option<Language>, String> {
    value
        .map(|v| Language::parse(v).map_err(|_| format!("Unknown language '{v}': expected ja or en")))
        .transpose()
}

impl OutputArgs {
    /// Convert parsed CLI arguments into a `CliOverrides` struct.
    fn to_overrides(&self) -> Result<CliOverrides, String> {
        Ok(CliOverrides {
            language: parse_language(self.language.as_ref())?,
            output_dir: self.output_dir.clone(),
            no_color: self.no_color,
            debug: self.debug,
            ..Default::default()
        })
    }
}

impl AnalyzeArgs {
    fn to_overrides(&self) -> Result<CliOverrides, String> {
        Ok(CliOverrides {
            region: self.region.clone(),
            model_id: self.model.clone(),
            ..self.output.to_overrides()?
        })
    }
}

// ---------------------------------------------------------------------------
// Public entry point
// ---------------------------------------------------------------------------

/// Parse CLI arguments and run the appropriate command. Returns an exit code.
pub fn run() -> i32 {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Analyze(args) => run_analyze(args),
        Command::Render(args) => run_render(args),
        Command::Prompt(args) => run_prompt(args),
        Command::Init { force } => run_init(force),
    };

    result.unwrap_or_else(|e| {
        eprintln!("tfavail error: {e}");
        EXIT_ERROR
    })
}

/// Loads the layered config, applies `overrides`, and starts logging.
fn prepare(overrides: Result<CliOverrides, String>) -> Result<TfaConfig, TfaError> {
    let overrides = overrides.map_err(TfaError::Config)?;
    // Until the config is loaded, only warnings are shown.
    let loading = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_max_level(tracing::Level::WARN)
        .finish();
    let mut config = tracing::subscriber::with_default(loading, TfaConfig::load)?;
    config.apply_overrides(&overrides);
    init_logging(config.app.debug);
    Ok(config)
}

/// Diagnostics go to stderr. `RUST_LOG` wins over the debug flag.
fn init_logging(debug: bool) {
    let default = if debug { "warn,tfavail=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

// ---------------------------------------------------------------------------
// Init command
// ---------------------------------------------------------------------------

fn run_init(force: bool) -> Result<i32, TfaError> {
    let path = crate::config::write_default_config(force)?;
    println!("Config written to {}", path.display());
    Ok(EXIT_OK)
}

// ---------------------------------------------------------------------------
// Prompt command
// ---------------------------------------------------------------------------

fn run_prompt(args: PromptArgs) -> Result<i32, TfaError> {
    let overrides = parse_language(args.language.as_ref()).map(|language| CliOverrides {
        language,
        ..Default::default()
    });
    let config = prepare(overrides)?;
    let resources = analysis::load_resources(&args.resources)?;
    print!(
        "{}",
        PromptBuilder::new(config.app.language).availability_prompt(&resources)
    );
    Ok(EXIT_OK)
}

// ---------------------------------------------------------------------------
// Analyze command
// ---------------------------------------------------------------------------

fn run_analyze(args: AnalyzeArgs) -> Result<i32, TfaError> {
    let config = prepare(args.to_overrides())?;
    let terminal = TerminalOptions::from_config(&config);
    let labels = terminal.labels;

    // 1. Load the resource export.
    step(1, labels.step_resources, &terminal);
    let started = Instant::now();
    let resources = analysis::load_resources(&args.resources)?;
    let summary = analysis::resource_summary(&resources);
    println!("{}: {}", labels.resource_types, summary.len());
    for entry in &summary {
        println!("  - {}: {}", entry.resource_type, entry.count);
    }
    print_elapsed(labels, started.elapsed().as_secs_f64());

    // 2. Ask the model.
    step(2, labels.step_analysis, &terminal);
    println!("{}: {} ({})", labels.model, config.model.model_id, config.model.region);
    let analysis = analyze(&config, &resources);
    print_elapsed(labels, analysis.elapsed.as_secs_f64());
    info!(kind = analysis.report.kind(), "analysis finished");

    if let (Some(path), Some(raw)) = (&args.save_response, &analysis.raw_response) {
        let path = config.resolve_output_path(path);
        reporting::write_atomic(&path, raw.as_bytes())?;
        println!("{}: {}", labels.saved, path.display());
    }

    // 3. Report.
    step(3, labels.step_report, &terminal);
    emit(&analysis.report, &args.output, &config, terminal)?;

    Ok(exit_code(&analysis.report))
}

/// One model call. A client that cannot even be built is reported the same
/// way as a failed call.
fn analyze(config: &TfaConfig, resources: &serde_json::Value) -> Analysis {
    let prompts = PromptBuilder::new(config.app.language);
    match BedrockClient::new(&config.model) {
        Ok(client) => Analyzer::new(client, prompts).analyze(resources),
        Err(e) => Analysis {
            report: Report::error(e.to_string()),
            raw_response: None,
            elapsed: std::time::Duration::ZERO,
        },
    }
}

// ---------------------------------------------------------------------------
// Render command
// ---------------------------------------------------------------------------

fn run_render(args: RenderArgs) -> Result<i32, TfaError> {
    let config = prepare(args.output.to_overrides())?;
    let terminal = TerminalOptions::from_config(&config);

    let text = std::fs::read_to_string(&args.file)
        .map_err(|e| TfaError::Input(format!("cannot read {}: {e}", args.file.display())))?;
    let report = analysis::load_saved_report(&text);
    info!(kind = report.kind(), "loaded saved report");

    emit(&report, &args.output, &config, terminal)?;
    Ok(exit_code(&report))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Prints the report to the terminal and writes every requested file sink.
/// All sinks render the same in-memory report.
fn emit(
    report: &Report,
    output: &OutputArgs,
    config: &TfaConfig,
    terminal: TerminalOptions,
) -> Result<(), TfaError> {
    print!("{}", TerminalReporter::new(terminal).render(report)?);

    let mut sinks: Vec<(Box<dyn Reporter>, PathBuf)> = Vec::new();
    if let Some(path) = &output.report_output {
        sinks.push((Box::new(JsonReporter), config.resolve_output_path(path)));
    }
    if let Some(path) = &output.html {
        let options = HtmlOptions::new(config.app.language);
        sinks.push((
            Box::new(HtmlReporter::new(options)),
            config.resolve_output_path(path),
        ));
    }

    if !sinks.is_empty() {
        println!();
    }
    for (reporter, path) in &sinks {
        reporting::write_report(reporter.as_ref(), report, path)?;
        println!(
            "{} ({}): {}",
            terminal.labels.saved,
            reporter.format_name(),
            path.display()
        );
    }
    Ok(())
}

fn exit_code(report: &Report) -> i32 {
    if report.is_error() {
        EXIT_ANALYSIS_FAILED
    } else {
        EXIT_OK
    }
}

fn step(n: usize, title: &str, terminal: &TerminalOptions) {
    let heading = format!("[{n}/3] {title}");
    println!("\n{}", paint(&heading, Emphasis::strong(Tone::Default), terminal.color));
}

fn print_elapsed(labels: &Labels, secs: f64) {
    println!("{}: {secs:.1}s", labels.elapsed);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Command {
        Cli::try_parse_from(args).unwrap().command
    }

    #[test]
    fn analyze_args_default_produces_no_overrides() {
        let Command::Analyze(args) = parse(&["tfavail", "analyze", "resources.json"]) else {
            panic!("expected analyze");
        };
        assert_eq!(args.resources, PathBuf::from("resources.json"));
        let overrides = args.to_overrides().unwrap();
        assert!(overrides.region.is_none());
        assert!(overrides.model_id.is_none());
        assert!(overrides.language.is_none());
        assert!(overrides.output_dir.is_none());
        assert!(!overrides.no_color);
        assert!(!overrides.debug);
    }

    #[test]
    fn analyze_args_full() {
        let Command::Analyze(args) = parse(&[
            "tfavail",
            "analyze",
            "resources.json",
            "--report-output",
            "report.json",
            "--html",
            "report.html",
            "--save-response",
            "raw.txt",
            "--region",
            "us-east-1",
            "--model",
            "anthropic.claude-3-haiku-20240307-v1:0",
            "--language",
            "EN",
            "--no-color",
            "--debug",
        ]) else {
            panic!("expected analyze");
        };
        assert_eq!(args.output.report_output, Some(PathBuf::from("report.json")));
        assert_eq!(args.output.html, Some(PathBuf::from("report.html")));
        assert_eq!(args.save_response, Some(PathBuf::from("raw.txt")));

        let overrides = args.to_overrides().unwrap();
        assert_eq!(overrides.region.as_deref(), Some("us-east-1"));
        assert_eq!(
            overrides.model_id.as_deref(),
            Some("anthropic.claude-3-haiku-20240307-v1:0")
        );
        assert_eq!(overrides.language, Some(Language::En));
        assert!(overrides.no_color);
        assert!(overrides.debug);
    }

    #[test]
    fn invalid_language_is_rejected() {
        let Command::Render(args) = parse(&["tfavail", "render", "saved.json", "-l", "fr"]) else {
            panic!("expected render");
        };
        let err = args.output.to_overrides().unwrap_err();
        assert!(err.contains("fr"));
    }

    #[test]
    fn render_takes_output_flags() {
        let Command::Render(args) = parse(&[
            "tfavail",
            "render",
            "saved.txt",
            "--html",
            "out.html",
            "--output-dir",
            "reports",
        ]) else {
            panic!("expected render");
        };
        assert_eq!(args.file, PathBuf::from("saved.txt"));
        let overrides = args.output.to_overrides().unwrap();
        assert_eq!(overrides.output_dir, Some(PathBuf::from("reports")));
    }

    #[test]
    fn init_force_flag() {
        assert!(matches!(parse(&["tfavail", "init", "--force"]), Command::Init { force: true }));
        assert!(matches!(parse(&["tfavail", "init"]), Command::Init { force: false }));
    }

    #[test]
    fn subcommand_is_required() {
        assert!(Cli::try_parse_from(["tfavail"]).is_err());
        assert!(Cli::try_parse_from(["tfavail", "analyze"]).is_err());
    }

    #[test]
    fn exit_code_follows_report_kind() {
        assert_eq!(exit_code(&Report::error("x")), EXIT_ANALYSIS_FAILED);
        assert_eq!(exit_code(&Report::fallback("x")), EXIT_OK);
    }

    #[test]
    fn exit_codes_are_distinct() {
        assert_ne!(EXIT_OK, EXIT_ANALYSIS_FAILED);
        assert_ne!(EXIT_OK, EXIT_ERROR);
        assert_ne!(EXIT_ANALYSIS_FAILED, EXIT_ERROR);
    }
}
