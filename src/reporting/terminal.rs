//! ANSI-colored terminal reporter.
//!
//! An error report is one highlighted line and a fallback is the raw answer
//! in a bordered block. A structured report is printed section by section:
//! overview, score, suggested SLO, findings table, then one panel per
//! recommendation in priority order.
//!
//! Text is wrapped by display width so CJK columns line up. Nothing is cut
//! off. Terraform examples are printed line for line as received. Colors
//! are disabled when stdout is not a TTY, `NO_COLOR` is set, or the config
//! turns them off.

use std::borrow::Cow;
use std::fmt::Write as FmtWrite;
use std::io::{self, IsTerminal};

use unicode_width::UnicodeWidthChar;

use crate::config::TfaConfig;
use crate::models::{
    AnalysisReport, Emphasis, Finding, Level, Recommendation, Report, Reporter, Tone,
};
use crate::reporting::labels::Labels;
use crate::TfaError;

// ---------------------------------------------------------------------------
// ANSI escape codes
// ---------------------------------------------------------------------------

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";

const HEADING: Emphasis = Emphasis {
    tone: Tone::Default,
    bold: true,
};

const DEFAULT_WIDTH: usize = 100;
const MIN_WIDTH: usize = 40;
/// Narrowest a table column is squeezed to before the table overflows.
const MIN_COLUMN: usize = 6;

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Everything the renderer needs to know about the terminal.
#[derive(Debug, Clone, Copy)]
pub struct TerminalOptions {
    pub color: bool,
    pub width: usize,
    pub labels: &'static Labels,
}

impl TerminalOptions {
    /// Resolves color and width from the config and the attached terminal.
    pub fn from_config(config: &TfaConfig) -> Self {
        TerminalOptions {
            color: config.console.color && use_color(),
            width: config
                .console
                .width
                .unwrap_or_else(detect_width)
                .max(MIN_WIDTH),
            labels: Labels::for_language(config.app.language),
        }
    }

    /// Uncolored output at a fixed width.
    pub fn plain(labels: &'static Labels, width: usize) -> Self {
        TerminalOptions {
            color: false,
            width: width.max(MIN_WIDTH),
            labels,
        }
    }
}

/// Returns `true` when ANSI color output should be used.
fn use_color() -> bool {
    if std::env::var_os("NO_COLOR").is_some() {
        return false;
    }
    io::stdout().is_terminal()
}

fn detect_width() -> usize {
    std::env::var("COLUMNS")
        .ok()
        .and_then(|v| v.trim().parse::<usize>().ok())
        .filter(|w| *w > 0)
        .unwrap_or(DEFAULT_WIDTH)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn tone_code(tone: Tone) -> Option<&'static str> {
    match tone {
        Tone::Red => Some("\x1b[31m"),
        Tone::Yellow => Some("\x1b[33m"),
        Tone::Green => Some("\x1b[32m"),
        Tone::Default => None,
    }
}

/// Wraps `text` in the escape codes for `emphasis`.
pub(crate) fn paint(text: &str, emphasis: Emphasis, color: bool) -> String {
    if !color || text.is_empty() {
        return text.to_string();
    }
    let mut prefix = String::new();
    if emphasis.bold {
        prefix.push_str(BOLD);
    }
    if let Some(code) = tone_code(emphasis.tone) {
        prefix.push_str(code);
    }
    if prefix.is_empty() {
        return text.to_string();
    }
    format!("{prefix}{text}{RESET}")
}

/// Drops control characters other than newline and tab from model text, so
/// an answer cannot inject its own escape sequences. Applied before `paint`.
pub(crate) fn strip_controls(text: &str) -> Cow<'_, str> {
    let keep = |ch: char| !ch.is_control() || ch == '\n' || ch == '\t';
    if text.chars().all(keep) {
        Cow::Borrowed(text)
    } else {
        Cow::Owned(text.chars().filter(|ch| keep(*ch)).collect())
    }
}

fn display_width(s: &str) -> usize {
    s.chars()
        .map(|ch| UnicodeWidthChar::width(ch).unwrap_or(0))
        .sum()
}

/// Breaks `text` into lines no wider than `width` columns. Existing line
/// breaks and leading indentation are kept; words are split only when they
/// do not fit on a line of their own, which is the normal case for CJK text.
pub(crate) fn wrap(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();

    for raw_line in strip_controls(text).split('\n') {
        let line = raw_line.replace('\t', "    ");
        let mut current = String::new();
        let mut current_width = 0;

        for token in line.split_inclusive(' ') {
            let token_width = display_width(token.trim_end_matches(' '));

            if current_width + token_width <= width {
                current.push_str(token);
                current_width += display_width(token);
                continue;
            }

            if token_width <= width {
                lines.push(current.trim_end().to_string());
                current = token.to_string();
                current_width = display_width(token);
                continue;
            }

            for ch in token.chars() {
                let ch_width = UnicodeWidthChar::width(ch).unwrap_or(0);
                if current_width + ch_width > width && !current.trim_end().is_empty() {
                    lines.push(current.trim_end().to_string());
                    current.clear();
                    current_width = 0;
                    if ch == ' ' {
                        continue;
                    }
                }
                current.push(ch);
                current_width += ch_width;
            }
        }

        lines.push(current.trim_end().to_string());
    }

    lines
}

fn write_wrapped(out: &mut String, text: &str, indent: usize, width: usize) {
    let pad = " ".repeat(indent);
    for line in wrap(text, width.saturating_sub(indent)) {
        if line.is_empty() {
            writeln!(out).unwrap();
        } else {
            writeln!(out, "{pad}{line}").unwrap();
        }
    }
}

/// A block with a title and a left border. `body` is wrapped to fit.
fn write_panel(out: &mut String, title: &str, body: &str, width: usize) {
    writeln!(out, "╭─ {title}").unwrap();
    for line in wrap(body, width.saturating_sub(2)) {
        if line.is_empty() {
            writeln!(out, "│").unwrap();
        } else {
            writeln!(out, "│ {line}").unwrap();
        }
    }
    writeln!(out, "╰─").unwrap();
}

// ---------------------------------------------------------------------------
// Formatting
// ---------------------------------------------------------------------------

/// Formats the entire terminal report into a `String`.
pub fn format_terminal(report: &Report, opts: &TerminalOptions) -> String {
    let mut out = String::new();
    let labels = opts.labels;

    match report {
        Report::Error(e) => {
            let message = strip_controls(&e.error).replace('\n', " ");
            let line = format!("{}: {}", labels.error_prefix, message);
            writeln!(out, "{}", paint(&line, Emphasis::strong(Tone::Red), opts.color)).unwrap();
        }
        Report::Fallback(f) => {
            let title = paint(labels.unstructured, Emphasis::strong(Tone::Yellow), opts.color);
            write_panel(&mut out, &title, &f.raw_analysis, opts.width);
        }
        Report::Analysis(r) => format_analysis(&mut out, r, opts),
    }

    out
}

fn format_analysis(out: &mut String, report: &AnalysisReport, opts: &TerminalOptions) {
    let labels = opts.labels;
    let color = opts.color;

    // Overview
    write_panel(
        out,
        &paint(labels.overview, HEADING, color),
        &report.overview,
        opts.width,
    );

    // Score
    let score = format!("{}/100", report.availability_score);
    writeln!(
        out,
        "\n{}: {}",
        paint(labels.score, HEADING, color),
        paint(&score, report.score_band().emphasis(), color)
    )
    .unwrap();

    // Suggested SLO
    if let Some(slo) = &report.suggested_slo {
        writeln!(out, "\n{}", paint(labels.slo, HEADING, color)).unwrap();
        let target = format!("{}: {}", labels.slo_target, slo.availability_target);
        write_wrapped(out, &target, 2, opts.width);
        if !slo.rationale.trim().is_empty() {
            let rationale = format!("{}: {}", labels.slo_rationale, slo.rationale);
            write_wrapped(out, &rationale, 2, opts.width);
        }
    }

    // Findings
    writeln!(out, "\n{}", paint(labels.findings, HEADING, color)).unwrap();
    if report.findings.is_empty() {
        writeln!(out, "  {}", labels.none).unwrap();
    } else {
        write_findings_table(out, report, opts);
    }

    // Recommendations
    writeln!(out, "\n{}", paint(labels.recommendations, HEADING, color)).unwrap();
    if report.recommendations.is_empty() {
        writeln!(out, "  {}", labels.none).unwrap();
    }
    for (i, rec) in report.recommendations_by_priority().into_iter().enumerate() {
        write_recommendation(out, i + 1, rec, opts);
    }
}

fn recommendation_title(index: usize, rec: &Recommendation, opts: &TerminalOptions) -> String {
    let labels = opts.labels;
    let mut parts = vec![paint(
        &format!("{}: {}", labels.priority, strip_controls(&rec.priority)),
        rec.level().emphasis(),
        opts.color,
    )];
    if let Some(effort) = rec.effort() {
        parts.push(paint(
            &format!("{}: {}", labels.effort, strip_controls(effort)),
            Level::normalize(effort).emphasis(),
            opts.color,
        ));
    }
    if let Some(cost) = rec.cost_impact() {
        parts.push(format!("{}: {}", labels.cost_impact, strip_controls(cost)));
    }
    format!(
        "{}: {}",
        paint(&format!("{} {index}", labels.recommendation_n), HEADING, opts.color),
        parts.join(" | ")
    )
}

fn write_recommendation(out: &mut String, index: usize, rec: &Recommendation, opts: &TerminalOptions) {
    writeln!(out).unwrap();
    write_panel(
        out,
        &recommendation_title(index, rec, opts),
        &rec.description,
        opts.width,
    );
    if let Some(example) = rec.terraform_example() {
        writeln!(out, "  {}:", paint(opts.labels.terraform_example, HEADING, opts.color)).unwrap();
        let example = strip_controls(example);
        out.push_str(&example);
        if !example.ends_with('\n') {
            out.push('\n');
        }
    }
}

// ---------------------------------------------------------------------------
// Findings table
// ---------------------------------------------------------------------------

struct Column<'a> {
    header: &'a str,
    cells: Vec<(&'a str, Emphasis)>,
}

fn findings_columns<'a>(report: &'a AnalysisReport, labels: &'a Labels) -> Vec<Column<'a>> {
    let findings = &report.findings;
    let text = |f: fn(&'a Finding) -> &'a str| -> Vec<(&'a str, Emphasis)> {
        findings.iter().map(|x| (f(x), Emphasis::PLAIN)).collect()
    };

    let mut columns = vec![
        Column {
            header: labels.category,
            cells: text(|f| f.category.as_str()),
        },
        Column {
            header: labels.severity,
            cells: findings
                .iter()
                .map(|f| (f.severity.as_str(), f.level().emphasis()))
                .collect(),
        },
        Column {
            header: labels.description,
            cells: text(|f| f.description.as_str()),
        },
        Column {
            header: labels.recommendation,
            cells: text(|f| f.recommendation.as_str()),
        },
    ];
    if report.findings_have_effort() {
        columns.push(Column {
            header: labels.effort,
            cells: findings.iter().map(|f| level_cell(f.effort())).collect(),
        });
    }
    if report.findings_have_risk_impact() {
        columns.push(Column {
            header: labels.risk_impact,
            cells: findings.iter().map(|f| level_cell(f.risk_impact())).collect(),
        });
    }
    columns
}

fn level_cell(token: Option<&str>) -> (&str, Emphasis) {
    match token {
        Some(t) => (t, Level::normalize(t).emphasis()),
        None => ("", Emphasis::PLAIN),
    }
}

/// Column widths that fit `total` columns, shrinking the widest first.
fn fit_widths(columns: &[Column<'_>], total: usize) -> Vec<usize> {
    let mut widths: Vec<usize> = columns
        .iter()
        .map(|c| {
            c.cells
                .iter()
                .flat_map(|(text, _)| text.split('\n'))
                .map(display_width)
                .chain(std::iter::once(display_width(c.header)))
                .max()
                .unwrap_or(0)
                .max(1)
        })
        .collect();

    let available = total.saturating_sub(3 * columns.len() + 1);
    while widths.iter().sum::<usize>() > available {
        let Some((idx, &widest)) = widths.iter().enumerate().max_by_key(|(_, w)| **w) else {
            break;
        };
        if widest <= MIN_COLUMN {
            break;
        }
        widths[idx] -= 1;
    }
    widths
}

fn border(out: &mut String, widths: &[usize], left: &str, mid: &str, right: &str) {
    let segments: Vec<String> = widths.iter().map(|w| "─".repeat(w + 2)).collect();
    writeln!(out, "{left}{}{right}", segments.join(mid)).unwrap();
}

fn write_row(out: &mut String, cells: &[(&str, Emphasis)], widths: &[usize], color: bool) {
    let wrapped: Vec<Vec<String>> = cells
        .iter()
        .zip(widths)
        .map(|((text, _), w)| wrap(text, *w))
        .collect();
    let height = wrapped.iter().map(Vec::len).max().unwrap_or(1);

    for line_idx in 0..height {
        let mut line = String::from("│");
        for (col, w) in widths.iter().enumerate() {
            let text = wrapped[col].get(line_idx).map(String::as_str).unwrap_or("");
            let pad = w.saturating_sub(display_width(text));
            write!(line, " {}{} │", paint(text, cells[col].1, color), " ".repeat(pad)).unwrap();
        }
        writeln!(out, "{line}").unwrap();
    }
}

fn write_findings_table(out: &mut String, report: &AnalysisReport, opts: &TerminalOptions) {
    let columns = findings_columns(report, opts.labels);
    let widths = fit_widths(&columns, opts.width);

    border(out, &widths, "┌", "┬", "┐");
    let headers: Vec<(&str, Emphasis)> = columns.iter().map(|c| (c.header, HEADING)).collect();
    write_row(out, &headers, &widths, opts.color);

    for row in 0..report.findings.len() {
        border(out, &widths, "├", "┼", "┤");
        let cells: Vec<(&str, Emphasis)> = columns.iter().map(|c| c.cells[row]).collect();
        write_row(out, &cells, &widths, opts.color);
    }
    border(out, &widths, "└", "┴", "┘");
}

// ---------------------------------------------------------------------------
// TerminalReporter
// ---------------------------------------------------------------------------

/// Human-friendly terminal output with ANSI colors.
pub struct TerminalReporter {
    options: TerminalOptions,
}

impl TerminalReporter {
    pub fn new(options: TerminalOptions) -> Self {
        Self { options }
    }
}

impl Reporter for TerminalReporter {
    fn format_name(&self) -> &str {
        "terminal"
    }

    fn render(&self, report: &Report) -> Result<String, TfaError> {
        Ok(format_terminal(report, &self.options))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SuggestedSlo;
    use crate::reporting::labels::{EN, JA};

    fn finding(category: &str, severity: &str) -> Finding {
        Finding {
            category: category.to_string(),
            severity: severity.to_string(),
            description: format!("{category} description"),
            recommendation: format!("{category} fix"),
            ..Default::default()
        }
    }

    fn rec(priority: &str, description: &str) -> Recommendation {
        Recommendation {
            priority: priority.to_string(),
            description: description.to_string(),
            ..Default::default()
        }
    }

    fn sample() -> AnalysisReport {
        AnalysisReport {
            overview: "Single-AZ database behind a healthy ALB.".to_string(),
            availability_score: 90,
            findings: vec![finding("Multi-AZ", "high"), finding("Backup", "low")],
            recommendations: vec![rec("low", "tidy tags"), rec("high", "enable multi_az")],
            suggested_slo: Some(SuggestedSlo {
                availability_target: "99.9%".to_string(),
                rationale: "ALB spans two AZs".to_string(),
            }),
        }
    }

    fn plain_en() -> TerminalOptions {
        TerminalOptions::plain(&EN, 80)
    }

    #[test]
    fn error_is_a_single_line() {
        let out = format_terminal(&Report::error("AccessDenied"), &plain_en());
        assert_eq!(out.lines().count(), 1);
        assert!(out.contains("Error: analysis failed: AccessDenied"));
    }

    #[test]
    fn error_is_red_and_bold_when_colored() {
        let opts = TerminalOptions {
            color: true,
            ..plain_en()
        };
        let out = format_terminal(&Report::error("x"), &opts);
        assert!(out.starts_with("\x1b[1m\x1b[31m"));
        assert!(out.trim_end().ends_with(RESET));
    }

    #[test]
    fn fallback_shows_only_the_raw_text() {
        let raw = "I could not produce JSON.\nHere is prose instead.";
        let out = format_terminal(&Report::fallback(raw), &plain_en());
        assert!(out.contains("Analysis (unstructured)"));
        assert!(out.contains("│ I could not produce JSON."));
        assert!(out.contains("│ Here is prose instead."));
        assert!(!out.contains("Availability score"));
        assert!(!out.contains("Findings"));
    }

    #[test]
    fn analysis_sections_follow_fixed_order() {
        let out = format_terminal(&Report::Analysis(sample()), &plain_en());
        let positions: Vec<usize> = [
            "Overview",
            "Availability score: 90/100",
            "Suggested SLO",
            "Findings",
            "Recommendations",
        ]
        .iter()
        .map(|needle| out.find(needle).unwrap_or_else(|| panic!("missing {needle}")))
        .collect();
        let mut sorted = positions.clone();
        sorted.sort_unstable();
        assert_eq!(positions, sorted);
    }

    #[test]
    fn score_band_colors_score() {
        let opts = TerminalOptions {
            color: true,
            ..plain_en()
        };
        let mut report = sample();
        let out = format_terminal(&Report::Analysis(report.clone()), &opts);
        assert!(out.contains("\x1b[1m\x1b[32m90/100\x1b[0m"));

        report.availability_score = 55;
        let out = format_terminal(&Report::Analysis(report.clone()), &opts);
        assert!(out.contains("\x1b[1m\x1b[33m55/100\x1b[0m"));

        report.availability_score = 10;
        let out = format_terminal(&Report::Analysis(report), &opts);
        assert!(out.contains("\x1b[1m\x1b[31m10/100\x1b[0m"));
    }

    #[test]
    fn recommendations_are_printed_by_priority() {
        let out = format_terminal(&Report::Analysis(sample()), &plain_en());
        let high = out.find("enable multi_az").unwrap();
        let low = out.find("tidy tags").unwrap();
        assert!(high < low);
        assert!(out.contains("Recommendation 1: Priority: high"));
        assert!(out.contains("Recommendation 2: Priority: low"));
    }

    #[test]
    fn optional_columns_only_when_present() {
        let mut report = sample();
        let out = format_terminal(&Report::Analysis(report.clone()), &plain_en());
        assert!(!out.contains("Effort"));
        assert!(!out.contains("Risk impact"));

        report.findings[1].effort = Some("medium".to_string());
        let out = format_terminal(&Report::Analysis(report), &plain_en());
        assert!(out.contains("Effort"));
        assert!(!out.contains("Risk impact"));
    }

    #[test]
    fn recommendation_title_includes_effort_and_cost() {
        let mut r = rec("中", "use an ASG");
        r.effort = Some("低".to_string());
        r.cost_impact = Some("+$40/month".to_string());
        let title = recommendation_title(3, &r, &TerminalOptions::plain(&JA, 80));
        assert_eq!(title, "推奨事項 3: 優先度: 中 | 実装難易度: 低 | コスト影響: +$40/month");
    }

    #[test]
    fn terraform_example_is_verbatim() {
        let code = "resource \"aws_db_instance\" \"main\" {\n    multi_az = true\n\tengine   = \"mysql\"\n}";
        let mut report = sample();
        report.recommendations[1].terraform_example = Some(code.to_string());
        let out = format_terminal(&Report::Analysis(report), &plain_en());
        assert!(out.contains(code));
        assert!(out.contains("Terraform example:"));
    }

    #[test]
    fn long_text_wraps_without_loss() {
        let long = "冗長化されていない単一のNATゲートウェイがプライベートサブネットの全アウトバウンド通信を担っています。".repeat(3);
        let mut report = sample();
        report.findings[0].description = long.clone();
        report.overview = long.clone();
        let opts = TerminalOptions::plain(&JA, 60);
        let out = format_terminal(&Report::Analysis(report), &opts);

        // The overview panel holds the text contiguously.
        let panel: String = out
            .lines()
            .take_while(|l| !l.starts_with("╰"))
            .filter_map(|l| l.strip_prefix("│ "))
            .collect();
        assert_eq!(panel, long);
        assert_eq!(wrap(&long, 17).concat(), long);

        for line in out.lines().filter(|l| l.starts_with('│') || l.starts_with('┌')) {
            assert!(display_width(line) <= 60, "too wide: {line}");
        }
    }

    #[test]
    fn escape_sequences_in_model_text_are_dropped() {
        let mut report = sample();
        report.overview = "ok\x1b[2J\x1b]0;pwned\x07 done".to_string();
        report.findings[0].category = "SPOF\x1b[31m".to_string();
        report.recommendations[1].priority = "high\x1b[8m".to_string();
        report.recommendations[1].terraform_example = Some("a = 1\r\n\tb = 2\x1b[0m".to_string());
        let out = format_terminal(&Report::Analysis(report), &plain_en());
        assert!(!out.contains('\x1b'));
        assert!(!out.contains('\x07'));
        assert!(out.contains("ok[2J]0;pwned done"));
        assert!(out.contains("a = 1\n\tb = 2[0m"));

        let out = format_terminal(&Report::fallback("raw\x1b[1A\x00text"), &plain_en());
        assert!(out.contains("│ raw[1Atext"));
        let out = format_terminal(&Report::error("bad\x1b[K"), &plain_en());
        assert_eq!(out, "Error: analysis failed: bad[K\n");
    }

    #[test]
    fn colors_survive_control_stripping() {
        let opts = TerminalOptions {
            color: true,
            ..plain_en()
        };
        let out = format_terminal(&Report::error("x\x1b[0m"), &opts);
        assert_eq!(out, "\x1b[1m\x1b[31mError: analysis failed: x[0m\x1b[0m\n");
        assert_eq!(strip_controls("plain\ttext\n"), "plain\ttext\n");
    }

    #[test]
    fn wrap_respects_display_width() {
        assert_eq!(wrap("高可用性構成", 4), vec!["高可", "用性", "構成"]);
        assert_eq!(wrap("enable multi az now", 10), vec!["enable", "multi az", "now"]);
    }

    #[test]
    fn wrap_keeps_blank_lines_and_indentation() {
        assert_eq!(wrap("a\n\n  b", 10), vec!["a", "", "  b"]);
    }

    #[test]
    fn wrap_splits_oversized_words() {
        let lines = wrap("aaaaaaaaaaaa bb", 5);
        assert_eq!(lines, vec!["aaaaa", "aaaaa", "aa bb"]);
    }

    #[test]
    fn empty_sections_say_none() {
        let report = AnalysisReport {
            overview: "ok".to_string(),
            availability_score: 100,
            ..Default::default()
        };
        let out = format_terminal(&Report::Analysis(report), &plain_en());
        assert_eq!(out.matches("  None").count(), 2);
        assert!(!out.contains("Suggested SLO"));
    }

    #[test]
    fn unknown_severity_renders_plainly() {
        let opts = TerminalOptions {
            color: true,
            ..plain_en()
        };
        let mut report = sample();
        report.findings = vec![finding("Other", "critical")];
        let out = format_terminal(&Report::Analysis(report), &opts);
        assert!(out.contains(" critical "));
    }

    #[test]
    fn reporter_format_name() {
        let reporter = TerminalReporter::new(plain_en());
        assert_eq!(reporter.format_name(), "terminal");
        assert!(reporter.render(&Report::error("x")).is_ok());
    }
}
