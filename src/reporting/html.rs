//! Self-contained HTML reporter.
//!
//! Produces a single HTML document with embedded CSS and JavaScript and no
//! external references. Sections, their order and the recommendation order
//! match the terminal output. Every piece of model text is escaped before
//! insertion; colors come from the same [`Emphasis`] the terminal uses.

use std::fmt::Write as FmtWrite;

use chrono::{DateTime, Utc};

use crate::config::Language;
use crate::models::{
    AnalysisReport, Emphasis, Finding, Level, Recommendation, Report, Reporter,
};
use crate::reporting::labels::Labels;
use crate::TfaError;

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
pub struct HtmlOptions {
    pub labels: &'static Labels,
    /// Shown in the header.
    pub generated_at: DateTime<Utc>,
}

impl HtmlOptions {
    pub fn new(language: Language) -> Self {
        HtmlOptions {
            labels: Labels::for_language(language),
            generated_at: Utc::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// Conversion helpers
// ---------------------------------------------------------------------------

/// HTML-escape a string to prevent XSS.
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// CSS classes for an emphasis, e.g. `tone-red strong`.
pub(crate) fn emphasis_class(emphasis: Emphasis) -> String {
    let mut class = format!("tone-{}", emphasis.tone.as_str());
    if emphasis.bold {
        class.push_str(" strong");
    }
    class
}

fn level_span(text: &str, level: Level) -> String {
    format!(
        "<span class=\"{}\">{}</span>",
        emphasis_class(level.emphasis()),
        html_escape(text)
    )
}

// ---------------------------------------------------------------------------
// HTML generation
// ---------------------------------------------------------------------------

/// Formats the report as a self-contained HTML document.
pub fn format_html(report: &Report, opts: &HtmlOptions) -> String {
    let labels = opts.labels;
    let mut out = String::with_capacity(8192);

    // DOCTYPE + head
    writeln!(out, "<!DOCTYPE html>").unwrap();
    writeln!(out, "<html lang=\"{}\">", labels.lang).unwrap();
    writeln!(out, "<head>").unwrap();
    writeln!(out, "<meta charset=\"UTF-8\">").unwrap();
    writeln!(
        out,
        "<meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">"
    )
    .unwrap();
    writeln!(out, "<title>{}</title>", html_escape(labels.title)).unwrap();
    writeln!(out, "<style>{CSS}</style>").unwrap();
    writeln!(out, "</head>").unwrap();
    writeln!(out, "<body>").unwrap();

    // Header
    writeln!(
        out,
        "<header><h1>{}</h1><p class=\"meta\">{}: {}</p></header>",
        html_escape(labels.title),
        html_escape(labels.generated_at),
        opts.generated_at.format("%Y-%m-%d %H:%M:%S UTC"),
    )
    .unwrap();

    match report {
        Report::Error(e) => {
            writeln!(
                out,
                "<section class=\"error\"><h2>{}</h2><p>{}</p></section>",
                html_escape(labels.error_title),
                html_escape(&e.error)
            )
            .unwrap();
        }
        Report::Fallback(f) => {
            writeln!(
                out,
                "<section class=\"raw\"><h2>{}</h2><pre class=\"raw-analysis\">{}</pre></section>",
                html_escape(labels.unstructured),
                html_escape(&f.raw_analysis)
            )
            .unwrap();
        }
        Report::Analysis(r) => write_analysis(&mut out, r, labels),
    }

    // Embedded JS
    writeln!(out, "<script>{JS}</script>").unwrap();

    writeln!(out, "</body>").unwrap();
    writeln!(out, "</html>").unwrap();
    out
}

fn write_analysis(out: &mut String, report: &AnalysisReport, labels: &Labels) {
    // Overview
    writeln!(
        out,
        "<section><h2>{}</h2><p class=\"overview\">{}</p></section>",
        html_escape(labels.overview),
        html_escape(&report.overview)
    )
    .unwrap();

    // Score
    writeln!(
        out,
        "<section class=\"score-container\"><h2>{}</h2>\
         <div class=\"score {}\" data-band=\"{}\">{}/100</div></section>",
        html_escape(labels.score),
        emphasis_class(report.score_band().emphasis()),
        report.score_band().as_str(),
        report.availability_score
    )
    .unwrap();

    // Suggested SLO
    if let Some(slo) = &report.suggested_slo {
        writeln!(
            out,
            "<section class=\"slo\"><h2>{}</h2>\
             <p><span class=\"label\">{}:</span> <strong>{}</strong></p>",
            html_escape(labels.slo),
            html_escape(labels.slo_target),
            html_escape(&slo.availability_target)
        )
        .unwrap();
        if !slo.rationale.trim().is_empty() {
            writeln!(
                out,
                "<p><span class=\"label\">{}:</span> {}</p>",
                html_escape(labels.slo_rationale),
                html_escape(&slo.rationale)
            )
            .unwrap();
        }
        writeln!(out, "</section>").unwrap();
    }

    // Findings
    writeln!(
        out,
        "<section class=\"findings\"><h2>{}</h2>",
        html_escape(labels.findings)
    )
    .unwrap();
    if report.findings.is_empty() {
        writeln!(out, "<p class=\"none\">{}</p>", html_escape(labels.none)).unwrap();
    } else {
        write_filters(out, report, labels);
        write_findings_table(out, report, labels);
    }
    writeln!(out, "</section>").unwrap();

    // Recommendations
    writeln!(
        out,
        "<section class=\"recommendations\"><h2>{}</h2>",
        html_escape(labels.recommendations)
    )
    .unwrap();
    if report.recommendations.is_empty() {
        writeln!(out, "<p class=\"none\">{}</p>", html_escape(labels.none)).unwrap();
    }
    for (i, rec) in report.recommendations_by_priority().into_iter().enumerate() {
        write_recommendation(out, i + 1, rec, labels);
    }
    writeln!(out, "</section>").unwrap();
}

/// Severity checkboxes, one per level that actually occurs.
fn write_filters(out: &mut String, report: &AnalysisReport, labels: &Labels) {
    let mut levels: Vec<Level> = report.findings.iter().map(Finding::level).collect();
    levels.sort();
    levels.dedup();

    write!(
        out,
        "<div class=\"filters\"><span class=\"label\">{}:</span>",
        html_escape(labels.filter)
    )
    .unwrap();
    for level in levels {
        write!(
            out,
            " <label><input type=\"checkbox\" class=\"level-filter\" value=\"{0}\" checked> {0}</label>",
            level.as_str()
        )
        .unwrap();
    }
    writeln!(out, "</div>").unwrap();
}

fn write_findings_table(out: &mut String, report: &AnalysisReport, labels: &Labels) {
    let show_effort = report.findings_have_effort();
    let show_risk = report.findings_have_risk_impact();

    write!(
        out,
        "<table id=\"findings\"><thead><tr><th>{}</th><th>{}</th><th>{}</th><th>{}</th>",
        html_escape(labels.category),
        html_escape(labels.severity),
        html_escape(labels.description),
        html_escape(labels.recommendation)
    )
    .unwrap();
    if show_effort {
        write!(out, "<th>{}</th>", html_escape(labels.effort)).unwrap();
    }
    if show_risk {
        write!(out, "<th>{}</th>", html_escape(labels.risk_impact)).unwrap();
    }
    writeln!(out, "</tr></thead><tbody>").unwrap();

    for f in &report.findings {
        write!(
            out,
            "<tr class=\"finding\" data-level=\"{}\"><td>{}</td><td>{}</td><td>{}</td><td>{}</td>",
            f.level().as_str(),
            html_escape(&f.category),
            level_span(&f.severity, f.level()),
            html_escape(&f.description),
            html_escape(&f.recommendation)
        )
        .unwrap();
        if show_effort {
            write_optional_level_cell(out, f.effort());
        }
        if show_risk {
            write_optional_level_cell(out, f.risk_impact());
        }
        writeln!(out, "</tr>").unwrap();
    }
    writeln!(out, "</tbody></table>").unwrap();
}

fn write_optional_level_cell(out: &mut String, token: Option<&str>) {
    match token {
        Some(t) => write!(out, "<td>{}</td>", level_span(t, Level::normalize(t))).unwrap(),
        None => write!(out, "<td></td>").unwrap(),
    }
}

fn write_recommendation(out: &mut String, index: usize, rec: &Recommendation, labels: &Labels) {
    write!(
        out,
        "<div class=\"recommendation\"><h3>{} {index}: {}",
        html_escape(labels.recommendation_n),
        level_span(&format!("{}: {}", labels.priority, rec.priority), rec.level())
    )
    .unwrap();
    if let Some(effort) = rec.effort() {
        write!(
            out,
            " | {}",
            level_span(&format!("{}: {}", labels.effort, effort), Level::normalize(effort))
        )
        .unwrap();
    }
    if let Some(cost) = rec.cost_impact() {
        write!(
            out,
            " | <span class=\"cost\">{}: {}</span>",
            html_escape(labels.cost_impact),
            html_escape(cost)
        )
        .unwrap();
    }
    writeln!(out, "</h3>").unwrap();
    writeln!(out, "<p>{}</p>", html_escape(&rec.description)).unwrap();

    if let Some(example) = rec.terraform_example() {
        writeln!(
            out,
            "<h4>{}:</h4><pre><code class=\"language-hcl\">{}</code></pre>",
            html_escape(labels.terraform_example),
            html_escape(example)
        )
        .unwrap();
    }
    writeln!(out, "</div>").unwrap();
}

// ---------------------------------------------------------------------------
// Embedded CSS
// ---------------------------------------------------------------------------

const CSS: &str = r#"
:root {
  --bg: #fff; --fg: #333; --card-bg: #f8f9fa; --border: #dee2e6;
  --accent: #0066cc; --red: #dc3545; --yellow: #b8860b; --green: #28a745;
}
@media (prefers-color-scheme: dark) {
  :root {
    --bg: #1a1a2e; --fg: #e8e8e8; --card-bg: #16213e; --border: #333;
    --accent: #4dabf7; --red: #ff6b6b; --yellow: #ffd43b; --green: #69db7c;
  }
}
*, *::before, *::after { box-sizing: border-box; }
body {
  font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto,
    "Hiragino Sans", "Noto Sans JP", sans-serif;
  background: var(--bg); color: var(--fg);
  max-width: 1200px; margin: 0 auto; padding: 1rem 1.5rem;
  line-height: 1.6;
}
header { border-bottom: 3px solid var(--accent); margin-bottom: 1.5rem; }
header h1 { margin: 0 0 0.25rem; font-size: 1.5rem; }
.meta { margin: 0 0 0.75rem; opacity: 0.7; font-size: 0.85rem; }
section { margin-bottom: 2rem; }
h2 { font-size: 1.2rem; border-left: 4px solid var(--accent); padding-left: 0.5rem; }
.overview, .recommendation p { white-space: pre-wrap; }
.score { font-size: 2.5rem; }
.tone-red { color: var(--red); }
.tone-yellow { color: var(--yellow); }
.tone-green { color: var(--green); }
.strong { font-weight: bold; }
.label { font-weight: 600; }
.none { opacity: 0.6; }
.filters { display: flex; flex-wrap: wrap; gap: 0.75rem; font-size: 0.85rem;
  margin-bottom: 0.75rem; }
.filters label { cursor: pointer; user-select: none; }
table { width: 100%; border-collapse: collapse; }
th, td { border: 1px solid var(--border); padding: 0.5rem; text-align: left;
  vertical-align: top; white-space: pre-wrap; }
th { background: var(--card-bg); }
tbody tr:nth-child(even) { background: var(--card-bg); }
.recommendation {
  background: var(--card-bg); border: 1px solid var(--border);
  border-left: 4px solid var(--green); border-radius: 6px;
  padding: 0.75rem 1rem; margin-bottom: 1rem;
}
.recommendation h3 { margin: 0 0 0.5rem; font-size: 1rem; }
pre {
  background: var(--bg); border: 1px solid var(--border); border-radius: 4px;
  padding: 0.75rem; overflow-x: auto; font-size: 0.85rem;
}
.raw-analysis { white-space: pre-wrap; }
.error {
  background: #f8d7da; color: #721c24; border: 1px solid #f5c6cb;
  border-radius: 6px; padding: 1rem;
}
"#;

// ---------------------------------------------------------------------------
// Embedded JS
// ---------------------------------------------------------------------------

const JS: &str = r#"
(function() {
  var filters = document.querySelectorAll('.level-filter');

  function applyFilters() {
    var checked = {};
    filters.forEach(function(cb) { checked[cb.value] = cb.checked; });
    document.querySelectorAll('tr.finding').forEach(function(row) {
      var level = row.getAttribute('data-level');
      row.style.display = checked[level] !== false ? '' : 'none';
    });
  }

  filters.forEach(function(cb) { cb.addEventListener('change', applyFilters); });
})();
"#;

// ---------------------------------------------------------------------------
// HtmlReporter
// ---------------------------------------------------------------------------

/// Self-contained HTML reporter for sharing and archiving analysis results.
pub struct HtmlReporter {
    options: HtmlOptions,
}

impl HtmlReporter {
    pub fn new(options: HtmlOptions) -> Self {
        Self { options }
    }
}

impl Reporter for HtmlReporter {
    fn format_name(&self) -> &str {
        "html"
    }

    fn render(&self, report: &Report) -> Result<String, TfaError> {
        Ok(format_html(report, &self.options))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{SuggestedSlo, Tone};
    use crate::reporting::labels::{EN, JA};
    use chrono::TimeZone;

    fn opts(labels: &'static Labels) -> HtmlOptions {
        HtmlOptions {
            labels,
            generated_at: Utc.with_ymd_and_hms(2025, 3, 1, 9, 30, 0).unwrap(),
        }
    }

    fn sample() -> AnalysisReport {
        AnalysisReport {
            overview: "One NAT gateway & one AZ".to_string(),
            availability_score: 62,
            findings: vec![Finding {
                category: "SPOF".to_string(),
                severity: "高".to_string(),
                description: "<single> NAT".to_string(),
                recommendation: "add one per AZ".to_string(),
                ..Default::default()
            }],
            recommendations: vec![
                Recommendation {
                    priority: "low".to_string(),
                    description: "second".to_string(),
                    ..Default::default()
                },
                Recommendation {
                    priority: "HIGH".to_string(),
                    description: "first".to_string(),
                    terraform_example: Some(
                        "resource \"aws_nat_gateway\" \"b\" {\n  subnet_id = aws_subnet.b.id\n}"
                            .to_string(),
                    ),
                    ..Default::default()
                },
            ],
            suggested_slo: Some(SuggestedSlo {
                availability_target: "99.9%".to_string(),
                rationale: "two AZs".to_string(),
            }),
        }
    }

    #[test]
    fn html_is_valid_document() {
        let html = format_html(&Report::Analysis(sample()), &opts(&EN));
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<html lang=\"en\">"));
        assert!(html.trim_end().ends_with("</html>"));
        assert!(html.contains("2025-03-01 09:30:00 UTC"));
    }

    #[test]
    fn html_is_self_contained() {
        let html = format_html(&Report::Analysis(sample()), &opts(&EN));
        assert!(html.contains("<style>"));
        assert!(html.contains("<script>"));
        assert!(!html.contains("src=\"http"));
        assert!(!html.contains("href=\"http"));
        assert!(!html.contains("<link"));
    }

    #[test]
    fn html_escapes_model_text() {
        let html = format_html(&Report::Analysis(sample()), &opts(&EN));
        assert!(html.contains("One NAT gateway &amp; one AZ"));
        assert!(html.contains("&lt;single&gt; NAT"));
        assert!(html.contains("resource &quot;aws_nat_gateway&quot; &quot;b&quot; {\n  subnet_id"));
        assert!(!html.contains("<single>"));
    }

    #[test]
    fn html_escape_covers_quotes() {
        assert_eq!(html_escape(r#"<a href="x">'&'</a>"#), "&lt;a href=&quot;x&quot;&gt;&#39;&amp;&#39;&lt;/a&gt;");
    }

    #[test]
    fn html_sections_in_terminal_order() {
        let html = format_html(&Report::Analysis(sample()), &opts(&JA));
        let order = ["概要", "可用性スコア", "推奨SLO", "検出された問題点", "改善推奨事項"];
        let positions: Vec<usize> = order
            .iter()
            .map(|h| html.find(&format!("<h2>{h}")).unwrap_or_else(|| panic!("missing {h}")))
            .collect();
        let mut sorted = positions.clone();
        sorted.sort_unstable();
        assert_eq!(positions, sorted);
    }

    #[test]
    fn html_recommendations_sorted_by_priority() {
        let html = format_html(&Report::Analysis(sample()), &opts(&EN));
        assert!(html.find("<p>first</p>").unwrap() < html.find("<p>second</p>").unwrap());
        assert!(html.contains("Recommendation 1: <span class=\"tone-red strong\">Priority: HIGH</span>"));
    }

    #[test]
    fn html_score_uses_band_class() {
        let html = format_html(&Report::Analysis(sample()), &opts(&EN));
        assert!(html.contains("class=\"score tone-yellow strong\" data-band=\"warning\">62/100"));
    }

    #[test]
    fn html_severity_class_from_emphasis() {
        let html = format_html(&Report::Analysis(sample()), &opts(&EN));
        assert!(html.contains("<tr class=\"finding\" data-level=\"high\">"));
        assert!(html.contains("<span class=\"tone-red strong\">高</span>"));
        assert_eq!(emphasis_class(Emphasis::PLAIN), "tone-default");
        assert_eq!(emphasis_class(Emphasis::strong(Tone::Green)), "tone-green strong");
    }

    #[test]
    fn html_optional_columns_follow_data() {
        let mut report = sample();
        let html = format_html(&Report::Analysis(report.clone()), &opts(&EN));
        assert!(!html.contains("<th>Effort</th>"));
        report.findings[0].risk_impact = Some("medium".to_string());
        let html = format_html(&Report::Analysis(report), &opts(&EN));
        assert!(!html.contains("<th>Effort</th>"));
        assert!(html.contains("<th>Risk impact</th>"));
        assert!(html.contains("<td><span class=\"tone-yellow strong\">medium</span></td>"));
    }

    #[test]
    fn html_error_report() {
        let html = format_html(&Report::error("<AccessDenied>"), &opts(&JA));
        assert!(html.contains("分析実行中にエラーが発生しました"));
        assert!(html.contains("&lt;AccessDenied&gt;"));
        assert!(!html.contains("可用性スコア</h2>"));
    }

    #[test]
    fn html_fallback_report() {
        let raw = "Not JSON <b>at all</b> & \"quoted\"";
        let html = format_html(&Report::fallback(raw), &opts(&EN));
        assert!(html.contains(
            "<pre class=\"raw-analysis\">Not JSON &lt;b&gt;at all&lt;/b&gt; &amp; &quot;quoted&quot;</pre>"
        ));
        assert!(!html.contains("<table"));
    }

    #[test]
    fn html_filters_list_present_levels() {
        let html = format_html(&Report::Analysis(sample()), &opts(&EN));
        assert!(html.contains("value=\"high\""));
        assert!(!html.contains("value=\"low\""));
    }

    #[test]
    fn reporter_format_name() {
        let reporter = HtmlReporter::new(opts(&EN));
        assert_eq!(reporter.format_name(), "html");
        assert!(reporter.render(&Report::error("x")).unwrap().contains("<html"));
    }
}
