mod level;

pub use level::{Emphasis, Level, ScoreBand, Tone, GOOD_SCORE, WARNING_SCORE};

use serde::{Deserialize, Deserializer, Serialize};

use crate::TfaError;

// ---------------------------------------------------------------------------
// Finding
// ---------------------------------------------------------------------------

/// A single availability problem reported by the model.
///
/// `severity`, `effort` and `risk_impact` keep the model's raw tokens; they
/// are normalized with [`Level::normalize`] only when rendered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    #[serde(default, deserialize_with = "string_or_null")]
    pub category: String,
    #[serde(default, deserialize_with = "string_or_null")]
    pub severity: String,
    #[serde(default, deserialize_with = "string_or_null")]
    pub description: String,
    #[serde(default, deserialize_with = "string_or_null")]
    pub recommendation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effort: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_impact: Option<String>,
}

impl Finding {
    pub fn level(&self) -> Level {
        Level::normalize(&self.severity)
    }

    /// Effort token, if the model supplied a non-empty one.
    pub fn effort(&self) -> Option<&str> {
        non_empty(&self.effort)
    }

    pub fn risk_impact(&self) -> Option<&str> {
        non_empty(&self.risk_impact)
    }
}

// ---------------------------------------------------------------------------
// Recommendation
// ---------------------------------------------------------------------------

/// An improvement the model proposes, optionally with example Terraform.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    #[serde(default, deserialize_with = "string_or_null")]
    pub priority: String,
    #[serde(default, deserialize_with = "string_or_null")]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effort: Option<String>,
    /// Verbatim code. Renderers must not re-indent or reflow it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub terraform_example: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost_impact: Option<String>,
}

impl Recommendation {
    pub fn level(&self) -> Level {
        Level::normalize(&self.priority)
    }

    pub fn effort(&self) -> Option<&str> {
        non_empty(&self.effort)
    }

    pub fn terraform_example(&self) -> Option<&str> {
        // Whitespace-only examples are treated as absent; real ones are
        // returned untouched.
        self.terraform_example
            .as_deref()
            .filter(|s| !s.trim().is_empty())
    }

    pub fn cost_impact(&self) -> Option<&str> {
        non_empty(&self.cost_impact)
    }
}

// ---------------------------------------------------------------------------
// SuggestedSlo
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestedSlo {
    #[serde(default, deserialize_with = "string_or_null")]
    pub availability_target: String,
    #[serde(default, deserialize_with = "string_or_null")]
    pub rationale: String,
}

// ---------------------------------------------------------------------------
// AnalysisReport
// ---------------------------------------------------------------------------

/// A fully validated report. Only `analysis::validate` constructs these from
/// model output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub overview: String,
    /// Always within `0..=100`.
    pub availability_score: u8,
    pub findings: Vec<Finding>,
    pub recommendations: Vec<Recommendation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_slo: Option<SuggestedSlo>,
}

impl AnalysisReport {
    pub fn score_band(&self) -> ScoreBand {
        ScoreBand::from_score(self.availability_score)
    }

    /// Recommendations in display order: by priority level, ties keeping the
    /// order the model gave them.
    pub fn recommendations_by_priority(&self) -> Vec<&Recommendation> {
        let mut ordered: Vec<&Recommendation> = self.recommendations.iter().collect();
        ordered.sort_by_key(|r| r.level());
        ordered
    }

    /// `true` when any finding carries an effort token; decides whether the
    /// effort column is shown.
    pub fn findings_have_effort(&self) -> bool {
        self.findings.iter().any(|f| f.effort().is_some())
    }

    pub fn findings_have_risk_impact(&self) -> bool {
        self.findings.iter().any(|f| f.risk_impact().is_some())
    }
}

// ---------------------------------------------------------------------------
// Fallback / Error
// ---------------------------------------------------------------------------

/// The model answered, but not with a usable structured report. Holds the
/// answer exactly as received.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FallbackReport {
    pub raw_analysis: String,
}

/// The model was never reached or failed to answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorReport {
    pub error: String,
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// The outcome of one analysis: exactly one of the three variants.
///
/// Serializes to the variant's own shape, so the JSON sink emits either the
/// canonical report, `{"raw_analysis": ..}` or `{"error": ..}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Report {
    Analysis(AnalysisReport),
    Fallback(FallbackReport),
    Error(ErrorReport),
}

impl Report {
    pub fn fallback(raw: impl Into<String>) -> Self {
        Report::Fallback(FallbackReport {
            raw_analysis: raw.into(),
        })
    }

    pub fn error(message: impl Into<String>) -> Self {
        Report::Error(ErrorReport {
            error: message.into(),
        })
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Report::Analysis(_) => "analysis",
            Report::Fallback(_) => "fallback",
            Report::Error(_) => "error",
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Report::Error(_))
    }
}

// ---------------------------------------------------------------------------
// Reporter trait
// ---------------------------------------------------------------------------

/// The pluggable interface for output formats. Renderers only read the
/// report; where the output goes is decided by the caller.
pub trait Reporter {
    fn format_name(&self) -> &str;
    fn render(&self, report: &Report) -> Result<String, TfaError>;
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.trim().is_empty())
}

/// Accepts a JSON string or `null` (read as empty). Any other type is a
/// shape error.
fn string_or_null<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
