//! Turns an extracted JSON candidate into a canonical [`AnalysisReport`].
//!
//! Validation never repairs: a candidate missing a required key, or with a
//! field of the wrong shape, is rejected as a whole and the caller falls back
//! to the raw text.

use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::models::{AnalysisReport, Finding, Recommendation, SuggestedSlo};

/// Keys every structured answer must carry.
pub const REQUIRED_KEYS: [&str; 4] = [
    "overview",
    "availability_score",
    "findings",
    "recommendations",
];

/// Why a candidate was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("expected a JSON object at the top level")]
    NotAnObject,

    #[error("missing required key '{0}'")]
    MissingKey(&'static str),

    #[error("'{key}' has the wrong shape: {reason}")]
    WrongShape { key: String, reason: String },
}

fn wrong_shape(key: impl Into<String>, reason: impl Into<String>) -> ValidationError {
    ValidationError::WrongShape {
        key: key.into(),
        reason: reason.into(),
    }
}

/// Validates a candidate and builds the canonical report from it.
pub fn validate(candidate: &Value) -> Result<AnalysisReport, ValidationError> {
    let obj = candidate.as_object().ok_or(ValidationError::NotAnObject)?;

    for key in REQUIRED_KEYS {
        if !obj.contains_key(key) {
            return Err(ValidationError::MissingKey(key));
        }
    }

    let overview = match &obj["overview"] {
        Value::String(s) => s.clone(),
        other => return Err(wrong_shape("overview", type_name(other))),
    };

    let availability_score = parse_score(&obj["availability_score"])?;
    let findings: Vec<Finding> = parse_items(obj, "findings")?;
    let recommendations: Vec<Recommendation> = parse_items(obj, "recommendations")?;

    let suggested_slo = match obj.get("suggested_slo") {
        None | Some(Value::Null) => None,
        Some(value @ Value::Object(_)) => Some(
            SuggestedSlo::deserialize(value)
                .map_err(|e| wrong_shape("suggested_slo", e.to_string()))?,
        ),
        Some(other) => return Err(wrong_shape("suggested_slo", type_name(other))),
    };

    Ok(AnalysisReport {
        overview,
        availability_score,
        findings,
        recommendations,
        suggested_slo,
    })
}

/// Reads the score as a JSON integer in `0..=100`. An explicit `null`
/// means no score was given and counts as 0. Anything else is rejected,
/// never rounded or clamped.
pub(crate) fn parse_score(value: &Value) -> Result<u8, ValidationError> {
    match value {
        Value::Null => Ok(0),
        Value::Number(n) => n
            .as_u64()
            .filter(|score| *score <= 100)
            .map(|score| score as u8)
            .ok_or_else(|| {
                wrong_shape("availability_score", format!("{n} is not an integer in 0..=100"))
            }),
        other => Err(wrong_shape("availability_score", type_name(other))),
    }
}

fn parse_items<T>(obj: &Map<String, Value>, key: &'static str) -> Result<Vec<T>, ValidationError>
where
    T: for<'de> Deserialize<'de>,
{
    let items = obj[key]
        .as_array()
        .ok_or_else(|| wrong_shape(key, format!("expected an array, got {}", type_name(&obj[key]))))?;

    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            if !item.is_object() {
                return Err(wrong_shape(
                    format!("{key}[{i}]"),
                    format!("expected an object, got {}", type_name(item)),
                ));
            }
            T::deserialize(item).map_err(|e| wrong_shape(format!("{key}[{i}]"), e.to_string()))
        })
        .collect()
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
