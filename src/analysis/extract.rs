//! Pulls a JSON document out of free-form model output.
//!
//! Models are asked for bare JSON but regularly wrap it in a ```json fence,
//! surround it with prose, or refuse outright. Strategies are tried in a
//! fixed order and the first one that parses wins:
//!
//! 1. the whole text;
//! 2. the body of the first ```json fence, closed by the *last* ``` in the
//!    text so that fences nested inside example code survive;
//! 3. the span from the first `{` to the last `}`, then each balanced
//!    top-level `{...}` span in order of appearance.
//!
//! The first-`{`/last-`}` span breaks when unrelated braces follow the real
//! object (a Terraform example after the JSON, say). The balanced-span pass
//! exists for exactly that case.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;
use tracing::debug;

/// Characters of the last failed fragment shown in debug output.
const PREVIEW_CHARS: usize = 100;

/// Which extraction strategy produced a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Whole,
    Fence,
    BraceSpan,
    BalancedSpan,
}

impl Strategy {
    pub const fn as_str(self) -> &'static str {
        match self {
            Strategy::Whole => "whole",
            Strategy::Fence => "fence",
            Strategy::BraceSpan => "brace-span",
            Strategy::BalancedSpan => "balanced-span",
        }
    }
}

/// Outcome of [`extract`]. `Parsed` is only a candidate; it still has to pass
/// validation before it counts as a report.
#[derive(Debug, Clone, PartialEq)]
pub enum Extraction {
    Parsed { value: Value, strategy: Strategy },
    Unparsed,
}

/// Opening fence tagged as JSON, e.g. ```` ```json ```` or ```` ``` JSON ````.
fn json_fence() -> &'static Regex {
    static FENCE: OnceLock<Regex> = OnceLock::new();
    FENCE.get_or_init(|| Regex::new(r"(?i)```[ \t]*json").expect("fence regex is valid"))
}

/// Runs the strategies in order and returns the first parsed value.
pub fn extract(raw: &str) -> Extraction {
    if let Ok(value) = serde_json::from_str::<Value>(raw) {
        debug!(strategy = Strategy::Whole.as_str(), "parsed model response");
        return Extraction::Parsed {
            value,
            strategy: Strategy::Whole,
        };
    }

    let mut last_attempt: Option<&str> = None;

    if let Some(fragment) = fenced_fragment(raw) {
        if let Some(value) = try_parse(fragment, Strategy::Fence) {
            return Extraction::Parsed {
                value,
                strategy: Strategy::Fence,
            };
        }
        last_attempt = Some(fragment);
    }

    if let Some(fragment) = brace_span(raw) {
        if let Some(value) = try_parse(fragment, Strategy::BraceSpan) {
            return Extraction::Parsed {
                value,
                strategy: Strategy::BraceSpan,
            };
        }
        last_attempt = Some(fragment);

        for fragment in balanced_spans(raw) {
            if let Some(value) = try_parse(fragment, Strategy::BalancedSpan) {
                return Extraction::Parsed {
                    value,
                    strategy: Strategy::BalancedSpan,
                };
            }
            last_attempt = Some(fragment);
        }
    }

    match last_attempt {
        Some(fragment) => debug!(
            fragment = %preview(fragment),
            "no extraction strategy produced JSON"
        ),
        None => debug!("model response contains no JSON candidates"),
    }
    Extraction::Unparsed
}

fn try_parse(fragment: &str, strategy: Strategy) -> Option<Value> {
    match serde_json::from_str::<Value>(fragment) {
        Ok(value) => {
            debug!(strategy = strategy.as_str(), "parsed model response");
            Some(value)
        }
        Err(e) => {
            debug!(strategy = strategy.as_str(), error = %e, "candidate is not valid JSON");
            None
        }
    }
}

/// Body of the first ```json fence up to the last closing fence. An
/// unterminated fence runs to the end of the text.
pub(crate) fn fenced_fragment(raw: &str) -> Option<&str> {
    let open = json_fence().find(raw)?;
    let rest = &raw[open.end()..];
    let body = match rest.rfind("```") {
        Some(end) => &rest[..end],
        None => rest,
    };
    Some(body.trim())
}

/// First `{` through last `}`, inclusive.
pub(crate) fn brace_span(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end <= start {
        return None;
    }
    Some(raw[start..=end].trim())
}

/// Every balanced top-level `{...}` span, skipping braces inside JSON
/// string literals. A `{` that never closes is skipped and the scan resumes
/// right after it.
pub(crate) fn balanced_spans(raw: &str) -> Vec<&str> {
    let mut spans = Vec::new();
    let mut from = 0;

    while let Some(offset) = raw[from..].find('{') {
        let begin = from + offset;
        match balanced_len(&raw[begin..]) {
            Some(len) => {
                spans.push(&raw[begin..begin + len]);
                from = begin + len;
            }
            None => from = begin + 1,
        }
    }

    spans
}

/// Byte length of the balanced `{...}` that `text` starts with, or `None`
/// when it runs off the end.
fn balanced_len(text: &str) -> Option<usize> {
    let mut depth: usize = 0;
    let mut in_string = false;
    let mut escape = false;

    for (index, ch) in text.char_indices() {
        if in_string {
            if escape {
                escape = false;
            } else if ch == '\\' {
                escape = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(index + ch.len_utf8());
                }
            }
            _ => {}
        }
    }

    None
}

fn preview(fragment: &str) -> String {
    let mut out: String = fragment.chars().take(PREVIEW_CHARS).collect();
    if fragment.chars().count() > PREVIEW_CHARS {
        out.push_str("...");
    }
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
