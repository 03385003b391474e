//! Turning a model response into a [`Report`].
//!
//! [`parse_response`] is the single entry point from raw text to a report:
//! extraction, then validation, with the raw text preserved as a fallback
//! whenever either step gives up. It never fails.

pub mod extract;
pub mod prompt;
pub mod resources;
pub mod validate;

use std::time::{Duration, Instant};

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::client::ModelClient;
use crate::models::Report;

pub use extract::{extract, Extraction, Strategy};
pub use prompt::PromptBuilder;
pub use resources::{load_resources, parse_resources, resource_summary, ResourceCount};
pub use validate::{validate, ValidationError};

/// Extracts and validates a model response. Anything that does not yield a
/// complete report becomes a fallback holding `raw` unchanged.
pub fn parse_response(raw: &str) -> Report {
    match extract(raw) {
        Extraction::Parsed { value, strategy } => match validate(&value) {
            Ok(report) => Report::Analysis(report),
            Err(e) => {
                debug!(strategy = strategy.as_str(), error = %e, "candidate rejected");
                Report::fallback(raw)
            }
        },
        Extraction::Unparsed => Report::fallback(raw),
    }
}

/// Reads back something previously produced by this tool: a saved model
/// response or a JSON report. The `{"raw_analysis": ..}` and `{"error": ..}`
/// shapes map back to their own variants; anything else goes through
/// [`parse_response`].
pub fn load_saved_report(text: &str) -> Report {
    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(text) {
        if map.len() == 1 {
            match (map.get("raw_analysis"), map.get("error")) {
                (Some(Value::String(raw)), _) => return Report::fallback(raw.as_str()),
                (_, Some(Value::String(message))) => return Report::error(message.as_str()),
                _ => {}
            }
        }
    }
    parse_response(text)
}

// ---------------------------------------------------------------------------
// Analyzer
// ---------------------------------------------------------------------------

/// Result of one analysis run.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub report: Report,
    /// The model's answer as received, when the model answered at all.
    pub raw_response: Option<String>,
    /// Wall time of the model call.
    pub elapsed: Duration,
}

/// Prompt, model call and parse, in that order. One model call per
/// [`Analyzer::analyze`].
pub struct Analyzer<C: ModelClient> {
    client: C,
    prompts: PromptBuilder,
}

impl<C: ModelClient> Analyzer<C> {
    pub fn new(client: C, prompts: PromptBuilder) -> Self {
        Self { client, prompts }
    }

    pub fn prompt(&self, resources: &Value) -> String {
        self.prompts.availability_prompt(resources)
    }

    /// Runs the analysis. A failed model call is reported as
    /// [`Report::Error`], never as an `Err`.
    pub fn analyze(&self, resources: &Value) -> Analysis {
        let prompt = self.prompt(resources);
        debug!(chars = prompt.chars().count(), "built availability prompt");

        let started = Instant::now();
        match self.client.invoke(&prompt) {
            Ok(response) => {
                info!(elapsed_ms = response.elapsed.as_millis() as u64, "model answered");
                let report = parse_response(&response.text);
                if let Report::Fallback(_) = report {
                    warn!("model response could not be structured; keeping raw text");
                }
                Analysis {
                    report,
                    raw_response: Some(response.text),
                    elapsed: response.elapsed,
                }
            }
            Err(e) => {
                warn!(error = %e, "model invocation failed");
                Analysis {
                    report: Report::error(e.to_string()),
                    raw_response: None,
                    elapsed: started.elapsed(),
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ModelResponse;
    use crate::config::Language;
    use crate::TfaError;
    use serde_json::json;
    use std::cell::RefCell;

    struct CannedClient {
        answer: Result<String, String>,
        prompts: RefCell<Vec<String>>,
    }

    impl CannedClient {
        fn answering(text: &str) -> Self {
            Self {
                answer: Ok(text.to_string()),
                prompts: RefCell::new(Vec::new()),
            }
        }

        fn failing(message: &str) -> Self {
            Self {
                answer: Err(message.to_string()),
                prompts: RefCell::new(Vec::new()),
            }
        }
    }

    impl ModelClient for CannedClient {
        fn invoke(&self, prompt: &str) -> Result<ModelResponse, TfaError> {
            self.prompts.borrow_mut().push(prompt.to_string());
            match &self.answer {
                Ok(text) => Ok(ModelResponse {
                    text: text.clone(),
                    elapsed: Duration::from_millis(5),
                }),
                Err(message) => Err(TfaError::Upstream(message.clone())),
            }
        }
    }

    const VALID: &str =
        r#"{"overview":"ok","availability_score":90,"findings":[],"recommendations":[]}"#;

    #[test]
    fn valid_response_is_analysis() {
        let report = parse_response(VALID);
        assert!(matches!(report, Report::Analysis(ref r) if r.availability_score == 90));
    }

    #[test]
    fn parse_is_idempotent() {
        let raw = "prose ```json\n{\"overview\":\"x\",\"availability_score\":40,\"findings\":[],\"recommendations\":[]}\n```";
        assert_eq!(parse_response(raw), parse_response(raw));
    }

    #[test]
    fn invalid_candidate_falls_back_to_original_text() {
        let raw = "Result:\n```json\n{\"overview\": \"x\", \"findings\": []}\n```";
        assert_eq!(parse_response(raw), Report::fallback(raw));
    }

    #[test]
    fn malformed_scores_fall_back_to_raw_text() {
        for score in ["140", "\"65%\"", "72.6", "-5"] {
            let raw = format!(
                r#"{{"overview":"o","availability_score":{score},"findings":[],"recommendations":[]}}"#
            );
            assert_eq!(parse_response(&raw), Report::fallback(raw.as_str()), "score {score}");
        }
    }

    #[test]
    fn prose_falls_back_byte_for_byte() {
        let raw = "  申し訳ありませんが、分析できません。\r\n";
        match parse_response(raw) {
            Report::Fallback(f) => assert_eq!(f.raw_analysis, raw),
            other => panic!("expected fallback, got {other:?}"),
        }
    }

    #[test]
    fn saved_wrappers_map_back() {
        assert_eq!(
            load_saved_report(r#"{"raw_analysis": "free text"}"#),
            Report::fallback("free text")
        );
        assert_eq!(
            load_saved_report(r#"{"error": "AccessDenied"}"#),
            Report::error("AccessDenied")
        );
    }

    #[test]
    fn saved_canonical_report_round_trips() {
        let original = parse_response(VALID);
        let saved = serde_json::to_string_pretty(&original).unwrap();
        assert_eq!(load_saved_report(&saved), original);
    }

    #[test]
    fn wrapper_with_extra_keys_is_parsed_normally() {
        let text = r#"{"error": "x", "note": "y"}"#;
        assert_eq!(load_saved_report(text), Report::fallback(text));
    }

    #[test]
    fn analyzer_sends_one_prompt_and_parses() {
        let analyzer = Analyzer::new(
            CannedClient::answering(VALID),
            PromptBuilder::new(Language::En),
        );
        let analysis = analyzer.analyze(&json!({"aws_vpc": [{}]}));
        assert!(matches!(analysis.report, Report::Analysis(_)));
        assert_eq!(analysis.raw_response.as_deref(), Some(VALID));
        assert_eq!(analysis.elapsed, Duration::from_millis(5));
        let prompts = analyzer.client.prompts.borrow();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("aws_vpc"));
    }

    #[test]
    fn analyzer_turns_client_failure_into_error_report() {
        let analyzer = Analyzer::new(
            CannedClient::failing("throttled"),
            PromptBuilder::new(Language::Ja),
        );
        let analysis = analyzer.analyze(&json!({}));
        assert!(analysis.report.is_error());
        assert!(analysis.raw_response.is_none());
        match analysis.report {
            Report::Error(e) => assert!(e.error.contains("throttled")),
            _ => unreachable!(),
        }
    }
}
