//! AWS Bedrock client over the model-agnostic Converse API.
//!
//! The SDK is async; the client owns a current-thread Tokio runtime and
//! blocks on the single request, so callers stay synchronous.

use std::time::{Duration, Instant};

use aws_config::{BehaviorVersion, Region};
use aws_sdk_bedrockruntime::error::DisplayErrorContext;
use aws_sdk_bedrockruntime::types::{
    ContentBlock, ConversationRole, ConverseOutput, InferenceConfiguration, Message,
};
use aws_sdk_bedrockruntime::Client;
use tokio::runtime::Runtime;
use tokio::time::timeout;
use tracing::{debug, warn};

use super::{ModelClient, ModelResponse};
use crate::config::ModelConfig;
use crate::TfaError;

pub struct BedrockClient {
    runtime: Runtime,
    client: Client,
    model_id: String,
    max_tokens: u32,
    temperature: f32,
    timeout: Duration,
}

impl BedrockClient {
    /// Resolves AWS credentials for the configured region and builds the
    /// SDK client. No request is sent yet.
    pub fn new(config: &ModelConfig) -> Result<Self, TfaError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| TfaError::Upstream(format!("failed to start async runtime: {e}")))?;

        let sdk_config = runtime.block_on(
            aws_config::defaults(BehaviorVersion::latest())
                .region(Region::new(config.region.clone()))
                .load(),
        );
        debug!(region = %config.region, model_id = %config.model_id, "bedrock client ready");

        Ok(Self {
            runtime,
            client: Client::new(&sdk_config),
            model_id: config.model_id.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            timeout: config.timeout(),
        })
    }

    async fn converse(&self, prompt: &str) -> Result<String, TfaError> {
        let message = Message::builder()
            .role(ConversationRole::User)
            .content(ContentBlock::Text(prompt.to_string()))
            .build()
            .map_err(|e| TfaError::Upstream(format!("failed to build message: {e}")))?;

        let inference = InferenceConfiguration::builder()
            .max_tokens(i32::try_from(self.max_tokens).unwrap_or(i32::MAX))
            .temperature(self.temperature)
            .build();

        let response = self
            .client
            .converse()
            .model_id(&self.model_id)
            .messages(message)
            .inference_config(inference)
            .send()
            .await
            .map_err(|e| TfaError::Upstream(format!("{}", DisplayErrorContext(&e))))?;

        let output = response
            .output()
            .ok_or_else(|| TfaError::Upstream("no output in bedrock response".to_string()))?;

        let text = match output {
            ConverseOutput::Message(msg) => msg.content().iter().find_map(|block| {
                if let ContentBlock::Text(t) = block {
                    Some(t.clone())
                } else {
                    None
                }
            }),
            _ => None,
        };

        text.ok_or_else(|| TfaError::Upstream("bedrock response has no text content".to_string()))
    }
}

impl ModelClient for BedrockClient {
    fn invoke(&self, prompt: &str) -> Result<ModelResponse, TfaError> {
        let started = Instant::now();
        let result = self
            .runtime
            .block_on(async { timeout(self.timeout, self.converse(prompt)).await });

        match result {
            Ok(Ok(text)) => Ok(ModelResponse {
                text,
                elapsed: started.elapsed(),
            }),
            Ok(Err(e)) => Err(e),
            Err(_) => {
                warn!(timeout_secs = self.timeout.as_secs(), "bedrock request timed out");
                Err(TfaError::Upstream(format!(
                    "request timed out after {}s",
                    self.timeout.as_secs()
                )))
            }
        }
    }
}
