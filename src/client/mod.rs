//! Language-model invocation.
//!
//! The rest of the crate only sees [`ModelClient`]; [`BedrockClient`] is the
//! production implementation.

pub mod bedrock;

use std::time::Duration;

use crate::TfaError;

pub use bedrock::BedrockClient;

/// Text answer of one model call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelResponse {
    pub text: String,
    pub elapsed: Duration,
}

/// A synchronous, single-shot model endpoint. Implementations do not retry.
pub trait ModelClient {
    fn invoke(&self, prompt: &str) -> Result<ModelResponse, TfaError>;
}
