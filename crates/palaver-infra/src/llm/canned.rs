//! CannedProvider -- offline placeholder replies.
//!
//! Answers every prompt with a fixed acknowledgement that quotes it back,
//! without any network call. Used for demos and local development before a
//! model key is configured.

use palaver_core::llm::provider::LlmProvider;
use palaver_types::llm::{CompletionRequest, CompletionResponse, LlmError, Usage};
use uuid::Uuid;

pub struct CannedProvider {
    model: String,
}

impl CannedProvider {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
        }
    }

    pub fn reply_for(prompt: &str) -> String {
        format!("Model is being integrated... Reply for: \"{prompt}\"")
    }
}

impl Default for CannedProvider {
    fn default() -> Self {
        Self::new("canned")
    }
}

impl LlmProvider for CannedProvider {
    fn name(&self) -> &str {
        "canned"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let prompt = request.last_user_content().ok_or(LlmError::EmptyResponse)?;
        Ok(CompletionResponse {
            id: Uuid::now_v7().to_string(),
            content: Self::reply_for(prompt),
            model: self.model.clone(),
            stop_reason: Some("stop".to_string()),
            usage: Usage::default(),
        })
    }
}
