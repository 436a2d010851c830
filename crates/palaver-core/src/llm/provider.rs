//! LlmProvider trait definition.
//!
//! The core abstraction that all inference backends implement. Uses RPITIT
//! for `complete`; there is no streaming path.

use palaver_types::llm::{CompletionRequest, CompletionResponse, LlmError};

/// Trait for hosted LLM backends (Gemini, Anthropic, ...).
///
/// Implementations live in palaver-infra (e.g., `GeminiProvider`).
pub trait LlmProvider: Send + Sync {
    /// Human-readable provider name (e.g., "gemini", "anthropic").
    fn name(&self) -> &str;

    /// Model identifier used when a request leaves `model` empty.
    fn model(&self) -> &str;

    /// Send a completion request and receive the full response.
    fn complete(
        &self,
        request: &CompletionRequest,
    ) -> impl std::future::Future<Output = Result<CompletionResponse, LlmError>> + Send;
}
