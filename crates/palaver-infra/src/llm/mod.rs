//! LLM provider implementations.
//!
//! Concrete [`LlmProvider`](palaver_core::llm::provider::LlmProvider)
//! implementations plus the factory ([`create_provider`]) that builds the
//! one named in `[inference]`.

pub mod anthropic;
pub mod canned;
pub mod gemini;

use secrecy::SecretString;

use palaver_core::llm::box_provider::BoxLlmProvider;
use palaver_types::config::{InferenceConfig, InferenceProviderKind};
use palaver_types::llm::LlmError;

use self::anthropic::AnthropicProvider;
use self::canned::CannedProvider;
use self::gemini::GeminiProvider;
use crate::config::non_empty;

/// Create a [`BoxLlmProvider`] from the `[inference]` section.
///
/// Hosted providers need the API key resolved from `api_key_env`; a missing
/// key is a configuration error rather than a per-request failure.
pub fn create_provider(
    config: &InferenceConfig,
    api_key: Option<SecretString>,
) -> Result<BoxLlmProvider, LlmError> {
    let require_key = |key: Option<SecretString>| {
        key.ok_or_else(|| {
            LlmError::Configuration(format!(
                "{} provider needs an API key in ${}",
                config.provider, config.api_key_env
            ))
        })
    };

    match config.provider {
        InferenceProviderKind::Gemini => Ok(BoxLlmProvider::new(gemini_provider(
            config,
            require_key(api_key)?,
        )?)),
        InferenceProviderKind::Anthropic => Ok(BoxLlmProvider::new(anthropic_provider(
            config,
            require_key(api_key)?,
        )?)),
        InferenceProviderKind::Canned => {
            Ok(BoxLlmProvider::new(CannedProvider::new(config.model.clone())))
        }
    }
}

fn gemini_provider(config: &InferenceConfig, key: SecretString) -> Result<GeminiProvider, LlmError> {
    let provider = GeminiProvider::new(key, config.model.clone())?;
    Ok(match non_empty(config.base_url.as_deref()) {
        Some(base_url) => provider.with_base_url(base_url.to_string()),
        None => provider,
    })
}

fn anthropic_provider(
    config: &InferenceConfig,
    key: SecretString,
) -> Result<AnthropicProvider, LlmError> {
    let provider = AnthropicProvider::new(key, config.model.clone())?;
    Ok(match non_empty(config.base_url.as_deref()) {
        Some(base_url) => provider.with_base_url(base_url.to_string()),
        None => provider,
    })
}
