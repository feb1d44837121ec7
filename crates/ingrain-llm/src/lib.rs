//! ingrain-llm - Text-generation provider implementations for ingrain.
//!
//! # Supported Providers
//!
//! - **OpenAI** (feature: `openai`)
//! - **Anthropic** (feature: `anthropic`)
//! - **Ollama** (feature: `ollama`) - Local models via Ollama
//!
//! # Example
//!
//! ```ignore
//! use ingrain_llm::LlmFactory;
//!
//! let llm = LlmFactory::from_config(&config.llm)?;
//! let client = LlmQuizClient::new(llm);
//! ```

mod anthropic;
mod factory;
mod ollama;
mod openai;

pub use anthropic::AnthropicLlm;
pub use factory::LlmFactory;
pub use ollama::OllamaLlm;
pub use openai::OpenAIProvider;

// Re-export core types for convenience
pub use ingrain_core::config::LlmProvider;
pub use ingrain_core::traits::{GenerationOptions, Llm, LlmConfig, LlmResponse};

use ingrain_core::error::{IngrainError, IngrainResult};

/// API key from the config, else from `env_var`. Blank keys count as missing.
pub(crate) fn resolve_api_key(
    config: &LlmConfig,
    env_var: &str,
    provider: &str,
) -> IngrainResult<String> {
    config
        .api_key
        .clone()
        .or_else(|| std::env::var(env_var).ok())
        .filter(|key| !key.trim().is_empty())
        .ok_or_else(|| {
            IngrainError::configuration(format!(
                "{} API key not found. Set {} or provide api_key in config.",
                provider, env_var
            ))
        })
}
