//! Factory for creating LLM providers.

use std::sync::Arc;

use ingrain_core::config::{LlmProvider, LlmProviderConfig};
use ingrain_core::error::IngrainResult;
use ingrain_core::traits::{Llm, LlmConfig};

use crate::anthropic::AnthropicLlm;
use crate::ollama::OllamaLlm;
use crate::openai::OpenAIProvider;

/// Factory for creating LLM providers.
pub struct LlmFactory;

impl LlmFactory {
    /// Create an LLM provider from the given configuration.
    pub fn create(provider: LlmProvider, config: LlmConfig) -> IngrainResult<Arc<dyn Llm>> {
        let llm: Arc<dyn Llm> = match provider {
            LlmProvider::OpenAI => Arc::new(OpenAIProvider::new(config)?),
            LlmProvider::Anthropic => Arc::new(AnthropicLlm::new(config)?),
            LlmProvider::Ollama => Arc::new(OllamaLlm::new(config)?),
        };
        tracing::info!(provider = provider.as_str(), model = llm.model_name(), "Created LLM provider");
        Ok(llm)
    }

    /// Create the provider described by a provider config section.
    pub fn from_config(config: &LlmProviderConfig) -> IngrainResult<Arc<dyn Llm>> {
        Self::create(config.provider, config.config.clone())
    }

    /// Create an Ollama LLM provider with default configuration.
    pub fn ollama() -> IngrainResult<Arc<dyn Llm>> {
        Self::create(LlmProvider::Ollama, LlmConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config_uses_provider_and_model() {
        let config = LlmProviderConfig {
            provider: LlmProvider::Anthropic,
            config: LlmConfig {
                model: "claude-test".to_string(),
                api_key: Some("sk-ant".to_string()),
                ..Default::default()
            },
        };
        let llm = LlmFactory::from_config(&config).unwrap();
        assert_eq!(llm.model_name(), "claude-test");
    }

    #[test]
    fn test_create_keeps_configured_model() {
        let config = LlmConfig {
            model: "mistral".to_string(),
            ..Default::default()
        };
        let llm = LlmFactory::create(LlmProvider::Ollama, config).unwrap();
        assert_eq!(llm.model_name(), "mistral");
    }

    #[test]
    fn test_ollama_needs_no_key() {
        assert!(LlmFactory::ollama().is_ok());
    }
}
