//! OpenAI LLM provider implementation.

use async_trait::async_trait;

use ingrain_core::error::{IngrainError, IngrainResult};
use ingrain_core::traits::{GenerationOptions, Llm, LlmConfig, LlmResponse};
use ingrain_core::types::Message;

#[cfg(feature = "openai")]
use async_openai::{
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestAssistantMessage, ChatCompletionRequestMessage,
        ChatCompletionRequestSystemMessage, ChatCompletionRequestUserMessage,
        CreateChatCompletionRequest,
    },
    Client,
};
#[cfg(feature = "openai")]
use ingrain_core::traits::TokenUsage;
#[cfg(feature = "openai")]
use ingrain_core::types::MessageRole;

use crate::resolve_api_key;

const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// OpenAI chat-completions provider.
pub struct OpenAIProvider {
    #[cfg(feature = "openai")]
    client: Client<OpenAIConfig>,
    config: LlmConfig,
}

impl OpenAIProvider {
    /// Create a new OpenAI provider. Fails with a configuration error when no
    /// API key is available.
    pub fn new(config: LlmConfig) -> IngrainResult<Self> {
        let api_key = resolve_api_key(&config, "OPENAI_API_KEY", "OpenAI")?;

        #[cfg(feature = "openai")]
        let client = {
            let openai_config = match config.base_url.as_deref() {
                Some(base_url) => OpenAIConfig::new()
                    .with_api_key(api_key)
                    .with_api_base(base_url),
                None => OpenAIConfig::new().with_api_key(api_key),
            };
            Client::with_config(openai_config)
        };
        #[cfg(not(feature = "openai"))]
        let _ = api_key;

        let mut config = config;
        if config.model.is_empty() {
            config.model = DEFAULT_MODEL.to_string();
        }

        Ok(Self {
            #[cfg(feature = "openai")]
            client,
            config,
        })
    }

    // Reasoning models reject sampling parameters.
    fn is_reasoning_model(&self) -> bool {
        let model = self.config.model.to_lowercase();
        ["o1", "o3", "o4", "gpt-5"]
            .iter()
            .any(|prefix| model.starts_with(prefix))
    }

    #[cfg(feature = "openai")]
    fn message_to_openai(msg: &Message) -> ChatCompletionRequestMessage {
        match msg.role {
            MessageRole::System => {
                ChatCompletionRequestMessage::System(ChatCompletionRequestSystemMessage {
                    content: async_openai::types::ChatCompletionRequestSystemMessageContent::Text(
                        msg.content.clone(),
                    ),
                    name: None,
                })
            }
            MessageRole::User => {
                ChatCompletionRequestMessage::User(ChatCompletionRequestUserMessage {
                    content: async_openai::types::ChatCompletionRequestUserMessageContent::Text(
                        msg.content.clone(),
                    ),
                    name: None,
                })
            }
            MessageRole::Assistant => {
                ChatCompletionRequestMessage::Assistant(ChatCompletionRequestAssistantMessage {
                    content: Some(
                        async_openai::types::ChatCompletionRequestAssistantMessageContent::Text(
                            msg.content.clone(),
                        ),
                    ),
                    ..Default::default()
                })
            }
        }
    }
}

#[async_trait]
impl Llm for OpenAIProvider {
    #[cfg(feature = "openai")]
    async fn generate(
        &self,
        messages: &[Message],
        options: Option<GenerationOptions>,
    ) -> IngrainResult<LlmResponse> {
        let options = options.unwrap_or_default();

        let mut request = CreateChatCompletionRequest {
            model: self.config.model.clone(),
            messages: messages.iter().map(Self::message_to_openai).collect(),
            ..Default::default()
        };

        if !self.is_reasoning_model() {
            request.temperature = Some(options.temperature.unwrap_or(self.config.temperature));
            request.top_p = Some(options.top_p.unwrap_or(self.config.top_p));
            request.max_tokens = Some(options.max_tokens.unwrap_or(self.config.max_tokens));
        }

        tracing::debug!(model = %self.config.model, messages = messages.len(), "OpenAI request");
        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| IngrainError::provider(format!("OpenAI API error: {}", e)))?;

        let content = response
            .choices
            .first()
            .ok_or_else(|| IngrainError::invalid_response("No response choices returned"))?
            .message
            .content
            .clone();

        let usage = response.usage.map(|u| TokenUsage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        });

        Ok(LlmResponse { content, usage })
    }

    #[cfg(not(feature = "openai"))]
    async fn generate(
        &self,
        _messages: &[Message],
        _options: Option<GenerationOptions>,
    ) -> IngrainResult<LlmResponse> {
        Err(IngrainError::Configuration(
            "OpenAI feature not enabled. Enable the 'openai' feature.".to_string(),
        ))
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}
