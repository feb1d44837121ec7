//! Ollama LLM provider implementation.

use async_trait::async_trait;

use ingrain_core::error::{IngrainError, IngrainResult};
use ingrain_core::traits::{GenerationOptions, Llm, LlmConfig, LlmResponse};
use ingrain_core::types::Message;

#[cfg(feature = "ollama")]
use ingrain_core::types::MessageRole;
#[cfg(feature = "ollama")]
use ollama_rs::{
    generation::chat::{ChatMessage, ChatMessageRequest, MessageRole as OllamaRole},
    generation::options::GenerationOptions as OllamaOptions,
    Ollama,
};

const DEFAULT_BASE_URL: &str = "http://localhost:11434";
const DEFAULT_MODEL: &str = "llama3.2";

/// Local models via Ollama. Needs no API key.
pub struct OllamaLlm {
    #[cfg(feature = "ollama")]
    client: Ollama,
    config: LlmConfig,
}

impl OllamaLlm {
    /// Create a new Ollama provider.
    pub fn new(config: LlmConfig) -> IngrainResult<Self> {
        let (host, port) = parse_base_url(config.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL))?;

        #[cfg(feature = "ollama")]
        let client = Ollama::new(host, port);
        #[cfg(not(feature = "ollama"))]
        let _ = (host, port);

        let mut config = config;
        if config.model.is_empty() {
            config.model = DEFAULT_MODEL.to_string();
        }

        Ok(Self {
            #[cfg(feature = "ollama")]
            client,
            config,
        })
    }

    #[cfg(feature = "ollama")]
    fn message_to_ollama(msg: &Message) -> ChatMessage {
        let role = match msg.role {
            MessageRole::System => OllamaRole::System,
            MessageRole::User => OllamaRole::User,
            MessageRole::Assistant => OllamaRole::Assistant,
        };
        ChatMessage::new(role, msg.content.clone())
    }
}

// Split a base URL into the `http://host` and port pair Ollama's client wants.
fn parse_base_url(base_url: &str) -> IngrainResult<(String, u16)> {
    let url = url::Url::parse(base_url)
        .map_err(|e| IngrainError::Configuration(format!("Invalid Ollama URL: {}", e)))?;

    let host = url.host_str().unwrap_or("localhost");
    let port = url.port().unwrap_or(11434);
    Ok((format!("{}://{}", url.scheme(), host), port))
}

#[async_trait]
impl Llm for OllamaLlm {
    #[cfg(feature = "ollama")]
    async fn generate(
        &self,
        messages: &[Message],
        options: Option<GenerationOptions>,
    ) -> IngrainResult<LlmResponse> {
        let options = options.unwrap_or_default();

        let ollama_options = OllamaOptions::default()
            .temperature(options.temperature.unwrap_or(self.config.temperature))
            .top_p(options.top_p.unwrap_or(self.config.top_p));

        let request = ChatMessageRequest::new(
            self.config.model.clone(),
            messages.iter().map(Self::message_to_ollama).collect(),
        )
        .options(ollama_options);

        tracing::debug!(model = %self.config.model, messages = messages.len(), "Ollama request");
        let response = self
            .client
            .send_chat_messages(request)
            .await
            .map_err(|e| IngrainError::provider(format!("Ollama API error: {}", e)))?;

        Ok(LlmResponse {
            content: response.message.map(|m| m.content),
            usage: None,
        })
    }

    #[cfg(not(feature = "ollama"))]
    async fn generate(
        &self,
        _messages: &[Message],
        _options: Option<GenerationOptions>,
    ) -> IngrainResult<LlmResponse> {
        Err(IngrainError::Configuration(
            "Ollama feature not enabled. Enable the 'ollama' feature.".to_string(),
        ))
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}
