//! Anthropic (Claude) LLM provider implementation.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use ingrain_core::error::{IngrainError, IngrainResult};
use ingrain_core::traits::{GenerationOptions, Llm, LlmConfig, LlmResponse, TokenUsage};
use ingrain_core::types::{Message, MessageRole};

use crate::resolve_api_key;

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_MODEL: &str = "claude-3-5-haiku-latest";

/// Anthropic messages-API provider.
pub struct AnthropicLlm {
    client: Client,
    config: LlmConfig,
    base_url: String,
}

#[derive(Debug, Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<AnthropicMessage>,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicContent>,
    #[serde(default)]
    usage: Option<AnthropicUsage>,
}

#[derive(Debug, Deserialize)]
struct AnthropicContent {
    #[serde(rename = "type")]
    content_type: String,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AnthropicUsage {
    input_tokens: u32,
    output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct AnthropicError {
    error: AnthropicErrorDetail,
}

#[derive(Debug, Deserialize)]
struct AnthropicErrorDetail {
    message: String,
}

impl AnthropicLlm {
    /// Create a new Anthropic provider. Fails with a configuration error
    /// when no API key is available.
    pub fn new(config: LlmConfig) -> IngrainResult<Self> {
        let api_key = resolve_api_key(&config, "ANTHROPIC_API_KEY", "Anthropic")?;

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            "x-api-key",
            api_key
                .parse()
                .map_err(|_| IngrainError::Configuration("Invalid API key format".to_string()))?,
        );
        headers.insert(
            "anthropic-version",
            reqwest::header::HeaderValue::from_static(ANTHROPIC_VERSION),
        );

        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| {
                IngrainError::Configuration(format!("Failed to create HTTP client: {}", e))
            })?;

        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| ANTHROPIC_API_URL.to_string());

        let mut config = config;
        if config.model.is_empty() {
            config.model = DEFAULT_MODEL.to_string();
        }

        Ok(Self {
            client,
            config,
            base_url,
        })
    }

    // System messages go in the top-level `system` field; the API rejects
    // them inside `messages`.
    fn build_request(&self, messages: &[Message], options: &GenerationOptions) -> AnthropicRequest {
        let system = messages
            .iter()
            .filter(|m| m.role == MessageRole::System)
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>();

        let conversation = messages
            .iter()
            .filter(|m| m.role != MessageRole::System)
            .map(|m| AnthropicMessage {
                role: m.role.as_str(),
                content: m.content.clone(),
            })
            .collect();

        AnthropicRequest {
            model: self.config.model.clone(),
            max_tokens: options.max_tokens.unwrap_or(self.config.max_tokens),
            temperature: Some(options.temperature.unwrap_or(self.config.temperature)),
            system: (!system.is_empty()).then(|| system.join("\n\n")),
            messages: conversation,
        }
    }
}

#[async_trait]
impl Llm for AnthropicLlm {
    async fn generate(
        &self,
        messages: &[Message],
        options: Option<GenerationOptions>,
    ) -> IngrainResult<LlmResponse> {
        let request = self.build_request(messages, &options.unwrap_or_default());

        tracing::debug!(model = %self.config.model, messages = request.messages.len(), "Anthropic request");
        let response = self
            .client
            .post(format!("{}/messages", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                IngrainError::provider_connection(format!("Anthropic API request failed: {}", e))
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            IngrainError::provider_connection(format!("Failed to read response body: {}", e))
        })?;

        if !status.is_success() {
            let message = serde_json::from_str::<AnthropicError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(IngrainError::provider(format!(
                "Anthropic API error ({}): {}",
                status, message
            )));
        }

        parse_response(&body)
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

fn parse_response(body: &str) -> IngrainResult<LlmResponse> {
    let response: AnthropicResponse = serde_json::from_str(body).map_err(|e| {
        IngrainError::invalid_response(format!("Failed to parse response: {}", e))
    })?;

    let text: String = response
        .content
        .iter()
        .filter(|c| c.content_type == "text")
        .filter_map(|c| c.text.as_deref())
        .collect();

    let usage = response.usage.map(|u| TokenUsage {
        prompt_tokens: u.input_tokens,
        completion_tokens: u.output_tokens,
        total_tokens: u.input_tokens + u.output_tokens,
    });

    Ok(LlmResponse {
        content: (!text.is_empty()).then_some(text),
        usage,
    })
}
