//! Quiz generation over an [`Llm`] provider.

use async_trait::async_trait;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::error::{IngrainError, IngrainResult};
use crate::quiz::prompts::QuizPrompts;
use crate::traits::{GenerationOptions, Generation, Llm, QuizGenerator};
use crate::types::Message;

const UNCONFIGURED: &str =
    "No text-generation provider configured. Add an API key to enable quiz generation.";

/// [`QuizGenerator`] backed by a text-generation provider.
///
/// Built without a provider it still works as a generator, but every call
/// fails with a configuration error before any network traffic.
pub struct LlmQuizClient {
    llm: Option<Arc<dyn Llm>>,
    unconfigured_reason: String,
    options: GenerationOptions,
    prompts: QuizPrompts,
}

impl LlmQuizClient {
    pub fn new(llm: Arc<dyn Llm>) -> Self {
        Self {
            llm: Some(llm),
            unconfigured_reason: UNCONFIGURED.to_string(),
            options: GenerationOptions::default(),
            prompts: QuizPrompts::default(),
        }
    }

    /// A client that reports `reason` on every request.
    pub fn unconfigured(reason: impl Into<String>) -> Self {
        Self {
            llm: None,
            unconfigured_reason: reason.into(),
            options: GenerationOptions::default(),
            prompts: QuizPrompts::default(),
        }
    }

    /// Per-request generation overrides (temperature, token limit).
    pub fn with_options(mut self, options: GenerationOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_prompts(mut self, prompts: QuizPrompts) -> Self {
        self.prompts = prompts;
        self
    }

    pub fn is_configured(&self) -> bool {
        self.llm.is_some()
    }

    async fn request(
        &self,
        conversation: Vec<Message>,
        cancel: &CancellationToken,
    ) -> IngrainResult<Generation> {
        let llm = self
            .llm
            .as_ref()
            .ok_or_else(|| IngrainError::configuration(self.unconfigured_reason.clone()))?;

        if cancel.is_cancelled() {
            return Ok(Generation::Cancelled);
        }

        let mut messages = Vec::with_capacity(conversation.len() + 1);
        if let Some(system) = &self.prompts.system {
            messages.push(Message::system(system.clone()));
        }
        messages.extend(conversation);

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::debug!("Generation request cancelled");
                Ok(Generation::Cancelled)
            }
            response = llm.generate(&messages, Some(self.options.clone())) => {
                let response = response?;
                match response.content.filter(|text| !text.trim().is_empty()) {
                    Some(text) => Ok(Generation::Reply(text)),
                    None => Err(IngrainError::invalid_response("Provider returned an empty response")),
                }
            }
        }
    }
}

#[async_trait]
impl QuizGenerator for LlmQuizClient {
    fn quiz_prompt(&self, document_content: &str) -> String {
        self.prompts.quiz_request(document_content)
    }

    async fn generate_quiz(
        &self,
        document_content: &str,
        cancel: &CancellationToken,
    ) -> IngrainResult<Generation> {
        let prompt = self.quiz_prompt(document_content);
        self.request(vec![Message::user(prompt)], cancel).await
    }

    async fn send_follow_up(
        &self,
        transcript: &[Message],
        input: &str,
        cancel: &CancellationToken,
    ) -> IngrainResult<Generation> {
        let mut conversation = transcript.to_vec();
        conversation.push(Message::user(input));
        self.request(conversation, cancel).await
    }
}
