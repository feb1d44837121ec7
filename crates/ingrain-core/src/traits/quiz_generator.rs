//! Quiz generation trait.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::IngrainResult;
use crate::quiz::prompts::{quiz_request, DEFAULT_QUIZ_INSTRUCTION};
use crate::types::Message;

/// Outcome of a generation request that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Generation {
    /// The provider answered.
    Reply(String),
    /// The request's token was cancelled before an answer was accepted.
    Cancelled,
}

impl Generation {
    /// The reply text, or `None` if cancelled.
    pub fn into_reply(self) -> Option<String> {
        match self {
            Generation::Reply(text) => Some(text),
            Generation::Cancelled => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Generation::Cancelled)
    }
}

/// Produces quizzes and follow-up answers for a review session.
///
/// Implementations must honour `cancel` cooperatively: once it fires they
/// should stop work and return [`Generation::Cancelled`]. They must not fall
/// back to network calls when unconfigured; return
/// [`IngrainError::Configuration`](crate::IngrainError::Configuration) instead.
#[async_trait]
pub trait QuizGenerator: Send + Sync {
    /// The user message [`generate_quiz`](Self::generate_quiz) sends for this
    /// content. Sessions seed their transcript with it.
    fn quiz_prompt(&self, document_content: &str) -> String {
        quiz_request(DEFAULT_QUIZ_INSTRUCTION, document_content)
    }

    /// Generate the opening quiz for a document's content.
    async fn generate_quiz(
        &self,
        document_content: &str,
        cancel: &CancellationToken,
    ) -> IngrainResult<Generation>;

    /// Continue the conversation with the user's next message.
    async fn send_follow_up(
        &self,
        transcript: &[Message],
        input: &str,
        cancel: &CancellationToken,
    ) -> IngrainResult<Generation>;
}
