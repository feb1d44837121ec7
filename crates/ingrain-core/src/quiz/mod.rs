//! Quiz generation: prompt templates and the provider-backed client.

mod client;
pub mod prompts;

pub use client::LlmQuizClient;
pub use prompts::{QuizPrompts, DEFAULT_QUIZ_INSTRUCTION};
