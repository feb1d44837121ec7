//! Prompt templates for quiz generation.

/// Instruction placed before the note text when asking for a quiz.
pub const DEFAULT_QUIZ_INSTRUCTION: &str = "Quiz me on this note. Give me 5 questions. \
Randomize the questions. Focus on different parts of the note every time.";

/// Prompt text for a quiz session.
#[derive(Debug, Clone)]
pub struct QuizPrompts {
    /// Instruction preceding the document content.
    pub instruction: String,
    /// Optional system prompt sent with every request. Never stored in the
    /// session transcript.
    pub system: Option<String>,
}

impl Default for QuizPrompts {
    fn default() -> Self {
        Self {
            instruction: DEFAULT_QUIZ_INSTRUCTION.to_string(),
            system: None,
        }
    }
}

impl QuizPrompts {
    /// Build prompts from optional overrides.
    pub fn new(instruction: Option<String>, system: Option<String>) -> Self {
        Self {
            instruction: instruction
                .filter(|i| !i.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_QUIZ_INSTRUCTION.to_string()),
            system: system.filter(|s| !s.trim().is_empty()),
        }
    }

    /// The opening user message for a document.
    pub fn quiz_request(&self, document_content: &str) -> String {
        quiz_request(&self.instruction, document_content)
    }
}

/// Join an instruction and document text into the opening user message.
pub fn quiz_request(instruction: &str, document_content: &str) -> String {
    format!("{} \n\n{}", instruction, document_content)
}
