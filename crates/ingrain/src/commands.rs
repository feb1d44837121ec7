//! Terminal commands and display rendering.

use ingrain_core::session::{DisplayState, Phase};

/// One line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Anything that is not a command is an answer.
    Answer(String),
    Skip,
    Next,
    Retry,
    Abort,
    Rescan,
    Help,
    Quit,
    /// Blank line.
    Empty,
    Unknown(String),
}

impl Command {
    pub fn parse(line: &str) -> Self {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Command::Empty;
        }
        let Some(name) = trimmed.strip_prefix(':') else {
            return Command::Answer(trimmed.to_string());
        };
        match name.to_lowercase().as_str() {
            "skip" | "s" => Command::Skip,
            "next" | "n" => Command::Next,
            "retry" | "r" => Command::Retry,
            "abort" | "a" => Command::Abort,
            "rescan" => Command::Rescan,
            "help" | "h" | "?" => Command::Help,
            "quit" | "q" | "exit" => Command::Quit,
            _ => Command::Unknown(trimmed.to_string()),
        }
    }
}

pub const HELP: &str = "\
Type your answer and press enter to submit it.
  :skip     review a different note instead
  :next     move on after an answered quiz
  :retry    ask for a new quiz on this note
  :abort    cancel the request in flight
  :rescan   pick up notes added or removed on disk
  :quit     leave";

/// Text to print for a display state.
pub fn render(display: &DisplayState) -> String {
    let title = display.current_document_title.as_deref().unwrap_or("");
    match display.phase {
        Phase::Idle => String::new(),
        Phase::NoDocuments => "No notes to review. Add some and use :rescan.".to_string(),
        Phase::Loading => format!("\n== {} ==\nGenerating quiz...", title),
        Phase::Submitting => "Checking your answer...".to_string(),
        Phase::AwaitingAnswer => {
            let mut text = String::new();
            if display.response_text.is_empty() {
                text.push_str("(no quiz; :retry or :skip)");
            } else {
                text.push_str(&display.response_text);
            }
            text.push_str("\n\n[answer, :skip, :retry]");
            text
        }
        Phase::AnswerSubmitted => format!("{}\n\n[:next]", display.response_text),
    }
}
