//! Review session state.
//!
//! [`SessionState`] is a plain value. Its transition helpers only touch the
//! value itself; cancellation, selection and persistence live in the
//! controller.

use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

use crate::types::{DocumentHandle, Message};

/// Where a session is in its per-document cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Nothing loaded yet.
    #[default]
    Idle,
    /// Quiz generation in flight.
    Loading,
    /// Quiz shown (or failed to load); waiting for the user's answer.
    AwaitingAnswer,
    /// Follow-up request in flight.
    Submitting,
    /// Answer accepted and the document marked reviewed.
    AnswerSubmitted,
    /// Selection found no documents at all.
    NoDocuments,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Idle => "idle",
            Phase::Loading => "loading",
            Phase::AwaitingAnswer => "awaiting_answer",
            Phase::Submitting => "submitting",
            Phase::AnswerSubmitted => "answer_submitted",
            Phase::NoDocuments => "no_documents",
        };
        f.write_str(name)
    }
}

/// Read-only view for the rendering layer, rebuilt after every transition.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct DisplayState {
    pub phase: Phase,
    pub current_document_title: Option<String>,
    pub current_document_path: Option<String>,
    pub response_text: String,
    pub is_loading: bool,
    pub is_submitting: bool,
    pub can_skip: bool,
    pub can_submit: bool,
    pub can_advance: bool,
}

/// Everything a session remembers about the current document.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub phase: Phase,
    pub current: Option<DocumentHandle>,
    pub transcript: Vec<Message>,
    pub response_text: String,
    /// Paths skipped during this session. Never persisted.
    pub skipped: HashSet<String>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_path(&self) -> Option<&str> {
        self.current.as_ref().map(|d| d.path.as_str())
    }

    /// Switch to `document` and wait for its quiz. Clears the transcript.
    pub fn begin_loading(&mut self, document: DocumentHandle) {
        self.current = Some(document);
        self.transcript.clear();
        self.response_text.clear();
        self.phase = Phase::Loading;
    }

    /// Selection came back empty.
    pub fn no_documents(&mut self) {
        self.current = None;
        self.transcript.clear();
        self.response_text.clear();
        self.phase = Phase::NoDocuments;
    }

    /// Seed the transcript with the quiz exchange.
    pub fn accept_quiz(&mut self, prompt: String, quiz: String) -> bool {
        if self.phase != Phase::Loading {
            return false;
        }
        self.transcript = vec![Message::user(prompt), Message::assistant(quiz.clone())];
        self.response_text = quiz;
        self.phase = Phase::AwaitingAnswer;
        true
    }

    /// Quiz generation failed; show the error and let the user skip or retry.
    pub fn fail_loading(&mut self, error_text: String) -> bool {
        if self.phase != Phase::Loading {
            return false;
        }
        self.transcript.clear();
        self.response_text = error_text;
        self.phase = Phase::AwaitingAnswer;
        true
    }

    /// Enter `Submitting` if an answer may be sent now.
    pub fn begin_submit(&mut self, answer: &str) -> bool {
        if !self.can_submit() {
            return false;
        }
        if answer.trim().is_empty() {
            return false;
        }
        self.phase = Phase::Submitting;
        true
    }

    /// Append the answer and reply to the transcript.
    pub fn accept_answer(&mut self, answer: String, reply: String) -> bool {
        if self.phase != Phase::Submitting {
            return false;
        }
        self.transcript.push(Message::user(answer));
        self.transcript.push(Message::assistant(reply.clone()));
        self.response_text = reply;
        self.phase = Phase::AnswerSubmitted;
        true
    }

    /// The follow-up failed; go back to waiting so the user can resubmit.
    pub fn fail_submit(&mut self, error_text: String) -> bool {
        if self.phase != Phase::Submitting {
            return false;
        }
        self.response_text = error_text;
        self.phase = Phase::AwaitingAnswer;
        true
    }

    /// An in-flight request was abandoned. Leaves the transcript as it was.
    pub fn interrupt(&mut self) -> bool {
        match self.phase {
            Phase::Loading | Phase::Submitting => {
                self.phase = Phase::AwaitingAnswer;
                true
            }
            _ => false,
        }
    }

    pub fn can_skip(&self) -> bool {
        self.phase == Phase::AwaitingAnswer && self.current.is_some()
    }

    /// Answers need a quiz to answer: after a failed or aborted load only
    /// `retry` and `skip` move on.
    pub fn can_submit(&self) -> bool {
        self.phase == Phase::AwaitingAnswer && self.current.is_some() && !self.transcript.is_empty()
    }

    pub fn can_advance(&self) -> bool {
        self.phase == Phase::AnswerSubmitted
    }

    pub fn display(&self) -> DisplayState {
        DisplayState {
            phase: self.phase,
            current_document_title: self.current.as_ref().map(|d| d.basename.clone()),
            current_document_path: self.current.as_ref().map(|d| d.path.clone()),
            response_text: self.response_text.clone(),
            is_loading: self.phase == Phase::Loading,
            is_submitting: self.phase == Phase::Submitting,
            can_skip: self.can_skip(),
            can_submit: self.can_submit(),
            can_advance: self.can_advance(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loaded() -> SessionState {
        let mut state = SessionState::new();
        state.begin_loading(DocumentHandle::from_path("a.md"));
        assert!(state.accept_quiz("prompt".to_string(), "Q1?".to_string()));
        state
    }

    #[test]
    fn test_initial_display() {
        let display = SessionState::new().display();
        assert_eq!(display.phase, Phase::Idle);
        assert!(display.current_document_title.is_none());
        assert!(!display.can_skip && !display.can_submit && !display.can_advance);
    }

    #[test]
    fn test_quiz_seeds_transcript() {
        let state = loaded();
        assert_eq!(state.phase, Phase::AwaitingAnswer);
        assert_eq!(
            state.transcript,
            vec![Message::user("prompt"), Message::assistant("Q1?")]
        );

        let display = state.display();
        assert_eq!(display.current_document_title.as_deref(), Some("a"));
        assert_eq!(display.response_text, "Q1?");
        assert!(display.can_skip && display.can_submit && !display.can_advance);
    }

    #[test]
    fn test_quiz_outside_loading_is_ignored() {
        let mut state = loaded();
        assert!(!state.accept_quiz("p".to_string(), "late".to_string()));
        assert_eq!(state.response_text, "Q1?");
    }

    #[test]
    fn test_submit_guards() {
        let mut idle = SessionState::new();
        assert!(!idle.begin_submit("answer"));

        let mut state = loaded();
        assert!(!state.begin_submit("   \n"));
        assert_eq!(state.phase, Phase::AwaitingAnswer);

        assert!(state.begin_submit("answer"));
        assert_eq!(state.phase, Phase::Submitting);
        assert!(!state.begin_submit("again"));

        let display = state.display();
        assert!(display.is_submitting && !display.can_skip && !display.can_submit);
    }

    #[test]
    fn test_answer_flow() {
        let mut state = loaded();
        state.begin_submit("my answer");
        assert!(state.accept_answer("my answer".to_string(), "Good.".to_string()));

        assert_eq!(state.phase, Phase::AnswerSubmitted);
        assert_eq!(state.transcript.len(), 4);
        assert!(state.can_advance());
        assert!(!state.can_skip());
    }

    #[test]
    fn test_failed_submit_returns_to_awaiting() {
        let mut state = loaded();
        state.begin_submit("x");
        assert!(state.fail_submit("Error: boom".to_string()));

        assert_eq!(state.phase, Phase::AwaitingAnswer);
        assert_eq!(state.transcript.len(), 2);
        assert_eq!(state.response_text, "Error: boom");
    }

    #[test]
    fn test_failed_loading_allows_skip() {
        let mut state = SessionState::new();
        state.begin_loading(DocumentHandle::from_path("a.md"));
        assert!(state.fail_loading("Error: no key".to_string()));

        assert!(state.transcript.is_empty());
        assert!(state.can_skip());
        assert!(!state.can_submit());
        assert!(!state.begin_submit("answer"));
        assert_eq!(state.phase, Phase::AwaitingAnswer);
        assert!(!state.display().can_submit);
    }

    #[test]
    fn test_interrupt() {
        let mut state = SessionState::new();
        assert!(!state.interrupt());

        state.begin_loading(DocumentHandle::from_path("a.md"));
        assert!(state.interrupt());
        assert_eq!(state.phase, Phase::AwaitingAnswer);
        assert!(state.transcript.is_empty());
        assert!(!state.begin_submit("answer"));
    }
}
