//! Review sessions: one document at a time, quiz, answer, move on.

mod controller;
mod state;

pub use controller::{Completion, Inbound, Outcome, ReviewSession, SessionEvent};
pub use state::{DisplayState, Phase, SessionState};
