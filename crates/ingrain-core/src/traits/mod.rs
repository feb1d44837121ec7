//! Core traits for ingrain collaborators.

mod document_source;
mod llm;
mod quiz_generator;

pub use document_source::*;
pub use llm::*;
pub use quiz_generator::*;
