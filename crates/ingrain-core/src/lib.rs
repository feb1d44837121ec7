//! ingrain-core - Core library for ingrain.
//!
//! Spaced review of a note collection: pick the note seen least recently,
//! ask a text-generation provider to quiz the user on it, and record the
//! review once the user has answered.
//!
//! # Example
//!
//! ```ignore
//! use ingrain_core::{LlmQuizClient, MemoryDocumentSource, ReviewRecordStore, ReviewSession};
//!
//! let source = Arc::new(MemoryDocumentSource::with_documents([("rust.md", "Ownership...")]));
//! let store = Arc::new(ReviewRecordStore::in_memory());
//! let client = Arc::new(LlmQuizClient::new(llm));
//!
//! let mut session = ReviewSession::open(source, store, client).await?;
//! session.initialize();
//! session.wait_event().await;
//! println!("{}", session.display().response_text);
//! ```

pub mod config;
pub mod documents;
pub mod error;
pub mod events;
pub mod quiz;
pub mod selector;
pub mod session;
pub mod store;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use config::{IngrainConfig, LlmProvider, LlmProviderConfig};
pub use documents::{DocumentCatalog, MemoryDocumentSource};
pub use error::{ErrorCode, IngrainError, IngrainResult};
pub use events::{DocumentEvent, DocumentEventBus, DocumentSubscriber};
pub use quiz::{LlmQuizClient, QuizPrompts, DEFAULT_QUIZ_INSTRUCTION};
pub use selector::{select_oldest, select_with_fallback, Selection};
pub use session::{DisplayState, Phase, ReviewSession, SessionEvent};
pub use store::{
    Clock, JsonFileBackend, ManualClock, MemoryBackend, ReviewRecordStore, StateBackend,
    SystemClock,
};
pub use traits::{
    DocumentSource, Generation, GenerationOptions, Llm, LlmConfig, LlmResponse, QuizGenerator,
};
pub use types::{DocumentHandle, Message, MessageRole, ReviewRecord, ReviewStoreState};
