//! Host document store interface.

use async_trait::async_trait;

use crate::error::IngrainResult;
use crate::events::DocumentSubscriber;
use crate::types::DocumentHandle;

/// The host's document store, as seen by a review session.
///
/// Implementations own the documents; the core only lists them, reads their
/// content on demand, and listens for lifecycle changes.
#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// All reviewable documents, in the host's iteration order.
    ///
    /// Selection breaks ties by this order, so it should be stable.
    async fn list_documents(&self) -> IngrainResult<Vec<DocumentHandle>>;

    /// Full text of a document.
    async fn read_content(&self, document: &DocumentHandle) -> IngrainResult<String>;

    /// Subscribe to create/delete/rename notifications, if the host emits them.
    fn subscribe(&self) -> Option<DocumentSubscriber> {
        None
    }
}
