//! In-process document source.

use async_trait::async_trait;
use std::sync::{PoisonError, RwLock};

use crate::error::{IngrainError, IngrainResult};
use crate::events::{DocumentEvent, DocumentEventBus, DocumentSubscriber};
use crate::traits::DocumentSource;
use crate::types::DocumentHandle;

/// Documents held in memory, with change notifications on a bus.
///
/// Useful for embedding hosts that already hold note text, and for tests.
#[derive(Default)]
pub struct MemoryDocumentSource {
    documents: RwLock<Vec<(DocumentHandle, String)>>,
    bus: DocumentEventBus,
}

impl MemoryDocumentSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(path, content)` pairs without emitting events.
    pub fn with_documents<P, C>(documents: impl IntoIterator<Item = (P, C)>) -> Self
    where
        P: Into<String>,
        C: Into<String>,
    {
        let documents = documents
            .into_iter()
            .map(|(path, content)| (DocumentHandle::from_path(path), content.into()))
            .collect();
        Self {
            documents: RwLock::new(documents),
            bus: DocumentEventBus::new(),
        }
    }

    pub fn bus(&self) -> &DocumentEventBus {
        &self.bus
    }

    /// Add or replace a document and announce it.
    pub fn create(&self, path: impl Into<String>, content: impl Into<String>) -> DocumentHandle {
        let handle = DocumentHandle::from_path(path);
        {
            let mut documents = self.write();
            documents.retain(|(d, _)| d.path != handle.path);
            documents.push((handle.clone(), content.into()));
        }
        self.bus.emit(DocumentEvent::Created(handle.clone()));
        handle
    }

    /// Remove a document and announce it. Returns false if it was unknown.
    pub fn delete(&self, path: &str) -> bool {
        let removed = {
            let mut documents = self.write();
            let before = documents.len();
            documents.retain(|(d, _)| d.path != path);
            documents.len() != before
        };
        if removed {
            self.bus.emit(DocumentEvent::Deleted {
                path: path.to_string(),
            });
        }
        removed
    }

    /// Move a document and announce it.
    pub fn rename(&self, old_path: &str, new_path: impl Into<String>) -> Option<DocumentHandle> {
        let handle = DocumentHandle::from_path(new_path);
        {
            let mut documents = self.write();
            let entry = documents.iter_mut().find(|(d, _)| d.path == old_path)?;
            entry.0 = handle.clone();
        }
        self.bus.emit(DocumentEvent::Renamed {
            old_path: old_path.to_string(),
            handle: handle.clone(),
        });
        Some(handle)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Vec<(DocumentHandle, String)>> {
        self.documents.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl DocumentSource for MemoryDocumentSource {
    async fn list_documents(&self) -> IngrainResult<Vec<DocumentHandle>> {
        let documents = self.documents.read().unwrap_or_else(PoisonError::into_inner);
        Ok(documents.iter().map(|(d, _)| d.clone()).collect())
    }

    async fn read_content(&self, document: &DocumentHandle) -> IngrainResult<String> {
        let documents = self.documents.read().unwrap_or_else(PoisonError::into_inner);
        documents
            .iter()
            .find(|(d, _)| d.path == document.path)
            .map(|(_, content)| content.clone())
            .ok_or_else(|| IngrainError::document_not_found(&document.path))
    }

    fn subscribe(&self) -> Option<DocumentSubscriber> {
        Some(self.bus.subscribe())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_list_and_read() {
        let source = MemoryDocumentSource::with_documents([("a.md", "alpha"), ("b.md", "beta")]);

        let listed = source.list_documents().await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].basename, "a");
        assert_eq!(source.read_content(&listed[1]).await.unwrap(), "beta");
    }

    #[tokio::test]
    async fn test_read_missing_document() {
        let source = MemoryDocumentSource::new();
        let err = source
            .read_content(&DocumentHandle::from_path("nope.md"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("nope.md"));
    }

    #[tokio::test]
    async fn test_changes_are_announced() {
        let source = MemoryDocumentSource::new();
        let mut events = source.subscribe().unwrap();

        source.create("a.md", "alpha");
        source.rename("a.md", "b.md").unwrap();
        assert!(source.delete("b.md"));
        assert!(!source.delete("b.md"));

        assert_eq!(events.recv().await.unwrap().event_type(), "document.created");
        assert_eq!(
            events.recv().await.unwrap(),
            DocumentEvent::Renamed {
                old_path: "a.md".to_string(),
                handle: DocumentHandle::from_path("b.md"),
            }
        );
        assert_eq!(events.recv().await.unwrap().event_type(), "document.deleted");
        assert!(events.try_recv().is_none());
    }
}
