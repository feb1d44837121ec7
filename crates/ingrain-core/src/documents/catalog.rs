//! The session's view of the host document set.

use std::collections::HashSet;
use std::sync::Arc;

use crate::error::IngrainResult;
use crate::events::DocumentEvent;
use crate::selector::{select_with_fallback, Selection};
use crate::store::ReviewRecordStore;
use crate::traits::DocumentSource;
use crate::types::DocumentHandle;

/// Ordered list of reviewable documents, kept current by host events.
///
/// Order is the host's listing order; new documents are appended and renamed
/// ones keep their slot, so tie-breaking stays stable across events.
pub struct DocumentCatalog {
    documents: Vec<DocumentHandle>,
    store: Arc<ReviewRecordStore>,
}

impl DocumentCatalog {
    pub fn new(documents: Vec<DocumentHandle>, store: Arc<ReviewRecordStore>) -> Self {
        Self { documents, store }
    }

    /// Seed the catalog from the host's current listing.
    pub async fn load(
        source: &dyn DocumentSource,
        store: Arc<ReviewRecordStore>,
    ) -> IngrainResult<Self> {
        let documents = source.list_documents().await?;
        tracing::debug!(count = documents.len(), "Loaded document catalog");
        Ok(Self::new(documents, store))
    }

    pub fn documents(&self) -> &[DocumentHandle] {
        &self.documents
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn find(&self, path: &str) -> Option<&DocumentHandle> {
        self.documents.iter().find(|d| d.path == path)
    }

    pub fn store(&self) -> &Arc<ReviewRecordStore> {
        &self.store
    }

    /// Oldest document outside `exclude`, falling back to the whole set.
    ///
    /// Reads the store as of this call.
    pub fn select(&self, exclude: &HashSet<String>) -> Option<Selection> {
        let records = self.store.snapshot();
        select_with_fallback(&self.documents, &records, exclude)
    }

    /// Apply a host notification. Renames also migrate the review record;
    /// deletions leave the record alone.
    pub async fn apply(&mut self, event: &DocumentEvent) {
        match event {
            DocumentEvent::Created(handle) => {
                match self.documents.iter_mut().find(|d| d.path == handle.path) {
                    Some(existing) => *existing = handle.clone(),
                    None => self.documents.push(handle.clone()),
                }
            }
            DocumentEvent::Deleted { path } => {
                self.documents.retain(|d| &d.path != path);
            }
            DocumentEvent::Renamed { old_path, handle } => {
                // A rename onto an existing path replaces that entry.
                if old_path != &handle.path {
                    self.documents.retain(|d| d.path != handle.path);
                }
                match self.documents.iter_mut().find(|d| &d.path == old_path) {
                    Some(existing) => *existing = handle.clone(),
                    None => self.documents.push(handle.clone()),
                }
                self.store.rename(old_path, &handle.path).await;
            }
        }
        tracing::debug!(event = event.event_type(), path = event.path(), "Applied document event");
    }
}
