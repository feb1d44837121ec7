//! Document lifecycle events pushed by the host.

use serde::{Deserialize, Serialize};

use crate::types::DocumentHandle;

/// A change to the host's document set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DocumentEvent {
    /// A new document appeared.
    Created(DocumentHandle),
    /// A document was removed. Its review record is left in place.
    Deleted { path: String },
    /// A document moved; `handle` carries the new path and title.
    Renamed {
        old_path: String,
        handle: DocumentHandle,
    },
}

impl DocumentEvent {
    /// Get the event type as a string for filtering.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Created(_) => "document.created",
            Self::Deleted { .. } => "document.deleted",
            Self::Renamed { .. } => "document.renamed",
        }
    }

    /// Path the event is about (the new path for renames).
    pub fn path(&self) -> &str {
        match self {
            Self::Created(handle) => &handle.path,
            Self::Deleted { path } => path,
            Self::Renamed { handle, .. } => &handle.path,
        }
    }
}
