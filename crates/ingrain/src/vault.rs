//! A directory of markdown notes as a document source.

use async_trait::async_trait;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use walkdir::WalkDir;

use ingrain_core::error::{IngrainError, IngrainResult};
use ingrain_core::events::{DocumentEvent, DocumentEventBus, DocumentSubscriber};
use ingrain_core::traits::DocumentSource;
use ingrain_core::types::DocumentHandle;

/// Markdown files under a root directory, identified by their
/// `/`-separated path relative to the root.
///
/// Hidden files and folders (`.obsidian`, `.git`, ...) are ignored.
pub struct VaultDirectory {
    root: PathBuf,
    bus: DocumentEventBus,
    // Paths from the last listing, for `rescan`.
    known: Mutex<BTreeSet<String>>,
}

/// What a rescan found.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct RescanSummary {
    pub created: usize,
    pub deleted: usize,
}

impl VaultDirectory {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            bus: DocumentEventBus::new(),
            known: Mutex::new(BTreeSet::new()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// List the directory again and emit events for notes that appeared or
    /// disappeared since the last listing.
    pub async fn rescan(&self) -> IngrainResult<RescanSummary> {
        let current: BTreeSet<String> = self.scan().await?.into_iter().collect();
        let previous = {
            let mut known = self.known.lock().unwrap_or_else(PoisonError::into_inner);
            std::mem::replace(&mut *known, current.clone())
        };

        let mut summary = RescanSummary::default();
        for path in current.difference(&previous) {
            self.bus.emit(DocumentEvent::Created(DocumentHandle::from_path(path.clone())));
            summary.created += 1;
        }
        for path in previous.difference(&current) {
            self.bus.emit(DocumentEvent::Deleted { path: path.clone() });
            summary.deleted += 1;
        }
        tracing::debug!(created = summary.created, deleted = summary.deleted, "Rescanned vault");
        Ok(summary)
    }

    async fn scan(&self) -> IngrainResult<Vec<String>> {
        let root = self.root.clone();
        tokio::task::spawn_blocking(move || scan_markdown(&root))
            .await
            .map_err(|e| IngrainError::Internal(format!("Vault scan panicked: {}", e)))?
    }
}

fn scan_markdown(root: &Path) -> IngrainResult<Vec<String>> {
    if !root.is_dir() {
        return Err(IngrainError::document(
            root.display().to_string(),
            "Vault directory does not exist",
        ));
    }

    let mut paths = Vec::new();
    let walker = WalkDir::new(root)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !e.file_name().to_string_lossy().starts_with('.'));

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("Skipping unreadable vault entry: {}", e);
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let is_markdown = entry
            .path()
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .is_some_and(|ext| ext == "md" || ext == "markdown");
        if !is_markdown {
            continue;
        }

        let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
        let path = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        paths.push(path);
    }

    paths.sort();
    Ok(paths)
}

#[async_trait]
impl DocumentSource for VaultDirectory {
    async fn list_documents(&self) -> IngrainResult<Vec<DocumentHandle>> {
        let paths = self.scan().await?;
        {
            let mut known = self.known.lock().unwrap_or_else(PoisonError::into_inner);
            *known = paths.iter().cloned().collect();
        }
        tracing::info!(root = %self.root.display(), documents = paths.len(), "Listed vault");
        Ok(paths.into_iter().map(DocumentHandle::from_path).collect())
    }

    async fn read_content(&self, document: &DocumentHandle) -> IngrainResult<String> {
        let full_path = self.root.join(&document.path);
        match tokio::fs::read_to_string(&full_path).await {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(IngrainError::document_not_found(&document.path))
            }
            Err(e) => Err(IngrainError::document(&document.path, e.to_string())),
        }
    }

    fn subscribe(&self) -> Option<DocumentSubscriber> {
        Some(self.bus.subscribe())
    }
}
