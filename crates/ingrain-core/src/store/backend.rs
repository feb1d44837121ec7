//! Durable storage for the persisted review blob.

use async_trait::async_trait;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use crate::error::{IngrainError, IngrainResult};

/// Where the review blob lives. The host owns durability; the store only
/// asks for the latest blob to be written.
#[async_trait]
pub trait StateBackend: Send + Sync {
    /// Read the persisted blob. `Ok(None)` means nothing has been saved yet.
    async fn load(&self) -> IngrainResult<Option<Value>>;

    /// Replace the persisted blob.
    async fn save(&self, state: &Value) -> IngrainResult<()>;
}

/// Stores the blob as a pretty-printed JSON file.
///
/// Writes go to a sibling temp file first and are renamed into place, so a
/// crash mid-write leaves the previous file intact. A file that does not
/// parse is moved aside to `<name>.corrupt-<millis>` on load; if it cannot
/// be moved, saves are refused so it is never overwritten.
pub struct JsonFileBackend {
    path: PathBuf,
    // Set when an unreadable file could not be moved aside.
    protected: AtomicBool,
}

impl JsonFileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            protected: AtomicBool::new(false),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        self.sibling(".tmp")
    }

    fn sibling(&self, suffix: &str) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "data.json".into());
        name.push(suffix);
        self.path.with_file_name(name)
    }

    async fn set_aside(&self) {
        let aside = self.sibling(&format!(
            ".corrupt-{}",
            chrono::Utc::now().timestamp_millis()
        ));
        match tokio::fs::rename(&self.path, &aside).await {
            Ok(()) => tracing::warn!(
                path = %self.path.display(),
                moved_to = %aside.display(),
                "Moved unreadable review data aside"
            ),
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    "Cannot move unreadable review data aside, leaving it untouched: {}",
                    e
                );
                self.protected.store(true, Ordering::SeqCst);
            }
        }
    }
}

#[async_trait]
impl StateBackend for JsonFileBackend {
    async fn load(&self) -> IngrainResult<Option<Value>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        if content.trim().is_empty() {
            return Ok(None);
        }

        match serde_json::from_str(&content) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                self.set_aside().await;
                Err(e.into())
            }
        }
    }

    async fn save(&self, state: &Value) -> IngrainResult<()> {
        if self.protected.load(Ordering::SeqCst) {
            return Err(IngrainError::persistence(format!(
                "Refusing to overwrite unreadable {}",
                self.path.display()
            )));
        }
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let body = serde_json::to_vec_pretty(state)?;
        let temp = self.temp_path();
        tokio::fs::write(&temp, body).await?;
        tokio::fs::rename(&temp, &self.path).await.map_err(|e| {
            IngrainError::persistence(format!(
                "Failed to move {} into place: {}",
                temp.display(),
                e
            ))
        })?;
        Ok(())
    }
}

/// Keeps the blob in memory. Used by tests and embedders without a disk.
#[derive(Default)]
pub struct MemoryBackend {
    value: Mutex<Option<Value>>,
    saves: AtomicUsize,
    failing: AtomicBool,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with an existing blob, as if it had been saved earlier.
    pub fn with_value(value: Value) -> Self {
        Self {
            value: Mutex::new(Some(value)),
            ..Self::default()
        }
    }

    /// The most recently saved blob.
    pub fn last_saved(&self) -> Option<Value> {
        self.value
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of successful saves.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    /// Make subsequent saves fail, to exercise best-effort persistence.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl StateBackend for MemoryBackend {
    async fn load(&self) -> IngrainResult<Option<Value>> {
        Ok(self.last_saved())
    }

    async fn save(&self, state: &Value) -> IngrainResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(IngrainError::persistence("memory backend set to fail"));
        }
        *self.value.lock().unwrap_or_else(PoisonError::into_inner) = Some(state.clone());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
