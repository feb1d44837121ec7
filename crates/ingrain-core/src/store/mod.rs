//! Persisted per-document review records.
//!
//! [`ReviewRecordStore`] owns the path -> [`ReviewRecord`] mapping. Every
//! mutation updates memory first and then writes a snapshot through the
//! [`StateBackend`]. Writes are best-effort: failures are logged, never
//! returned, and a stale snapshot never overwrites a newer one.

mod backend;
mod clock;

pub use backend::{JsonFileBackend, MemoryBackend, StateBackend};
pub use clock::{Clock, ManualClock, SystemClock};

use serde_json::Value;
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::Mutex;

use crate::types::{ReviewRecord, ReviewStoreState};

/// Review records shared between a session and the document catalog.
pub struct ReviewRecordStore {
    state: RwLock<Inner>,
    backend: Arc<dyn StateBackend>,
    clock: Arc<dyn Clock>,
    // Generation of the last snapshot that reached the backend.
    written: Mutex<u64>,
}

struct Inner {
    records: ReviewStoreState,
    generation: u64,
}

impl ReviewRecordStore {
    /// Load persisted records, falling back to an empty store.
    ///
    /// Never fails: an unreadable blob is logged and ignored.
    pub async fn load(backend: Arc<dyn StateBackend>, clock: Arc<dyn Clock>) -> Self {
        let records = match backend.load().await {
            Ok(Some(value)) => ReviewStoreState::hydrate(value),
            Ok(None) => ReviewStoreState::default(),
            Err(e) => {
                tracing::warn!("Ignoring unreadable review data: {}", e);
                ReviewStoreState::default()
            }
        };
        tracing::debug!(records = records.len(), "Loaded review records");
        Self::from_state(records, backend, clock)
    }

    /// Wrap an already-built state without reading the backend.
    pub fn from_state(
        records: ReviewStoreState,
        backend: Arc<dyn StateBackend>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            state: RwLock::new(Inner {
                records,
                generation: 0,
            }),
            backend,
            clock,
            written: Mutex::new(0),
        }
    }

    /// In-memory store with the system clock, for tests and throwaway sessions.
    pub fn in_memory() -> Self {
        Self::from_state(
            ReviewStoreState::default(),
            Arc::new(MemoryBackend::new()),
            Arc::new(SystemClock),
        )
    }

    /// Copy of the current state.
    pub fn snapshot(&self) -> ReviewStoreState {
        self.read(|inner| inner.records.clone())
    }

    /// Record for `path`, if any.
    pub fn get(&self, path: &str) -> Option<ReviewRecord> {
        self.read(|inner| inner.records.get(path).copied())
    }

    /// `lastSeen` for `path`, 0 when absent.
    pub fn last_seen(&self, path: &str) -> i64 {
        self.read(|inner| inner.records.last_seen(path))
    }

    /// Persist the full current mapping.
    pub async fn save(&self) {
        let (generation, value) = self.read(|inner| (inner.generation, inner.records.to_value()));
        self.persist(generation, value).await;
    }

    /// Note that `path` was looked at just now.
    pub async fn touch_seen(&self, path: &str) -> ReviewRecord {
        let now = self.clock.now_millis();
        self.update(path, |record| {
            record.last_seen = record.last_seen.max(now);
        })
        .await
    }

    /// Note that `path` was reviewed just now. Sets `lastReviewed` and
    /// `lastSeen` to the same stamp.
    pub async fn mark_reviewed(&self, path: &str) -> ReviewRecord {
        let now = self.clock.now_millis();
        self.update(path, |record| {
            let stamp = now.max(record.last_seen);
            record.last_reviewed = stamp;
            record.last_seen = stamp;
        })
        .await
    }

    /// Record an explicit difficulty rating for `path`.
    pub async fn set_ease(&self, path: &str, ease: f64) -> ReviewRecord {
        let now = self.clock.now_millis();
        self.update(path, |record| {
            record.ease = ease;
            record.last_reviewed = now;
        })
        .await
    }

    /// Move the record at `old_path` to `new_path`.
    ///
    /// Returns false (and writes nothing) when there is no record to move.
    pub async fn rename(&self, old_path: &str, new_path: &str) -> bool {
        if old_path == new_path {
            return false;
        }
        let committed = self.commit(|records| match records.notes.remove(old_path) {
            Some(record) => {
                records.notes.insert(new_path.to_string(), record);
                true
            }
            None => false,
        });

        match committed {
            Some((generation, value)) => {
                tracing::debug!(old_path, new_path, "Migrated review record");
                self.persist(generation, value).await;
                true
            }
            None => false,
        }
    }

    /// Drop the record for `path`. Absent records already read as defaults,
    /// so this is only housekeeping.
    pub async fn remove(&self, path: &str) -> bool {
        let committed = self.commit(|records| records.notes.remove(path).is_some());
        match committed {
            Some((generation, value)) => {
                self.persist(generation, value).await;
                true
            }
            None => false,
        }
    }

    async fn update(&self, path: &str, apply: impl FnOnce(&mut ReviewRecord)) -> ReviewRecord {
        let mut updated = ReviewRecord::default();
        let committed = self.commit(|records| {
            let record = records.notes.entry(path.to_string()).or_default();
            apply(record);
            updated = *record;
            true
        });
        if let Some((generation, value)) = committed {
            self.persist(generation, value).await;
        }
        updated
    }

    // Applies `change` under the write lock. When it reports a change, bumps
    // the generation and returns the snapshot to write.
    fn commit(&self, change: impl FnOnce(&mut ReviewStoreState) -> bool) -> Option<(u64, Value)> {
        let mut inner = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if !change(&mut inner.records) {
            return None;
        }
        inner.generation += 1;
        Some((inner.generation, inner.records.to_value()))
    }

    async fn persist(&self, generation: u64, value: Value) {
        let mut written = self.written.lock().await;
        if generation < *written {
            tracing::debug!(generation, written = *written, "Skipping stale review snapshot");
            return;
        }
        match self.backend.save(&value).await {
            Ok(()) => *written = generation,
            Err(e) => tracing::warn!("Failed to persist review data: {}", e),
        }
    }

    fn read<T>(&self, f: impl FnOnce(&Inner) -> T) -> T {
        let inner = self.state.read().unwrap_or_else(PoisonError::into_inner);
        f(&inner)
    }
}
