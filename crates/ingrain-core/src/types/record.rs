//! Persisted review records.
//!
//! The on-disk shape is a single JSON object:
//!
//! ```json
//! { "notes": { "<path>": { "ease": 200, "lastReviewed": 0, "lastSeen": 0 } } }
//! ```
//!
//! Older or hand-edited blobs may be missing any part of that, so loading goes
//! through [`ReviewStoreState::hydrate`] rather than a strict deserialize.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Default ease weight for a document that has never been rated.
pub const DEFAULT_EASE: f64 = 200.0;

const NOTES_KEY: &str = "notes";

/// Review metadata for one document.
///
/// Timestamps are milliseconds since the Unix epoch; `0` means never.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewRecord {
    /// Opaque scheduling weight. Persisted and settable, not used for selection.
    pub ease: f64,
    pub last_reviewed: i64,
    pub last_seen: i64,
}

impl Default for ReviewRecord {
    fn default() -> Self {
        Self {
            ease: DEFAULT_EASE,
            last_reviewed: 0,
            last_seen: 0,
        }
    }
}

impl ReviewRecord {
    /// Build a record from a raw JSON value, defaulting anything missing or mistyped.
    pub fn hydrate(value: &Value) -> Self {
        let mut record = Self::default();
        let Some(fields) = value.as_object() else {
            return record;
        };

        if let Some(ease) = fields.get("ease").and_then(Value::as_f64) {
            record.ease = ease;
        }
        if let Some(ts) = fields.get("lastReviewed").and_then(as_timestamp) {
            record.last_reviewed = ts;
        }
        if let Some(ts) = fields.get("lastSeen").and_then(as_timestamp) {
            record.last_seen = ts;
        }
        record
    }
}

// JS hosts write Date.now() values, which may come back as floats.
fn as_timestamp(value: &Value) -> Option<i64> {
    value
        .as_i64()
        .or_else(|| value.as_f64().filter(|f| f.is_finite()).map(|f| f as i64))
}

/// The whole persisted state: path -> record, plus any keys we don't own.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReviewStoreState {
    pub notes: HashMap<String, ReviewRecord>,
    /// Top-level keys written by someone else (for example host settings).
    pub extra: Map<String, Value>,
}

impl ReviewStoreState {
    /// Merge a persisted blob over the default empty state.
    pub fn hydrate(value: Value) -> Self {
        let Value::Object(mut root) = value else {
            return Self::default();
        };

        let notes = match root.remove(NOTES_KEY) {
            Some(Value::Object(entries)) => entries
                .iter()
                .map(|(path, raw)| (path.clone(), ReviewRecord::hydrate(raw)))
                .collect(),
            _ => HashMap::new(),
        };

        Self { notes, extra: root }
    }

    /// Serialize back to the persisted layout.
    pub fn to_value(&self) -> Value {
        let mut root = self.extra.clone();
        let notes: Map<String, Value> = self
            .notes
            .iter()
            .map(|(path, record)| {
                let value = serde_json::to_value(record).unwrap_or(Value::Null);
                (path.clone(), value)
            })
            .collect();
        root.insert(NOTES_KEY.to_string(), Value::Object(notes));
        Value::Object(root)
    }

    /// Record for `path`, if one exists.
    pub fn get(&self, path: &str) -> Option<&ReviewRecord> {
        self.notes.get(path)
    }

    /// `lastSeen` for `path`, treating an absent record as never seen.
    pub fn last_seen(&self, path: &str) -> i64 {
        self.notes.get(path).map(|r| r.last_seen).unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }
}
