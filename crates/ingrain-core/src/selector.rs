//! Oldest-first document selection.
//!
//! A document's age is its `lastSeen` stamp, with absent records counting as
//! `0`. Never-seen documents therefore always win over seen ones.

use std::collections::HashSet;

use crate::types::{DocumentHandle, ReviewStoreState};

/// Pick the document with the smallest `lastSeen`, skipping `exclude`.
///
/// Ties go to whichever document comes first in `documents`. Returns `None`
/// when every document is excluded or there are none.
pub fn select_oldest<'a>(
    documents: &'a [DocumentHandle],
    store: &ReviewStoreState,
    exclude: &HashSet<String>,
) -> Option<&'a DocumentHandle> {
    let mut oldest: Option<(&DocumentHandle, i64)> = None;

    for document in documents {
        if exclude.contains(&document.path) {
            continue;
        }
        let seen = store.last_seen(&document.path);
        match oldest {
            Some((_, best)) if seen >= best => {}
            _ => oldest = Some((document, seen)),
        }
    }

    oldest.map(|(document, _)| document)
}

/// Result of [`select_with_fallback`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub document: DocumentHandle,
    /// True when `exclude` left nothing and the unfiltered set was used.
    pub fell_back: bool,
}

/// [`select_oldest`] with `exclude`, retrying unfiltered if that finds nothing.
pub fn select_with_fallback(
    documents: &[DocumentHandle],
    store: &ReviewStoreState,
    exclude: &HashSet<String>,
) -> Option<Selection> {
    if let Some(document) = select_oldest(documents, store, exclude) {
        return Some(Selection {
            document: document.clone(),
            fell_back: false,
        });
    }
    if exclude.is_empty() {
        return None;
    }
    select_oldest(documents, store, &HashSet::new()).map(|document| Selection {
        document: document.clone(),
        fell_back: true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ReviewRecord;

    fn docs(paths: &[&str]) -> Vec<DocumentHandle> {
        paths.iter().map(|p| DocumentHandle::from_path(*p)).collect()
    }

    fn seen(entries: &[(&str, i64)]) -> ReviewStoreState {
        let mut state = ReviewStoreState::default();
        for (path, last_seen) in entries {
            state.notes.insert(
                path.to_string(),
                ReviewRecord {
                    last_seen: *last_seen,
                    ..Default::default()
                },
            );
        }
        state
    }

    fn exclude(paths: &[&str]) -> HashSet<String> {
        paths.iter().map(|p| p.to_string()).collect()
    }

    #[test]
    fn test_empty_documents() {
        let state = ReviewStoreState::default();
        assert!(select_oldest(&[], &state, &HashSet::new()).is_none());
        assert!(select_with_fallback(&[], &state, &exclude(&["a.md"])).is_none());
    }

    #[test]
    fn test_picks_minimum_last_seen() {
        let documents = docs(&["a.md", "b.md", "c.md"]);
        let state = seen(&[("a.md", 300), ("b.md", 100), ("c.md", 200)]);

        let picked = select_oldest(&documents, &state, &HashSet::new()).unwrap();
        assert_eq!(picked.path, "b.md");
    }

    #[test]
    fn test_unseen_document_beats_seen_ones() {
        let documents = docs(&["seen.md", "never.md"]);
        let state = seen(&[("seen.md", 1)]);

        let picked = select_oldest(&documents, &state, &HashSet::new()).unwrap();
        assert_eq!(picked.path, "never.md");
    }

    #[test]
    fn test_ties_use_input_order() {
        let documents = docs(&["x.md", "y.md", "z.md"]);
        let state = seen(&[("x.md", 50), ("y.md", 10), ("z.md", 10)]);
        assert_eq!(
            select_oldest(&documents, &state, &HashSet::new()).unwrap().path,
            "y.md"
        );

        let reversed = docs(&["z.md", "y.md", "x.md"]);
        assert_eq!(
            select_oldest(&reversed, &state, &HashSet::new()).unwrap().path,
            "z.md"
        );

        // All absent: first document wins.
        let fresh = ReviewStoreState::default();
        assert_eq!(
            select_oldest(&documents, &fresh, &HashSet::new()).unwrap().path,
            "x.md"
        );
    }

    #[test]
    fn test_exclusion_skips_documents() {
        let documents = docs(&["a.md", "b.md", "c.md"]);
        let state = seen(&[("a.md", 0), ("b.md", 500), ("c.md", 1500)]);

        let picked = select_oldest(&documents, &state, &exclude(&["a.md"])).unwrap();
        assert_eq!(picked.path, "b.md");
    }

    #[test]
    fn test_everything_excluded_returns_none() {
        let documents = docs(&["a.md", "b.md"]);
        let state = seen(&[("a.md", 10)]);

        assert!(select_oldest(&documents, &state, &exclude(&["a.md", "b.md"])).is_none());
    }

    #[test]
    fn test_fallback_ignores_exclusions_when_exhausted() {
        let documents = docs(&["a.md", "b.md"]);
        let state = seen(&[("a.md", 10), ("b.md", 20)]);

        let filtered = select_with_fallback(&documents, &state, &exclude(&["a.md"])).unwrap();
        assert_eq!(filtered.document.path, "b.md");
        assert!(!filtered.fell_back);

        let fallback =
            select_with_fallback(&documents, &state, &exclude(&["a.md", "b.md"])).unwrap();
        assert_eq!(fallback.document.path, "a.md");
        assert!(fallback.fell_back);
    }
}
