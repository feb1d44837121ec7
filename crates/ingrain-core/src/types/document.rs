//! Document handles.

use serde::{Deserialize, Serialize};

/// Reference to a reviewable document owned by the host.
///
/// `path` is the stable identity (it changes only on rename); `basename` is
/// the display title.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentHandle {
    pub path: String,
    pub basename: String,
}

impl DocumentHandle {
    /// Create a handle with an explicit title.
    pub fn new(path: impl Into<String>, basename: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            basename: basename.into(),
        }
    }

    /// Create a handle whose title is the file stem of `path`.
    ///
    /// `notes/Rust ownership.md` becomes `Rust ownership`.
    pub fn from_path(path: impl Into<String>) -> Self {
        let path = path.into();
        let basename = basename_of(&path);
        Self { path, basename }
    }
}

fn basename_of(path: &str) -> String {
    let file = path.rsplit(['/', '\\']).next().unwrap_or(path);
    match file.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem.to_string(),
        _ => file.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_path_strips_folder_and_extension() {
        let doc = DocumentHandle::from_path("folder/sub/My Note.md");
        assert_eq!(doc.basename, "My Note");
        assert_eq!(doc.path, "folder/sub/My Note.md");
    }

    #[test]
    fn test_from_path_without_extension() {
        assert_eq!(DocumentHandle::from_path("README").basename, "README");
        assert_eq!(DocumentHandle::from_path(".hidden").basename, ".hidden");
    }
}
