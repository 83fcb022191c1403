//! Folder walker.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// Finds candidate audio files below a root folder.
#[derive(Debug, Clone)]
pub struct FolderWalker {
    extensions: Vec<String>,
}

impl FolderWalker {
    /// Create a walker accepting the given extensions (case-insensitive, no dot).
    pub fn new(extensions: &[String]) -> Self {
        Self {
            extensions: extensions.iter().map(|e| e.to_lowercase()).collect(),
        }
    }

    /// Lazily walk `root`, yielding matching files.
    ///
    /// Entries are visited in file-name order so repeated walks of an
    /// unchanged tree produce the same sequence. Unreadable entries are skipped.
    pub fn walk<'a>(&'a self, root: &Path) -> impl Iterator<Item = PathBuf> + 'a {
        WalkDir::new(root)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .filter(move |path| self.matches(path))
    }

    /// Check whether a path carries one of the supported extensions.
    pub fn matches(&self, path: &Path) -> bool {
        has_extension(path, &self.extensions)
    }
}

/// Case-insensitive extension check against a lowercase extension list.
pub(crate) fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .is_some_and(|ext| extensions.iter().any(|e| *e == ext))
}
