// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Directory walker that turns a tree into an analysis work list

use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

use crate::content::ContentType;
use crate::{ArgusError, Result};

/// One file scheduled for analysis
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchItem {
    pub path: PathBuf,
    /// Base name used in the categorization output
    pub file_name: String,
    pub content_type: ContentType,
}

impl DispatchItem {
    /// Build an item for a path, or `None` if its extension is not mapped
    pub fn from_path(path: &Path) -> Option<Self> {
        let content_type = ContentType::from_path(path)?;
        let file_name = path.file_name()?.to_string_lossy().into_owned();
        Some(Self {
            path: path.to_path_buf(),
            file_name,
            content_type,
        })
    }

    /// Cache key for this file
    pub fn cache_key(&self) -> String {
        self.path.to_string_lossy().into_owned()
    }
}

/// Produces the work list for a directory
#[derive(Debug, Clone)]
pub struct Dispatcher {
    reserved_dir: String,
}

impl Dispatcher {
    pub fn new(reserved_dir: impl Into<String>) -> Self {
        Self {
            reserved_dir: reserved_dir.into(),
        }
    }

    /// Recursively list supported files under `root`, in filesystem order.
    ///
    /// Subtrees whose directory name equals the reserved marker are pruned.
    /// Files with unmapped extensions are skipped silently; unreadable entries
    /// are logged and skipped.
    pub fn dispatch(&self, root: &Path) -> Result<Vec<DispatchItem>> {
        if !root.is_dir() {
            return Err(ArgusError::Config(format!("Not a directory: {:?}", root)));
        }

        let mut items = Vec::new();
        let walker = WalkDir::new(root)
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !self.is_reserved(entry));

        for entry in walker {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    warn!("Skipping unreadable entry: {}", e);
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            match DispatchItem::from_path(entry.path()) {
                Some(item) => items.push(item),
                None => debug!("No content type for {:?}, skipping", entry.path()),
            }
        }

        debug!("Dispatched {} files from {:?}", items.len(), root);
        Ok(items)
    }

    fn is_reserved(&self, entry: &DirEntry) -> bool {
        entry.file_type().is_dir() && entry.file_name() == self.reserved_dir.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"x").unwrap();
    }

    fn names(items: &[DispatchItem]) -> Vec<String> {
        let mut names: Vec<String> = items.iter().map(|i| i.file_name.clone()).collect();
        names.sort();
        names
    }

    #[test]
    fn test_only_mapped_extensions() {
        let dir = TempDir::new().unwrap();
        for rel in ["a.txt", "b.png", "c.mp3", "d.jpg", "e.wav", "f.pdf", "noext", "g.TXT"] {
            touch(dir.path(), rel);
        }

        let items = Dispatcher::new("facts").dispatch(dir.path()).unwrap();
        assert_eq!(names(&items), vec!["a.txt", "b.png", "c.mp3", "g.TXT"]);

        let b = items.iter().find(|i| i.file_name == "b.png").unwrap();
        assert_eq!(b.content_type, ContentType::Image);
    }

    #[test]
    fn test_recurses_into_subdirectories() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "one/two/deep.txt");
        touch(dir.path(), "top.mp3");

        let items = Dispatcher::new("facts").dispatch(dir.path()).unwrap();
        assert_eq!(names(&items), vec!["deep.txt", "top.mp3"]);
    }

    #[test]
    fn test_reserved_subtree_excluded() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "facts/f1.txt");
        touch(dir.path(), "facts/nested/f2.png");
        touch(dir.path(), "sub/facts/f3.mp3");
        touch(dir.path(), "factsheet.txt");
        touch(dir.path(), "keep.txt");

        let items = Dispatcher::new("facts").dispatch(dir.path()).unwrap();
        assert_eq!(names(&items), vec!["factsheet.txt", "keep.txt"]);
    }

    #[test]
    fn test_file_named_like_marker_is_kept() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("facts"), b"x").unwrap();
        touch(dir.path(), "report.txt");

        let items = Dispatcher::new("facts").dispatch(dir.path()).unwrap();
        assert_eq!(names(&items), vec!["report.txt"]);
    }

    #[test]
    fn test_missing_root_is_error() {
        let dir = TempDir::new().unwrap();
        let result = Dispatcher::new("facts").dispatch(&dir.path().join("missing"));
        assert!(matches!(result, Err(ArgusError::Config(_))));
    }

    #[test]
    fn test_item_from_unsupported_path() {
        assert!(DispatchItem::from_path(Path::new("x/song.flac")).is_none());
        let item = DispatchItem::from_path(Path::new("x/song.mp3")).unwrap();
        assert_eq!(item.file_name, "song.mp3");
        assert_eq!(item.cache_key(), "x/song.mp3");
    }
}
