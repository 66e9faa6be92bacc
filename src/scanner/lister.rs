//! Prefix-based file discovery in a single directory.
//!
//! # Overview
//!
//! Report exports land side by side in one directory (by default
//! `~/Downloads`). A group's files are the regular files directly inside
//! that directory whose name starts with the group prefix. Subdirectories
//! are neither descended into nor returned.
//!
//! Results are sorted by file name so discovery order is deterministic;
//! the merge engine relies on it to break ties between equal sort keys.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use super::ListError;

/// Capability to list candidate files for a prefix.
///
/// The pipeline depends on this trait rather than on the filesystem so that
/// tests can substitute a fixed listing.
pub trait FileLister: Send + Sync {
    /// List files whose name starts with `prefix`.
    ///
    /// # Errors
    ///
    /// Returns a [`ListError`] if the underlying directory cannot be read.
    fn list_files(&self, prefix: &str) -> Result<Vec<PathBuf>, ListError>;
}

/// Lists regular files in one directory (non-recursive).
#[derive(Debug, Clone)]
pub struct DirLister {
    root: PathBuf,
}

impl DirLister {
    /// Create a lister rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory being listed.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl FileLister for DirLister {
    fn list_files(&self, prefix: &str) -> Result<Vec<PathBuf>, ListError> {
        if !self.root.exists() {
            return Err(ListError::NotFound(self.root.clone()));
        }
        if !self.root.is_dir() {
            return Err(ListError::NotADirectory(self.root.clone()));
        }

        let walker = WalkDir::new(&self.root)
            .min_depth(1)
            .max_depth(1)
            .follow_links(false)
            .sort_by_file_name();

        let mut matched = Vec::new();
        for entry in walker {
            let entry = entry.map_err(|e| ListError::from_walkdir(&self.root, e))?;

            // Symlinks to files count as files; directories never do.
            let is_file = if entry.path_is_symlink() {
                entry.path().is_file()
            } else {
                entry.file_type().is_file()
            };
            if !is_file {
                continue;
            }

            if entry.file_name().to_string_lossy().starts_with(prefix) {
                matched.push(entry.into_path());
            }
        }

        log::debug!(
            "Found {} file(s) matching {:?} in {}",
            matched.len(),
            prefix,
            self.root.display()
        );
        Ok(matched)
    }
}
