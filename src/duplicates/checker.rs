//! Byte-identical export detection within one group.
//!
//! # Overview
//!
//! Report portals occasionally hand out the same export twice (a double
//! click, a retried download). Merging both copies would duplicate every
//! row, so the pipeline refuses to merge a group in which any two files
//! share a content fingerprint.
//!
//! The scan short-circuits: the first repeated fingerprint ends it and the
//! remaining files are never read. Only that first pair is reported.
//!
//! # Example
//!
//! ```no_run
//! use report_merger::duplicates::DuplicateChecker;
//! use std::path::PathBuf;
//!
//! let files = vec![PathBuf::from("a.csv"), PathBuf::from("b.csv")];
//! let checker = DuplicateChecker::new();
//! if checker.check(&files).unwrap() {
//!     eprintln!("refusing to merge duplicated exports");
//! }
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::scanner::{hash_to_hex, Hash, HashError, Hasher};

/// The first pair of byte-identical files found in a set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicatePair {
    /// File that first produced the fingerprint.
    pub original: PathBuf,
    /// Later file with the same fingerprint.
    pub duplicate: PathBuf,
    /// Shared content fingerprint.
    pub hash: Hash,
}

impl DuplicatePair {
    /// Fingerprint as a hex string.
    #[must_use]
    pub fn hash_hex(&self) -> String {
        hash_to_hex(&self.hash)
    }
}

/// Detects byte-identical files by content fingerprint.
#[derive(Debug, Clone, Default)]
pub struct DuplicateChecker {
    hasher: Hasher,
}

impl DuplicateChecker {
    /// Create a checker with the default hasher.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a checker that uses the given hasher.
    #[must_use]
    pub fn with_hasher(hasher: Hasher) -> Self {
        Self { hasher }
    }

    /// Report whether any two files in `files` have identical content.
    ///
    /// # Errors
    ///
    /// Returns a [`HashError`] as soon as any file cannot be read, including
    /// when it does not exist.
    pub fn check<P: AsRef<Path>>(&self, files: &[P]) -> Result<bool, HashError> {
        Ok(self.find_first_duplicate(files)?.is_some())
    }

    /// Find the first pair of files with identical content, in input order.
    ///
    /// Files after the second member of the pair are not read.
    ///
    /// # Errors
    ///
    /// Returns a [`HashError`] as soon as any file cannot be read.
    pub fn find_first_duplicate<P: AsRef<Path>>(
        &self,
        files: &[P],
    ) -> Result<Option<DuplicatePair>, HashError> {
        if files.len() < 2 {
            // Still surface unreadable input for a single file.
            for file in files {
                self.hasher.full_hash(file.as_ref())?;
            }
            return Ok(None);
        }

        let mut seen: HashMap<Hash, &Path> = HashMap::with_capacity(files.len());

        for file in files {
            let path = file.as_ref();
            let hash = self.hasher.full_hash(path)?;

            if let Some(original) = seen.get(&hash) {
                log::warn!(
                    "Duplicate files: {} and {}",
                    path.display(),
                    original.display()
                );
                return Ok(Some(DuplicatePair {
                    original: original.to_path_buf(),
                    duplicate: path.to_path_buf(),
                    hash,
                }));
            }
            seen.insert(hash, path);
        }

        log::debug!("No duplicate content among {} file(s)", files.len());
        Ok(None)
    }
}
