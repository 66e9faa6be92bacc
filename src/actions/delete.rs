//! Removal of merged source files.
//!
//! # Overview
//!
//! Once a group has been merged its source exports are removed:
//! - Permanent deletion (default)
//! - Move to system trash (recoverable, opt-in)
//!
//! A batch stops at the first failure. Files removed before the failure stay
//! removed; the merged output is never rolled back.
//!
//! # Example
//!
//! ```no_run
//! use report_merger::actions::delete::{FileDeleter, FsDeleter};
//! use std::path::PathBuf;
//!
//! let deleter = FsDeleter::permanent();
//! let files = vec![PathBuf::from("/tmp/report_2025-01-01.csv")];
//! match deleter.delete_files(&files) {
//!     Ok(n) => println!("Removed {n} file(s)"),
//!     Err(e) => eprintln!("Failed: {e}"),
//! }
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Error type for deletion operations.
#[derive(Debug, Error)]
pub enum DeleteError {
    /// File was not found (may have been deleted or moved).
    #[error("file not found: {0}")]
    NotFound(PathBuf),

    /// Permission denied when attempting to delete.
    #[error("permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// Trash operation failed.
    #[error("trash operation failed for {path}: {message}")]
    TrashFailed { path: PathBuf, message: String },

    /// Permanent delete operation failed.
    #[error("could not delete {path}: {source}")]
    RemoveFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl DeleteError {
    /// Get the path associated with this error.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::NotFound(p)
            | Self::PermissionDenied(p)
            | Self::TrashFailed { path: p, .. }
            | Self::RemoveFailed { path: p, .. } => p,
        }
    }

    fn from_io(path: &Path, err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::RemoveFailed {
                path: path.to_path_buf(),
                source: err,
            },
        }
    }
}

/// Capability to remove a list of files.
pub trait FileDeleter: Send + Sync {
    /// Remove `files` in order, stopping at the first failure.
    ///
    /// Returns the number of files removed.
    ///
    /// # Errors
    ///
    /// Returns the [`DeleteError`] of the first file that could not be
    /// removed. Later files are left in place.
    fn delete_files(&self, files: &[PathBuf]) -> Result<usize, DeleteError>;
}

/// Filesystem-backed deleter.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsDeleter {
    use_trash: bool,
}

impl FsDeleter {
    /// Deleter that removes files permanently.
    #[must_use]
    pub fn permanent() -> Self {
        Self { use_trash: false }
    }

    /// Deleter that moves files to the system trash.
    #[must_use]
    pub fn trash() -> Self {
        Self { use_trash: true }
    }

    /// Whether files go to the trash.
    #[must_use]
    pub fn uses_trash(&self) -> bool {
        self.use_trash
    }
}

impl FileDeleter for FsDeleter {
    fn delete_files(&self, files: &[PathBuf]) -> Result<usize, DeleteError> {
        let mut removed = 0;
        for path in files {
            if self.use_trash {
                delete_to_trash(path)?;
            } else {
                permanent_delete(path)?;
            }
            removed += 1;
        }
        Ok(removed)
    }
}

/// Move a single file to the system trash.
///
/// # Errors
///
/// - `NotFound` if the file doesn't exist
/// - `PermissionDenied` if its metadata cannot be read
/// - `TrashFailed` if the trash operation fails
pub fn delete_to_trash(path: &Path) -> Result<(), DeleteError> {
    // Trash backends report a missing file as an opaque error.
    fs::symlink_metadata(path).map_err(|e| DeleteError::from_io(path, e))?;

    trash::delete(path).map_err(|e| {
        log::error!("Trash operation failed for {}: {}", path.display(), e);
        DeleteError::TrashFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        }
    })?;

    log::debug!("Moved to trash: {}", path.display());
    Ok(())
}

/// Permanently delete a single file.
///
/// # Errors
///
/// - `NotFound` if the file doesn't exist
/// - `PermissionDenied` if the file cannot be removed for lack of rights
/// - `RemoveFailed` for any other I/O failure
pub fn permanent_delete(path: &Path) -> Result<(), DeleteError> {
    fs::remove_file(path).map_err(|e| {
        log::error!("Could not delete {}: {}", path.display(), e);
        DeleteError::from_io(path, e)
    })?;

    log::debug!("Deleted: {}", path.display());
    Ok(())
}
