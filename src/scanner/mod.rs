//! Scanner module for file discovery and content hashing.
//!
//! This module provides:
//! - [`lister`]: prefix-based discovery of export files in the work directory
//! - [`hasher`]: streaming BLAKE3 content fingerprints
//!
//! # Example
//!
//! ```no_run
//! use report_merger::scanner::{DirLister, FileLister, Hasher};
//! use std::path::Path;
//!
//! let lister = DirLister::new("/home/me/Downloads");
//! let files = lister.list_files("AdManager Reporting").unwrap();
//!
//! let hasher = Hasher::new();
//! for file in &files {
//!     let hash = hasher.full_hash(file).unwrap();
//!     println!("{}", report_merger::scanner::hash_to_hex(&hash));
//! }
//! ```

pub mod hasher;
pub mod lister;

use std::io;
use std::path::{Path, PathBuf};

pub use hasher::{hash_to_hex, Hash, Hasher};
pub use lister::{DirLister, FileLister};

/// Errors that can occur while listing the work directory.
#[derive(thiserror::Error, Debug)]
pub enum ListError {
    /// The directory does not exist.
    #[error("Directory not found: {0}")]
    NotFound(PathBuf),

    /// The path exists but is not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// An I/O error occurred while reading the directory.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },
}

impl ListError {
    fn from_walkdir(root: &Path, err: walkdir::Error) -> Self {
        let path = err.path().unwrap_or(root).to_path_buf();
        let source = err
            .into_io_error()
            .unwrap_or_else(|| io::Error::other("directory loop"));
        Self::Io { path, source }
    }
}

/// Errors that can occur during file hashing.
#[derive(thiserror::Error, Debug)]
pub enum HashError {
    /// The specified file was not found.
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    /// Permission was denied when reading the file.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// An I/O error occurred while reading the file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },
}

impl HashError {
    pub(crate) fn from_io(path: &Path, err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: err,
            },
        }
    }

    /// Path of the file that failed to hash.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::NotFound(p) | Self::PermissionDenied(p) | Self::Io { path: p, .. } => p,
        }
    }
}
