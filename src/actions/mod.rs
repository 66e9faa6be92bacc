//! File actions module.
//!
//! Cleanup of source exports after a successful merge, either by permanent
//! removal or by moving them to the system trash.
//!
//! ```no_run
//! use report_merger::actions::{FileDeleter, FsDeleter};
//! use std::path::PathBuf;
//!
//! let removed = FsDeleter::trash()
//!     .delete_files(&[PathBuf::from("/tmp/old_export.csv")])
//!     .unwrap();
//! ```

pub mod delete;

pub use delete::{delete_to_trash, permanent_delete, DeleteError, FileDeleter, FsDeleter};
