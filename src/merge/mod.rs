//! CSV merge module.
//!
//! - [`order`]: sort keys and chronological file ordering
//! - [`engine`]: header-stripping streaming concatenation

pub mod engine;
pub mod order;

use std::io;
use std::path::PathBuf;

pub use engine::{MergeEngine, MergeOutcome, BOUNDARY_KEY_CHARS};
pub use order::{DateOrderer, OrderedFile};

/// Errors that can occur while merging.
#[derive(thiserror::Error, Debug)]
pub enum MergeError {
    /// No input files were given.
    #[error("no files to merge")]
    NoInput,

    /// The output file could not be created.
    #[error("unable to create output file {path}: {source}")]
    CreateOutput {
        /// Output path
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// An input file could not be opened.
    #[error("unable to open file {path}: {source}")]
    OpenInput {
        /// Input path
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Reading an input file failed partway through.
    #[error("error reading file {path}: {source}")]
    Read {
        /// Input path
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Writing the output failed.
    #[error("error writing output file {path}: {source}")]
    Write {
        /// Output path
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },
}

impl MergeError {
    /// Whether this error is an I/O failure rather than invalid input.
    #[must_use]
    pub fn is_io(&self) -> bool {
        !matches!(self, Self::NoInput)
    }
}
