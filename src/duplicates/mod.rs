//! Duplicate detection module.
//!
//! Content-fingerprint comparison of the files in one report group. See
//! [`checker`] for the short-circuit semantics.

pub mod checker;

pub use checker::{DuplicateChecker, DuplicatePair};
