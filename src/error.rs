//! Structured error handling and exit codes.

use serde::Serialize;

use crate::pipeline::{GroupError, ProcessingResult};

/// Exit codes for the report merger.
///
/// - 0: Success (every group merged)
/// - 1: General error (configuration or work directory failure)
/// - 2: Nothing to merge (no group had any matching files)
/// - 3: Partial failure (at least one group failed for a reason other than
///   having no files)
/// - 130: Interrupted by user (Ctrl+C)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitCode {
    /// Every group merged successfully (or had nothing to merge).
    Success = 0,
    /// General error: an unexpected or fatal failure.
    GeneralError = 1,
    /// No group had any files to merge.
    NothingToMerge = 2,
    /// At least one group failed.
    PartialFailure = 3,
    /// Interrupted by user (Ctrl+C).
    Interrupted = 130,
}

impl ExitCode {
    /// Get the numeric exit code.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Get the machine-readable code prefix.
    #[must_use]
    pub fn code_prefix(self) -> &'static str {
        match self {
            Self::Success => "RM000",
            Self::GeneralError => "RM001",
            Self::NothingToMerge => "RM002",
            Self::PartialFailure => "RM003",
            Self::Interrupted => "RM130",
        }
    }

    /// Derive the exit code of a batch from its per-group results.
    ///
    /// Interruption wins over failure, failure over "nothing to merge".
    #[must_use]
    pub fn from_results(results: &[ProcessingResult]) -> Self {
        let mut interrupted = false;
        let mut failed = false;
        let mut all_not_found = !results.is_empty();

        for result in results {
            match &result.error {
                None => all_not_found = false,
                Some(GroupError::NotFound { .. }) => {}
                Some(GroupError::Interrupted) => {
                    interrupted = true;
                    all_not_found = false;
                }
                Some(_) => {
                    failed = true;
                    all_not_found = false;
                }
            }
        }

        if interrupted {
            Self::Interrupted
        } else if failed {
            Self::PartialFailure
        } else if all_not_found {
            Self::NothingToMerge
        } else {
            Self::Success
        }
    }
}

/// Structured error information for JSON output.
#[derive(Debug, Serialize)]
pub struct StructuredError {
    /// The error code (e.g., "RM001")
    pub code: String,
    /// The exit code number
    pub exit_code: i32,
    /// Human-readable error message, including its causes
    pub message: String,
    /// Whether the operation was interrupted
    pub interrupted: bool,
}

impl StructuredError {
    /// Create a new structured error from an anyhow error and an exit code.
    #[must_use]
    pub fn new(err: &anyhow::Error, exit_code: ExitCode) -> Self {
        Self {
            code: exit_code.code_prefix().to_string(),
            exit_code: exit_code.as_i32(),
            message: format!("{err:#}"),
            interrupted: exit_code == ExitCode::Interrupted,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Group;
    use std::path::PathBuf;
    use std::time::Duration;

    fn result(error: Option<GroupError>) -> ProcessingResult {
        ProcessingResult {
            group: Group::new("p", "o.csv"),
            files_found: 0,
            files_merged: 0,
            dates_found: Vec::new(),
            merge_order: Vec::new(),
            output_file: PathBuf::from("o.csv"),
            bytes_written: 0,
            duration: Duration::ZERO,
            error,
        }
    }

    fn not_found() -> GroupError {
        GroupError::NotFound {
            prefix: "p".to_string(),
        }
    }

    #[test]
    fn test_exit_code_values() {
        assert_eq!(ExitCode::Success.as_i32(), 0);
        assert_eq!(ExitCode::GeneralError.as_i32(), 1);
        assert_eq!(ExitCode::NothingToMerge.as_i32(), 2);
        assert_eq!(ExitCode::PartialFailure.as_i32(), 3);
        assert_eq!(ExitCode::Interrupted.as_i32(), 130);
        assert_eq!(ExitCode::PartialFailure.code_prefix(), "RM003");
    }

    #[test]
    fn test_from_results_success() {
        let results = vec![result(None), result(Some(not_found()))];
        assert_eq!(ExitCode::from_results(&results), ExitCode::Success);
    }

    #[test]
    fn test_from_results_nothing_to_merge() {
        let results = vec![result(Some(not_found())), result(Some(not_found()))];
        assert_eq!(ExitCode::from_results(&results), ExitCode::NothingToMerge);
    }

    #[test]
    fn test_from_results_failure_and_interrupt() {
        let dup = GroupError::DuplicateContent {
            prefix: "p".to_string(),
            original: PathBuf::from("a"),
            duplicate: PathBuf::from("b"),
        };
        let results = vec![result(None), result(Some(dup))];
        assert_eq!(ExitCode::from_results(&results), ExitCode::PartialFailure);

        let results = vec![result(Some(GroupError::Interrupted))];
        assert_eq!(ExitCode::from_results(&results), ExitCode::Interrupted);
    }

    #[test]
    fn test_structured_error_includes_context() {
        let err = anyhow::anyhow!("root cause").context("loading configuration");
        let structured = StructuredError::new(&err, ExitCode::GeneralError);
        assert_eq!(structured.code, "RM001");
        assert_eq!(structured.message, "loading configuration: root cause");
        assert!(!structured.interrupted);
    }
}
