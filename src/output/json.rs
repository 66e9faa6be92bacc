//! JSON report for a batch run.
//!
//! # Output Schema
//!
//! ```json
//! {
//!   "generated_at": "2025-01-04T09:30:00Z",
//!   "groups": [
//!     {
//!       "prefix": "AdManager Reporting",
//!       "output": "raw.csv",
//!       "output_file": "/home/user/Downloads/raw.csv",
//!       "status": "merged",
//!       "files_found": 3,
//!       "files_merged": 3,
//!       "dates_found": ["2025-01-01", "2025-01-02", "2025-01-03"],
//!       "merge_order": ["..."],
//!       "bytes_written": 1234,
//!       "duration_ms": 4,
//!       "error": null
//!     }
//!   ],
//!   "summary": {
//!     "groups": 2,
//!     "merged": 1,
//!     "not_found": 1,
//!     "failed": 0,
//!     "interrupted": 0,
//!     "files_merged": 3,
//!     "bytes_written": 1234,
//!     "dry_run": false,
//!     "exit_code": 0,
//!     "exit_code_name": "RM000"
//!   }
//! }
//! ```

use std::io::Write;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::ExitCode;
use crate::pipeline::{ErrorKind, GroupError, ProcessingResult, Stage};

/// Final state of a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupStatus {
    /// Output written (or planned, on a dry run).
    Merged,
    /// No files matched the prefix.
    NotFound,
    /// Processing stopped with an error.
    Failed,
    /// Not started because of Ctrl+C.
    Interrupted,
}

impl GroupStatus {
    /// Classify a processing result.
    #[must_use]
    pub fn of(result: &ProcessingResult) -> Self {
        match &result.error {
            None => Self::Merged,
            Some(GroupError::NotFound { .. }) => Self::NotFound,
            Some(GroupError::Interrupted) => Self::Interrupted,
            Some(_) => Self::Failed,
        }
    }
}

/// Error details of a failed group.
#[derive(Debug, Clone, Serialize)]
pub struct JsonGroupError {
    pub kind: ErrorKind,
    pub stage: Option<Stage>,
    pub message: String,
}

impl JsonGroupError {
    fn from_error(err: &GroupError) -> Self {
        Self {
            kind: err.kind(),
            stage: err.stage(),
            message: err.to_string(),
        }
    }
}

/// One group in JSON format.
#[derive(Debug, Clone, Serialize)]
pub struct JsonGroupResult {
    pub prefix: String,
    pub output: String,
    pub output_file: String,
    pub status: GroupStatus,
    pub files_found: usize,
    pub files_merged: usize,
    pub dates_found: Vec<String>,
    pub merge_order: Vec<String>,
    pub bytes_written: u64,
    pub duration_ms: u64,
    pub error: Option<JsonGroupError>,
}

impl JsonGroupResult {
    /// Convert a processing result.
    #[must_use]
    pub fn from_result(result: &ProcessingResult) -> Self {
        Self {
            prefix: result.group.prefix.clone(),
            output: result.group.output.clone(),
            output_file: result.output_file.to_string_lossy().into_owned(),
            status: GroupStatus::of(result),
            files_found: result.files_found,
            files_merged: result.files_merged,
            dates_found: result.dates_found.clone(),
            merge_order: result
                .merge_order
                .iter()
                .map(|p| p.to_string_lossy().into_owned())
                .collect(),
            bytes_written: result.bytes_written,
            duration_ms: result.duration.as_millis() as u64,
            error: result.error.as_ref().map(JsonGroupError::from_error),
        }
    }
}

/// Batch totals in JSON format.
#[derive(Debug, Clone, Serialize)]
pub struct JsonSummary {
    /// Number of groups processed
    pub groups: usize,
    /// Groups merged successfully
    pub merged: usize,
    /// Groups with no matching files
    pub not_found: usize,
    /// Groups that stopped with an error
    pub failed: usize,
    /// Groups skipped because of Ctrl+C
    pub interrupted: usize,
    /// Total files merged across groups
    pub files_merged: usize,
    /// Total bytes written across groups
    pub bytes_written: u64,
    /// Whether this was a dry run
    pub dry_run: bool,
    /// The exit code number
    pub exit_code: i32,
    /// The machine-readable exit code name (e.g., "RM000")
    pub exit_code_name: String,
}

impl JsonSummary {
    /// Tally results.
    #[must_use]
    pub fn from_results(results: &[ProcessingResult], dry_run: bool, exit_code: ExitCode) -> Self {
        let mut summary = Self {
            groups: results.len(),
            merged: 0,
            not_found: 0,
            failed: 0,
            interrupted: 0,
            files_merged: 0,
            bytes_written: 0,
            dry_run,
            exit_code: exit_code.as_i32(),
            exit_code_name: exit_code.code_prefix().to_string(),
        };
        for result in results {
            match GroupStatus::of(result) {
                GroupStatus::Merged => summary.merged += 1,
                GroupStatus::NotFound => summary.not_found += 1,
                GroupStatus::Failed => summary.failed += 1,
                GroupStatus::Interrupted => summary.interrupted += 1,
            }
            summary.files_merged += result.files_merged;
            summary.bytes_written += result.bytes_written;
        }
        summary
    }
}

/// Complete JSON report.
#[derive(Debug, Clone, Serialize)]
pub struct JsonReport {
    /// When the report was produced (RFC 3339, UTC)
    pub generated_at: DateTime<Utc>,
    /// Per-group results, in processing order
    pub groups: Vec<JsonGroupResult>,
    /// Batch totals
    pub summary: JsonSummary,
}

impl JsonReport {
    /// Build a report stamped with the current time.
    #[must_use]
    pub fn new(results: &[ProcessingResult], dry_run: bool, exit_code: ExitCode) -> Self {
        Self {
            generated_at: Utc::now(),
            groups: results.iter().map(JsonGroupResult::from_result).collect(),
            summary: JsonSummary::from_results(results, dry_run, exit_code),
        }
    }

    /// Serialize to pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write the report followed by a newline.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<(), JsonOutputError> {
        let json = self.to_json_pretty()?;
        writer.write_all(json.as_bytes())?;
        writer.write_all(b"\n")?;
        Ok(())
    }
}

/// Errors that can occur during JSON output.
#[derive(thiserror::Error, Debug)]
pub enum JsonOutputError {
    /// JSON serialization error
    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error during writing
    #[error("I/O error while writing JSON report: {0}")]
    Io(#[from] std::io::Error),
}
