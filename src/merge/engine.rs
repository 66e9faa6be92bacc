//! Streaming concatenation of report files.
//!
//! # Overview
//!
//! The engine orders the input files with [`DateOrderer`], then streams each
//! file line by line into the output:
//!
//! 1. Line 1 (the header) is dropped.
//! 2. The first 10 characters of line 2 are recorded as the file's
//!    boundary key.
//! 3. Line 2 onwards is written followed by a single `\n`, including a
//!    final line that had no terminator in the source.
//!
//! Lines are handled as raw bytes so non-UTF-8 content passes through
//! untouched. A `\r` before the `\n` is treated as part of the line ending,
//! so CRLF exports come out LF-terminated.
//!
//! The boundary key is a raw character slice of the line, while the sort
//! key is a parsed CSV field. For quoted first columns the two differ (the
//! boundary key keeps the opening quote). Both are kept as they are because
//! they answer different questions: which order to merge in, and what the
//! file actually began with.
//!
//! The output is not written atomically. A failure partway through leaves
//! the rows merged so far in the output file.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use super::order::DateOrderer;
use super::MergeError;

/// Number of leading characters of the first data row kept as boundary key.
pub const BOUNDARY_KEY_CHARS: usize = 10;

/// Read and write buffer size.
const BUFFER_SIZE: usize = 64 * 1024;

/// Result of a successful merge.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    /// Boundary key of each file with at least one data row, in merge order.
    pub boundary_keys: Vec<String>,
    /// Input files in the order they were merged.
    pub merged_order: Vec<PathBuf>,
    /// Data rows written to the output.
    pub rows_written: usize,
    /// Bytes written to the output.
    pub bytes_written: u64,
}

/// Orders and concatenates report files.
#[derive(Debug, Clone, Default)]
pub struct MergeEngine {
    orderer: DateOrderer,
}

impl MergeEngine {
    /// Create an engine.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge `files` into `output`, headers stripped, ordered by sort key.
    ///
    /// `output` is created or truncated.
    ///
    /// # Errors
    ///
    /// - [`MergeError::NoInput`] if `files` is empty (no output is created)
    /// - [`MergeError::CreateOutput`] if the output cannot be created
    /// - [`MergeError::OpenInput`] / [`MergeError::Read`] if an input fails;
    ///   files merged before it stay in the output
    /// - [`MergeError::Write`] if writing the output fails
    pub fn merge<P: AsRef<Path>>(
        &self,
        files: &[P],
        output: &Path,
    ) -> Result<MergeOutcome, MergeError> {
        if files.is_empty() {
            return Err(MergeError::NoInput);
        }

        let ordered = self.orderer.order(files);
        log::debug!(
            "Merge order: {:?}",
            ordered
                .iter()
                .map(|o| (o.path.display().to_string(), o.key.as_str()))
                .collect::<Vec<_>>()
        );

        let out = File::create(output).map_err(|source| MergeError::CreateOutput {
            path: output.to_path_buf(),
            source,
        })?;
        let mut writer = BufWriter::with_capacity(BUFFER_SIZE, out);

        let mut outcome = MergeOutcome {
            boundary_keys: Vec::with_capacity(ordered.len()),
            merged_order: Vec::with_capacity(ordered.len()),
            ..Default::default()
        };

        for file in ordered {
            self.append_file(&file.path, output, &mut writer, &mut outcome)?;
            outcome.merged_order.push(file.path);
        }

        writer.flush().map_err(|source| MergeError::Write {
            path: output.to_path_buf(),
            source,
        })?;

        log::debug!(
            "Wrote {} row(s), {} bytes to {}",
            outcome.rows_written,
            outcome.bytes_written,
            output.display()
        );
        Ok(outcome)
    }

    fn append_file<W: Write>(
        &self,
        path: &Path,
        output: &Path,
        writer: &mut W,
        outcome: &mut MergeOutcome,
    ) -> Result<(), MergeError> {
        let file = File::open(path).map_err(|source| MergeError::OpenInput {
            path: path.to_path_buf(),
            source,
        })?;
        let mut reader = BufReader::with_capacity(BUFFER_SIZE, file);
        let mut line = Vec::new();
        let mut line_no = 0usize;

        loop {
            line.clear();
            let n = reader
                .read_until(b'\n', &mut line)
                .map_err(|source| MergeError::Read {
                    path: path.to_path_buf(),
                    source,
                })?;
            if n == 0 {
                break;
            }
            line_no += 1;

            let row = trim_line_ending(&line);

            if line_no == 1 {
                continue;
            }
            if line_no == 2 {
                outcome.boundary_keys.push(boundary_key(row));
            }

            writer
                .write_all(row)
                .and_then(|()| writer.write_all(b"\n"))
                .map_err(|source| MergeError::Write {
                    path: output.to_path_buf(),
                    source,
                })?;
            outcome.rows_written += 1;
            outcome.bytes_written += row.len() as u64 + 1;
        }

        log::trace!("Appended {} ({} line(s))", path.display(), line_no);
        Ok(())
    }
}

/// Strip a trailing `\n` or `\r\n`.
fn trim_line_ending(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

/// First [`BOUNDARY_KEY_CHARS`] characters of a raw row (fewer if shorter).
fn boundary_key(row: &[u8]) -> String {
    String::from_utf8_lossy(row)
        .chars()
        .take(BOUNDARY_KEY_CHARS)
        .collect()
}
