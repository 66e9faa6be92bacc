//! Chronological ordering of report files.
//!
//! Every export starts with a header row followed by data rows whose first
//! column is a date in a fixed-width, lexicographically ordered format such
//! as `YYYY-MM-DD`. A file's sort key is that first column of its first data
//! row, read with a real CSV parser so quoted fields are unwrapped.
//!
//! Records are read as raw bytes, so exports in a legacy encoding still get
//! their key; non-UTF-8 bytes in the key are replaced lossily. Keys are
//! compared as plain strings. A file that cannot be opened, has no data row
//! or whose data row cannot be read gets the empty key, which sorts before
//! everything else.

use std::path::{Path, PathBuf};

use csv::ReaderBuilder;

/// A file paired with its sort key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderedFile {
    /// Path of the input file.
    pub path: PathBuf,
    /// First field of the first data row, or empty.
    pub key: String,
}

/// Extracts sort keys and orders files by them.
#[derive(Debug, Clone, Copy, Default)]
pub struct DateOrderer;

impl DateOrderer {
    /// Create an orderer.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Return the first field of the second record of `path`.
    ///
    /// Never fails: any problem yields an empty string.
    #[must_use]
    pub fn first_data_key(&self, path: &Path) -> String {
        let mut reader = match ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(path)
        {
            Ok(reader) => reader,
            Err(e) => {
                log::debug!("Cannot read sort key from {}: {}", path.display(), e);
                return String::new();
            }
        };

        let mut records = reader.byte_records();

        match records.next() {
            Some(Ok(_)) => {}
            _ => return String::new(),
        }

        match records.next() {
            Some(Ok(record)) => record
                .get(0)
                .map(|field| String::from_utf8_lossy(field).into_owned())
                .unwrap_or_default(),
            Some(Err(e)) => {
                log::debug!("Malformed first data row in {}: {}", path.display(), e);
                String::new()
            }
            None => String::new(),
        }
    }

    /// Order `files` ascending by sort key.
    ///
    /// Each key is read once. The sort is stable, so files with equal keys
    /// keep their input order.
    #[must_use]
    pub fn order<P: AsRef<Path>>(&self, files: &[P]) -> Vec<OrderedFile> {
        let mut ordered: Vec<OrderedFile> = files
            .iter()
            .map(|f| {
                let path = f.as_ref();
                OrderedFile {
                    key: self.first_data_key(path),
                    path: path.to_path_buf(),
                }
            })
            .collect();

        ordered.sort_by(|a, b| a.key.cmp(&b.key));
        ordered
    }
}
