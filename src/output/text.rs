//! Human-readable report.
//!
//! One line per group, colored with `yansi` (disabled globally by
//! `--no-color`), followed by a one-line summary.

use std::io::{self, Write};

use bytesize::ByteSize;
use yansi::Paint;

use super::json::GroupStatus;
use crate::pipeline::ProcessingResult;

/// Text formatter for batch results.
#[derive(Debug)]
pub struct TextReport<'a> {
    results: &'a [ProcessingResult],
    dry_run: bool,
}

impl<'a> TextReport<'a> {
    #[must_use]
    pub fn new(results: &'a [ProcessingResult], dry_run: bool) -> Self {
        Self { results, dry_run }
    }

    /// Write every group line and the summary.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        for result in self.results {
            self.write_group(writer, result)?;
        }
        self.write_summary(writer)
    }

    fn write_group<W: Write>(&self, writer: &mut W, result: &ProcessingResult) -> io::Result<()> {
        let prefix = result.group.prefix.as_str();
        match (GroupStatus::of(result), &result.error) {
            (GroupStatus::Merged, _) if self.dry_run => {
                writeln!(
                    writer,
                    "{} {}: would merge {} file(s) into {}",
                    "~".cyan(),
                    prefix.bold(),
                    result.merge_order.len(),
                    result.output_file.display()
                )?;
                for path in &result.merge_order {
                    writeln!(writer, "    {}", path.display())?;
                }
            }
            (GroupStatus::Merged, _) => {
                writeln!(
                    writer,
                    "{} {}: merged {} file(s) into {} ({}, {} ms)",
                    "✓".green(),
                    prefix.bold(),
                    result.files_merged,
                    result.output_file.display(),
                    ByteSize::b(result.bytes_written),
                    result.duration.as_millis()
                )?;
                if let (Some(first), Some(last)) =
                    (result.dates_found.first(), result.dates_found.last())
                {
                    writeln!(writer, "    dates: {first} .. {last}")?;
                }
            }
            (GroupStatus::NotFound, _) => {
                writeln!(writer, "{} {}: no files found", "-".yellow(), prefix.bold())?;
            }
            (_, Some(err)) => {
                writeln!(writer, "{} {}: {}", "✗".red(), prefix.bold(), err)?;
            }
            (_, None) => {}
        }
        Ok(())
    }

    fn write_summary<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        let merged = self
            .results
            .iter()
            .filter(|r| GroupStatus::of(r) == GroupStatus::Merged)
            .count();
        let failed = self
            .results
            .iter()
            .filter(|r| matches!(GroupStatus::of(r), GroupStatus::Failed | GroupStatus::Interrupted))
            .count();
        let bytes: u64 = self.results.iter().map(|r| r.bytes_written).sum();

        let verb = if self.dry_run { "ready" } else { "merged" };
        writeln!(
            writer,
            "{}/{} group(s) {verb}, {failed} failed, {} written",
            merged,
            self.results.len(),
            ByteSize::b(bytes)
        )
    }
}
