//! Per-group merge pipeline.
//!
//! # Overview
//!
//! [`GroupPipeline::process`] runs one group through a linear sequence of
//! stages, without retries:
//!
//! 1. **Discover** files whose name starts with the group prefix
//! 2. **DuplicateCheck** the discovered files by content fingerprint
//! 3. **Merge** them chronologically into the group's output file
//! 4. **Cleanup** the merged source files
//!
//! The first failing stage ends the run and is recorded in the
//! [`ProcessingResult`]. A cleanup failure still credits the merge, since
//! the output file already exists.
//!
//! Batches of groups are run by [`GroupPipeline::process_all`] and
//! [`GroupPipeline::process_all_parallel`]; one group's failure never
//! affects another.
//!
//! # Example
//!
//! ```no_run
//! use report_merger::config::{Config, Group};
//! use report_merger::pipeline::GroupPipeline;
//!
//! let config = Config::default();
//! let pipeline = GroupPipeline::from_config(&config).unwrap();
//! let result = pipeline.process(&Group::new("AdManager Reporting", "raw.csv"));
//! if let Some(err) = &result.error {
//!     eprintln!("{}: {}", result.group.prefix, err);
//! }
//! ```

pub mod batch;

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use thiserror::Error;

use crate::actions::{DeleteError, FileDeleter, FsDeleter};
use crate::config::{Config, ConfigError, Group};
use crate::duplicates::DuplicateChecker;
use crate::merge::{DateOrderer, MergeEngine, MergeError};
use crate::progress::ProgressCallback;
use crate::scanner::{DirLister, FileLister, HashError, ListError};

/// Stages of the per-group pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Discover,
    DuplicateCheck,
    Merge,
    Cleanup,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Discover => write!(f, "discovering files"),
            Self::DuplicateCheck => write!(f, "checking for duplicates"),
            Self::Merge => write!(f, "merging"),
            Self::Cleanup => write!(f, "removing sources"),
        }
    }
}

/// Coarse classification of a group failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// A file could not be listed, read, written or removed.
    Io,
    /// The merge was asked to run without input.
    InvalidInput,
    /// Two inputs were byte-identical.
    DuplicateContent,
    /// No inputs were found.
    NotFound,
    /// The batch was stopped before this group ran.
    Interrupted,
}

/// Why a group did not complete.
#[derive(Debug, Error)]
pub enum GroupError {
    /// No file matched the prefix.
    #[error("no files found for pattern: {prefix}")]
    NotFound { prefix: String },

    /// The work directory could not be listed.
    #[error("failed to find files: {0}")]
    Discovery(#[source] ListError),

    /// A file could not be read while fingerprinting.
    #[error("failed to check duplicates: {0}")]
    DuplicateCheck(#[source] HashError),

    /// Two inputs have identical content.
    #[error(
        "duplicate file content found in group: {prefix} ({} and {})",
        .original.display(),
        .duplicate.display()
    )]
    DuplicateContent {
        prefix: String,
        original: PathBuf,
        duplicate: PathBuf,
    },

    /// The merge failed.
    #[error("failed to merge files: {0}")]
    Merge(#[source] MergeError),

    /// The merge succeeded but removing the sources failed.
    #[error("failed to delete source files: {0}")]
    Cleanup(#[source] DeleteError),

    /// The batch was interrupted before this group started.
    #[error("interrupted before processing")]
    Interrupted,
}

impl GroupError {
    /// Classify this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::DuplicateContent { .. } => ErrorKind::DuplicateContent,
            Self::Merge(MergeError::NoInput) => ErrorKind::InvalidInput,
            Self::Discovery(_) | Self::DuplicateCheck(_) | Self::Merge(_) | Self::Cleanup(_) => {
                ErrorKind::Io
            }
            Self::Interrupted => ErrorKind::Interrupted,
        }
    }

    /// Stage at which the error occurred, if any.
    #[must_use]
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Self::NotFound { .. } | Self::Discovery(_) => Some(Stage::Discover),
            Self::DuplicateCheck(_) | Self::DuplicateContent { .. } => Some(Stage::DuplicateCheck),
            Self::Merge(_) => Some(Stage::Merge),
            Self::Cleanup(_) => Some(Stage::Cleanup),
            Self::Interrupted => None,
        }
    }
}

/// Outcome of processing one group.
#[derive(Debug)]
pub struct ProcessingResult {
    /// The group that was processed.
    pub group: Group,
    /// Number of files discovered for the prefix.
    pub files_found: usize,
    /// Number of files merged into the output (0 unless the merge ran).
    pub files_merged: usize,
    /// Boundary key of each merged file, in merge order.
    pub dates_found: Vec<String>,
    /// Input files in merge order (the planned order on a dry run).
    pub merge_order: Vec<PathBuf>,
    /// Path of the group's output file.
    pub output_file: PathBuf,
    /// Bytes written to the output file.
    pub bytes_written: u64,
    /// Time from pipeline start to the point the result was produced.
    pub duration: Duration,
    /// The error that ended processing, if any.
    pub error: Option<GroupError>,
}

impl ProcessingResult {
    fn new(group: &Group, output_file: PathBuf) -> Self {
        Self {
            group: group.clone(),
            files_found: 0,
            files_merged: 0,
            dates_found: Vec::new(),
            merge_order: Vec::new(),
            output_file,
            bytes_written: 0,
            duration: Duration::ZERO,
            error: None,
        }
    }

    /// Whether the group completed without error.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    pub(crate) fn interrupted(group: &Group, work_dir: &Path) -> Self {
        let mut result = Self::new(group, work_dir.join(&group.output));
        result.error = Some(GroupError::Interrupted);
        result
    }
}

/// Switches that change what the pipeline does after discovery.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineOptions {
    /// Stop after the duplicate check and report the planned merge order.
    pub dry_run: bool,
    /// Skip the cleanup stage.
    pub keep_sources: bool,
}

/// Runs groups through discover, duplicate check, merge and cleanup.
pub struct GroupPipeline {
    work_dir: PathBuf,
    lister: Arc<dyn FileLister>,
    deleter: Arc<dyn FileDeleter>,
    checker: DuplicateChecker,
    engine: MergeEngine,
    options: PipelineOptions,
    progress_callback: Option<Arc<dyn ProgressCallback>>,
    shutdown_flag: Option<Arc<AtomicBool>>,
}

impl fmt::Debug for GroupPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GroupPipeline")
            .field("work_dir", &self.work_dir)
            .field("options", &self.options)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .field("shutdown_flag", &self.shutdown_flag)
            .finish_non_exhaustive()
    }
}

impl GroupPipeline {
    /// Create a pipeline over explicit collaborators.
    ///
    /// Output files are written to `work_dir`.
    #[must_use]
    pub fn new(
        work_dir: impl Into<PathBuf>,
        lister: Arc<dyn FileLister>,
        deleter: Arc<dyn FileDeleter>,
    ) -> Self {
        Self {
            work_dir: work_dir.into(),
            lister,
            deleter,
            checker: DuplicateChecker::new(),
            engine: MergeEngine::new(),
            options: PipelineOptions::default(),
            progress_callback: None,
            shutdown_flag: None,
        }
    }

    /// Create a filesystem-backed pipeline from configuration.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the work directory cannot be resolved.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let work_dir = config.resolved_work_dir()?;
        let deleter = if config.use_trash {
            FsDeleter::trash()
        } else {
            FsDeleter::permanent()
        };

        Ok(Self::new(
            work_dir.clone(),
            Arc::new(DirLister::new(work_dir)),
            Arc::new(deleter),
        )
        .with_options(PipelineOptions {
            dry_run: false,
            keep_sources: config.keep_sources,
        }))
    }

    /// Set pipeline options.
    #[must_use]
    pub fn with_options(mut self, options: PipelineOptions) -> Self {
        self.options = options;
        self
    }

    /// Set the progress callback.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// Set the shutdown flag checked between groups.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Directory discovery, output and cleanup happen in.
    #[must_use]
    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    /// Current options.
    #[must_use]
    pub fn options(&self) -> PipelineOptions {
        self.options
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    fn notify_stage(&self, group: &Group, stage: Stage) {
        log::debug!("[{}] {}", group.prefix, stage);
        if let Some(ref callback) = self.progress_callback {
            callback.on_stage(group, stage);
        }
    }

    /// Process one group.
    ///
    /// Never fails: every problem is recorded in the returned result.
    #[must_use]
    pub fn process(&self, group: &Group) -> ProcessingResult {
        if let Some(ref callback) = self.progress_callback {
            callback.on_group_start(group);
        }

        let start = Instant::now();
        let mut result = ProcessingResult::new(group, self.work_dir.join(&group.output));

        if let Err(err) = self.run_stages(group, &mut result) {
            result.error = Some(err);
        }
        result.duration = start.elapsed();

        match &result.error {
            None => log::info!(
                "Merged group: {} -> {} ({} file(s))",
                group.prefix,
                group.output,
                result.files_merged
            ),
            Some(err @ GroupError::NotFound { .. }) => log::info!("{err}"),
            Some(err) => log::error!("Group {} failed: {}", group.prefix, err),
        }

        if let Some(ref callback) = self.progress_callback {
            callback.on_group_end(&result);
        }
        result
    }

    fn run_stages(&self, group: &Group, result: &mut ProcessingResult) -> Result<(), GroupError> {
        self.notify_stage(group, Stage::Discover);
        let files = self
            .lister
            .list_files(&group.prefix)
            .map_err(GroupError::Discovery)?;
        result.files_found = files.len();
        if files.is_empty() {
            return Err(GroupError::NotFound {
                prefix: group.prefix.clone(),
            });
        }

        self.notify_stage(group, Stage::DuplicateCheck);
        if let Some(pair) = self
            .checker
            .find_first_duplicate(&files)
            .map_err(GroupError::DuplicateCheck)?
        {
            return Err(GroupError::DuplicateContent {
                prefix: group.prefix.clone(),
                original: pair.original,
                duplicate: pair.duplicate,
            });
        }

        if self.options.dry_run {
            result.merge_order = DateOrderer::new()
                .order(&files)
                .into_iter()
                .map(|o| o.path)
                .collect();
            log::info!(
                "Dry run: would merge {} file(s) into {}",
                files.len(),
                result.output_file.display()
            );
            return Ok(());
        }

        self.notify_stage(group, Stage::Merge);
        let outcome = self
            .engine
            .merge(&files, &result.output_file)
            .map_err(GroupError::Merge)?;
        result.files_merged = files.len();
        result.dates_found = outcome.boundary_keys;
        result.merge_order = outcome.merged_order;
        result.bytes_written = outcome.bytes_written;
        for date in &result.dates_found {
            log::debug!("[{}] boundary {}", group.prefix, date);
        }

        if self.options.keep_sources {
            log::debug!("[{}] keeping {} source file(s)", group.prefix, files.len());
            return Ok(());
        }

        self.notify_stage(group, Stage::Cleanup);
        self.deleter
            .delete_files(&files)
            .map_err(GroupError::Cleanup)?;

        Ok(())
    }
}
