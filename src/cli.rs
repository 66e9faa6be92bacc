//! Command-line interface definitions.
//!
//! Global options (verbosity, color, error format) come first, followed by a
//! subcommand.
//!
//! # Example
//!
//! ```bash
//! # Merge the configured groups in ~/Downloads
//! report-merger run
//!
//! # Merge a single ad-hoc group somewhere else, keeping the exports
//! report-merger run --work-dir ./exports --group "Daily Sales=sales.csv" --keep-sources
//!
//! # Show what would be merged
//! report-merger -v run --dry-run --output json
//!
//! # List configured groups and how many exports match each
//! report-merger groups
//! ```

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::config::{ConfigOverrides, Group};

/// Merge batches of dated CSV report exports into one file per report.
///
/// Files in the work directory are grouped by filename prefix, checked for
/// byte-identical duplicates, concatenated in chronological order without
/// their header lines, and then removed.
#[derive(Debug, Parser)]
#[command(name = "report-merger")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(
        long,
        global = true,
        env = "NO_COLOR",
        value_parser = clap::builder::FalseyValueParser::new()
    )]
    pub no_color: bool,

    /// Report fatal errors as JSON on stderr
    #[arg(long, global = true)]
    pub json_errors: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Merge every configured group
    Run(RunArgs),
    /// List configured groups and the files matching each
    Groups(GroupsArgs),
}

/// Options selecting the configuration and work directory.
#[derive(Debug, Clone, Default, Args)]
pub struct ConfigArgs {
    /// Path to a TOML configuration file
    ///
    /// If not specified, the platform config directory is searched.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Directory containing the report exports (default: ~/Downloads)
    #[arg(short = 'd', long, value_name = "DIR")]
    pub work_dir: Option<String>,
}

/// Arguments for the run subcommand.
#[derive(Debug, Args)]
pub struct RunArgs {
    #[command(flatten)]
    pub source: ConfigArgs,

    /// Group to merge as PREFIX=OUTPUT (can be specified multiple times)
    ///
    /// Replaces the configured group list.
    #[arg(short, long = "group", value_name = "PREFIX=OUTPUT", value_parser = parse_group)]
    pub groups: Vec<Group>,

    /// Check and order files without writing output or deleting anything
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Leave source files in place after merging
    #[arg(short, long)]
    pub keep_sources: bool,

    /// Move merged sources to the system trash instead of deleting them
    #[arg(long)]
    pub trash: bool,

    /// Process groups concurrently
    #[arg(short, long)]
    pub parallel: bool,

    /// Worker threads for --parallel (0 = one per CPU)
    #[arg(short, long, value_name = "N")]
    pub jobs: Option<usize>,

    /// Report format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,
}

impl RunArgs {
    /// Configuration overrides carried by these arguments.
    ///
    /// Switches that are off leave the lower configuration layers alone.
    #[must_use]
    pub fn to_overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            groups: (!self.groups.is_empty()).then(|| self.groups.clone()),
            work_dir: self.source.work_dir.clone(),
            use_trash: self.trash.then_some(true),
            keep_sources: self.keep_sources.then_some(true),
            parallel: self.parallel.then_some(true),
            jobs: self.jobs,
        }
    }
}

/// Arguments for the groups subcommand.
#[derive(Debug, Args)]
pub struct GroupsArgs {
    #[command(flatten)]
    pub source: ConfigArgs,
}

impl GroupsArgs {
    /// Configuration overrides carried by these arguments.
    #[must_use]
    pub fn to_overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            work_dir: self.source.work_dir.clone(),
            ..ConfigOverrides::default()
        }
    }
}

/// Report format options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable summary
    #[default]
    Text,
    /// JSON for scripting
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// Parse a `PREFIX=OUTPUT` group definition.
///
/// The split happens at the last `=`, so prefixes may contain `=`.
///
/// # Examples
///
/// ```
/// use report_merger::cli::parse_group;
///
/// let group = parse_group("AdManager Reporting=raw.csv").unwrap();
/// assert_eq!(group.prefix, "AdManager Reporting");
/// assert_eq!(group.output, "raw.csv");
/// ```
///
/// # Errors
///
/// Returns an error if there is no `=` or either side is empty.
pub fn parse_group(s: &str) -> Result<Group, String> {
    let (prefix, output) = s
        .rsplit_once('=')
        .ok_or_else(|| format!("Expected PREFIX=OUTPUT, got '{s}'"))?;
    let output = output.trim();
    if prefix.is_empty() {
        return Err("Group prefix cannot be empty".to_string());
    }
    if output.is_empty() {
        return Err("Group output cannot be empty".to_string());
    }
    Ok(Group::new(prefix, output))
}
