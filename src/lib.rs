//! report-merger - batch merger for dated CSV report exports
//!
//! Report exports land in a work directory as many small files sharing a
//! filename prefix. Each configured group collects the files for one prefix,
//! rejects byte-identical duplicates (BLAKE3), concatenates the data rows in
//! chronological order into a single output file, and removes the sources.

pub mod actions;
pub mod cli;
pub mod config;
pub mod duplicates;
pub mod error;
pub mod logging;
pub mod merge;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod scanner;
pub mod signal;

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context};
use yansi::Paint;

use crate::cli::{Cli, Commands, GroupsArgs, OutputFormat, RunArgs};
use crate::config::{Config, ConfigOverrides};
use crate::error::ExitCode;
use crate::output::{JsonReport, TextReport};
use crate::pipeline::{GroupPipeline, PipelineOptions};
use crate::progress::Progress;
use crate::scanner::{DirLister, FileLister};

/// Run the application for parsed command-line arguments.
///
/// # Errors
///
/// Returns an error for fatal problems: invalid configuration, a missing
/// work directory, or a failure to write the report. Per-group failures are
/// not errors; they are reflected in the returned [`ExitCode`].
pub fn run_app(cli: Cli) -> anyhow::Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet);
    if cli.no_color {
        yansi::disable();
    }

    match &cli.command {
        Commands::Run(args) => run_merge(args, cli.quiet),
        Commands::Groups(args) => list_groups(args),
    }
}

fn load_config(
    config_path: Option<&Path>,
    overrides: &ConfigOverrides,
) -> anyhow::Result<Config> {
    let config = Config::load(config_path, overrides).context("failed to load configuration")?;
    log::debug!(
        "Loaded {} group(s), work directory {}",
        config.groups.len(),
        config.work_dir
    );
    Ok(config)
}

fn resolve_work_dir(config: &Config) -> anyhow::Result<PathBuf> {
    let work_dir = config
        .resolved_work_dir()
        .context("failed to resolve work directory")?;
    if !work_dir.exists() {
        bail!("work directory does not exist: {}", work_dir.display());
    }
    if !work_dir.is_dir() {
        bail!("work directory is not a directory: {}", work_dir.display());
    }
    Ok(work_dir)
}

fn run_merge(args: &RunArgs, quiet: bool) -> anyhow::Result<ExitCode> {
    let config = load_config(args.source.config.as_deref(), &args.to_overrides())?;
    let work_dir = resolve_work_dir(&config)?;
    log::info!(
        "Merging {} group(s) in {}",
        config.groups.len(),
        work_dir.display()
    );

    let handler = signal::install_handler().context("failed to install signal handler")?;
    let show_progress = !quiet && args.output == OutputFormat::Text;

    let pipeline =
        GroupPipeline::from_config(&config).context("failed to resolve work directory")?;
    let options = PipelineOptions {
        dry_run: args.dry_run,
        ..pipeline.options()
    };
    let pipeline = pipeline
        .with_options(options)
        .with_progress_callback(Arc::new(Progress::new(!show_progress)))
        .with_shutdown_flag(handler.get_flag());

    let results = if config.parallel {
        pipeline.process_all_parallel(&config.groups, config.jobs)
    } else {
        pipeline.process_all(&config.groups)
    };

    let exit_code = if handler.is_shutdown_requested() {
        ExitCode::Interrupted
    } else {
        ExitCode::from_results(&results)
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match args.output {
        OutputFormat::Json => JsonReport::new(&results, args.dry_run, exit_code)
            .write_to(&mut out)
            .context("failed to write JSON report")?,
        OutputFormat::Text if !quiet => TextReport::new(&results, args.dry_run)
            .write_to(&mut out)
            .context("failed to write report")?,
        OutputFormat::Text => {}
    }

    Ok(exit_code)
}

fn list_groups(args: &GroupsArgs) -> anyhow::Result<ExitCode> {
    let config = load_config(args.source.config.as_deref(), &args.to_overrides())?;
    let work_dir = resolve_work_dir(&config)?;
    let lister = DirLister::new(&work_dir);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    writeln!(out, "Work directory: {}", work_dir.display())?;
    for group in &config.groups {
        let files = lister
            .list_files(&group.prefix)
            .with_context(|| format!("failed to list files for '{}'", group.prefix))?;
        writeln!(
            out,
            "  {} -> {} ({} file(s))",
            group.prefix.bold(),
            group.output,
            files.len()
        )?;
    }

    Ok(ExitCode::Success)
}
