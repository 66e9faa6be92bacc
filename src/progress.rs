//! Progress reporting utilities using indicatif.
//!
//! [`Progress`] implements [`ProgressCallback`] with one overall bar for the
//! batch plus a spinner per running group. Groups may run concurrently, so
//! spinners are tracked by prefix.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};

use crate::config::Group;
use crate::pipeline::{ProcessingResult, Stage};

/// Progress callback for batch and per-group events.
///
/// Implement this trait to receive updates while groups are processed.
/// Callbacks may be invoked from several worker threads at once.
pub trait ProgressCallback: Send + Sync {
    /// Called once before any group runs.
    ///
    /// # Arguments
    ///
    /// * `total` - Number of groups in the batch
    fn on_batch_start(&self, _total: usize) {}

    /// Called when a group starts processing.
    fn on_group_start(&self, group: &Group);

    /// Called when a group enters a new stage.
    fn on_stage(&self, group: &Group, stage: Stage);

    /// Called when a group has finished, successfully or not.
    fn on_group_end(&self, result: &ProcessingResult);

    /// Called once after every group has finished.
    fn on_batch_end(&self) {}
}

/// Progress reporter using indicatif.
pub struct Progress {
    multi: MultiProgress,
    overall: Mutex<Option<ProgressBar>>,
    groups: Mutex<HashMap<String, ProgressBar>>,
    quiet: bool,
}

impl Progress {
    /// Create a new progress reporter.
    ///
    /// # Arguments
    ///
    /// * `quiet` - If true, nothing is drawn.
    ///
    /// # Examples
    ///
    /// ```
    /// use report_merger::progress::Progress;
    ///
    /// let progress = Progress::new(true);
    /// ```
    #[must_use]
    pub fn new(quiet: bool) -> Self {
        let multi = if quiet {
            MultiProgress::with_draw_target(ProgressDrawTarget::hidden())
        } else {
            MultiProgress::new()
        };
        Self {
            multi,
            overall: Mutex::new(None),
            groups: Mutex::new(HashMap::new()),
            quiet,
        }
    }

    fn overall_style() -> ProgressStyle {
        ProgressStyle::with_template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} groups")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█>-")
    }

    fn group_style() -> ProgressStyle {
        ProgressStyle::with_template("{spinner:.green} {prefix}: {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
    }
}

impl ProgressCallback for Progress {
    fn on_batch_start(&self, total: usize) {
        if self.quiet {
            return;
        }
        let pb = self.multi.add(ProgressBar::new(total as u64));
        pb.set_style(Self::overall_style());
        if let Ok(mut overall) = self.overall.lock() {
            *overall = Some(pb);
        }
    }

    fn on_group_start(&self, group: &Group) {
        if self.quiet {
            return;
        }
        let pb = self.multi.add(ProgressBar::new_spinner());
        pb.set_style(Self::group_style());
        pb.set_prefix(truncate(&group.prefix, 30));
        pb.set_message("starting");
        pb.enable_steady_tick(Duration::from_millis(100));
        if let Ok(mut groups) = self.groups.lock() {
            groups.insert(group.prefix.clone(), pb);
        }
    }

    fn on_stage(&self, group: &Group, stage: Stage) {
        if let Ok(groups) = self.groups.lock() {
            if let Some(pb) = groups.get(&group.prefix) {
                pb.set_message(stage.to_string());
            }
        }
    }

    fn on_group_end(&self, result: &ProcessingResult) {
        let pb = self
            .groups
            .lock()
            .ok()
            .and_then(|mut groups| groups.remove(&result.group.prefix));
        if let Some(pb) = pb {
            let message = match &result.error {
                None => format!("merged {} file(s)", result.files_merged),
                Some(err) => truncate(&err.to_string(), 60),
            };
            pb.finish_with_message(message);
        }
        if let Ok(overall) = self.overall.lock() {
            if let Some(ref pb) = *overall {
                pb.inc(1);
            }
        }
    }

    fn on_batch_end(&self) {
        if let Some(pb) = self.overall.lock().ok().and_then(|mut o| o.take()) {
            pb.finish_and_clear();
        }
    }
}

/// Shorten `text` to at most `max_len` characters, marking the cut with `...`.
fn truncate(text: &str, max_len: usize) -> String {
    if text.chars().count() <= max_len {
        return text.to_string();
    }
    let keep = max_len.saturating_sub(3);
    let head: String = text.chars().take(keep).collect();
    format!("{head}...")
}
