//! Running many groups.
//!
//! Groups are independent: each gets its own [`ProcessingResult`] and a
//! failure in one never stops the others. Results always come back in the
//! order the groups were given, in both sequential and parallel mode.
//!
//! Parallel mode assumes groups have disjoint prefixes and outputs (which
//! [`Config::validate`](crate::config::Config::validate) enforces), so no
//! locking is needed beyond what the filesystem provides.
//!
//! If the shutdown flag is raised, groups that have not started yet are
//! reported as [`GroupError::Interrupted`](super::GroupError::Interrupted).
//! A group that is already running is allowed to finish.

use rayon::prelude::*;

use super::{GroupPipeline, ProcessingResult};
use crate::config::Group;

impl GroupPipeline {
    /// Process `groups` one after another.
    #[must_use]
    pub fn process_all(&self, groups: &[Group]) -> Vec<ProcessingResult> {
        self.batch_started(groups.len());

        let results = groups
            .iter()
            .map(|group| self.process_unless_interrupted(group))
            .collect();

        self.batch_finished();
        results
    }

    /// Process `groups` concurrently on up to `threads` workers
    /// (0 = one per CPU).
    ///
    /// Falls back to sequential processing if the worker pool cannot be
    /// created.
    #[must_use]
    pub fn process_all_parallel(&self, groups: &[Group], threads: usize) -> Vec<ProcessingResult> {
        let pool = match rayon::ThreadPoolBuilder::new().num_threads(threads).build() {
            Ok(pool) => pool,
            Err(e) => {
                log::warn!("Failed to create worker pool ({e}), processing groups sequentially");
                return self.process_all(groups);
            }
        };

        log::debug!(
            "Processing {} group(s) on {} worker(s)",
            groups.len(),
            pool.current_num_threads()
        );
        self.batch_started(groups.len());

        let results = pool.install(|| {
            groups
                .par_iter()
                .map(|group| self.process_unless_interrupted(group))
                .collect()
        });

        self.batch_finished();
        results
    }

    fn process_unless_interrupted(&self, group: &Group) -> ProcessingResult {
        if self.is_shutdown_requested() {
            log::debug!("Shutdown requested, skipping group {}", group.prefix);
            let result = ProcessingResult::interrupted(group, self.work_dir());
            // Skipped groups still count towards the overall progress.
            if let Some(ref callback) = self.progress_callback {
                callback.on_group_end(&result);
            }
            return result;
        }
        self.process(group)
    }

    fn batch_started(&self, total: usize) {
        log::debug!("Starting batch of {total} group(s)");
        if let Some(ref callback) = self.progress_callback {
            callback.on_batch_start(total);
        }
    }

    fn batch_finished(&self) {
        if let Some(ref callback) = self.progress_callback {
            callback.on_batch_end();
        }
    }
}
