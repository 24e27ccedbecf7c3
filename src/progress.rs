//! Progress tracking for lookup runs.

use std::sync::atomic::{AtomicU64, Ordering};
use tracing::info;

/// Shared counters updated by workers as tasks finish.
pub struct ProgressTracker {
    total: u64,
    completed: AtomicU64,
    list_total: AtomicU64,
    list_completed: AtomicU64,
}

impl ProgressTracker {
    /// `total` is the number of tasks across every list of the run.
    pub fn new(total: u64) -> Self {
        Self {
            total,
            completed: AtomicU64::new(0),
            list_total: AtomicU64::new(0),
            list_completed: AtomicU64::new(0),
        }
    }

    /// Reset the per-list counters. Lists run one at a time.
    pub fn start_list(&self, list_total: u64) {
        self.list_total.store(list_total, Ordering::Relaxed);
        self.list_completed.store(0, Ordering::Relaxed);
    }

    pub fn complete_task(&self) -> ProgressSnapshot {
        let completed = self.completed.fetch_add(1, Ordering::Relaxed) + 1;
        let list_completed = self.list_completed.fetch_add(1, Ordering::Relaxed) + 1;

        ProgressSnapshot {
            completed,
            total: self.total,
            list_completed,
            list_total: self.list_total.load(Ordering::Relaxed),
        }
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            completed: self.completed.load(Ordering::Relaxed),
            total: self.total,
            list_completed: self.list_completed.load(Ordering::Relaxed),
            list_total: self.list_total.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressSnapshot {
    pub completed: u64,
    pub total: u64,
    pub list_completed: u64,
    pub list_total: u64,
}

/// Receives a snapshot after every finished task. Called from worker threads.
pub trait ProgressObserver: Sync {
    fn task_completed(&self, list: &str, progress: ProgressSnapshot);
}

/// Logs progress at info level.
pub struct LogProgress;

impl ProgressObserver for LogProgress {
    fn task_completed(&self, list: &str, progress: ProgressSnapshot) {
        info!(
            action = "progress",
            component = "scheduler",
            list,
            completed = progress.completed,
            total = progress.total,
            list_completed = progress.list_completed,
            list_total = progress.list_total,
            "{} / {} ({} / {})",
            progress.completed,
            progress.total,
            progress.list_completed,
            progress.list_total
        );
    }
}

pub struct SilentProgress;

impl ProgressObserver for SilentProgress {
    fn task_completed(&self, _list: &str, _progress: ProgressSnapshot) {}
}
