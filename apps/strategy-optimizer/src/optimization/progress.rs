//! Progress tracking for candidate evaluation.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use serde::{Deserialize, Serialize};

/// Progress tracker shared across evaluation threads.
#[derive(Debug)]
pub struct ProgressTracker {
    total: u64,
    completed: AtomicU64,
    failed: AtomicU64,
    skipped: AtomicU64,
    start_time: Instant,
}

impl ProgressTracker {
    /// Create a new progress tracker.
    #[must_use]
    pub fn new(total: u64) -> Self {
        Self {
            total,
            completed: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            skipped: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    /// Mark an evaluation as finished.
    pub fn completed(&self, success: bool) {
        self.completed.fetch_add(1, Ordering::Relaxed);
        if !success {
            self.failed.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Mark a candidate as skipped after cancellation.
    pub fn skipped(&self) {
        self.skipped.fetch_add(1, Ordering::Relaxed);
    }

    /// Get current progress.
    #[must_use]
    pub fn progress(&self) -> Progress {
        let completed = self.completed.load(Ordering::Relaxed);
        let failed = self.failed.load(Ordering::Relaxed);
        let skipped = self.skipped.load(Ordering::Relaxed);
        let elapsed = self.start_time.elapsed();

        let evals_per_sec = if elapsed.as_secs_f64() > 0.0 {
            completed as f64 / elapsed.as_secs_f64()
        } else {
            0.0
        };

        let remaining = self.total.saturating_sub(completed + skipped);
        let eta_secs = if evals_per_sec > 0.0 {
            (remaining as f64 / evals_per_sec) as u64
        } else {
            0
        };

        Progress {
            total: self.total,
            completed,
            failed,
            skipped,
            elapsed_ms: elapsed.as_millis() as u64,
            eta_secs,
            evals_per_sec,
        }
    }
}

/// Progress snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Progress {
    /// Candidates scheduled.
    pub total: u64,
    /// Evaluations finished, successful or not.
    pub completed: u64,
    /// Evaluations that failed.
    pub failed: u64,
    /// Candidates skipped after cancellation.
    pub skipped: u64,
    /// Elapsed time in milliseconds.
    pub elapsed_ms: u64,
    /// Estimated time remaining in seconds.
    pub eta_secs: u64,
    /// Evaluations per second.
    pub evals_per_sec: f64,
}

impl Progress {
    /// Completion percentage.
    #[must_use]
    pub fn percentage(&self) -> f64 {
        if self.total == 0 {
            100.0
        } else {
            (self.completed as f64 / self.total as f64) * 100.0
        }
    }

    /// Evaluations that succeeded.
    #[must_use]
    pub const fn succeeded(&self) -> u64 {
        self.completed - self.failed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_tracker() {
        let tracker = ProgressTracker::new(10);

        tracker.completed(true);
        tracker.completed(true);
        tracker.completed(false);
        tracker.skipped();

        let progress = tracker.progress();
        assert_eq!(progress.total, 10);
        assert_eq!(progress.completed, 3);
        assert_eq!(progress.failed, 1);
        assert_eq!(progress.skipped, 1);
        assert_eq!(progress.succeeded(), 2);
        assert!((progress.percentage() - 30.0).abs() < 0.1);
    }

    #[test]
    fn test_empty_tracker_is_complete() {
        let progress = ProgressTracker::new(0).progress();
        assert!((progress.percentage() - 100.0).abs() < f64::EPSILON);
    }
}
