//! Builder pattern for walk-forward optimizer configuration.

use super::engine::WalkForwardOptimizer;
use super::types::WalkForwardConfig;
use crate::error::OptimizerError;
use crate::optimization::cancel::CancellationFlag;
use crate::optimization::evaluation::Evaluator;

/// Builder for [`WalkForwardOptimizer`].
#[derive(Debug)]
pub struct WalkForwardBuilder<E> {
    evaluator: E,
    config: WalkForwardConfig,
    cancel: CancellationFlag,
}

impl<E: Evaluator> WalkForwardBuilder<E> {
    /// Create a new builder with default configuration.
    #[must_use]
    pub fn new(evaluator: E) -> Self {
        Self {
            evaluator,
            config: WalkForwardConfig::default(),
            cancel: CancellationFlag::new(),
        }
    }

    /// Replace the whole configuration.
    #[must_use]
    pub fn config(mut self, config: WalkForwardConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the train fraction.
    #[must_use]
    pub const fn train_frac(mut self, frac: f64) -> Self {
        self.config.split.train_frac = frac;
        self
    }

    /// Set the validation fraction.
    #[must_use]
    pub const fn validation_frac(mut self, frac: f64) -> Self {
        self.config.split.validation_frac = frac;
        self
    }

    /// Set the minimum bars per segment.
    #[must_use]
    pub const fn min_segment_len(mut self, bars: usize) -> Self {
        self.config.split.min_segment_len = bars;
        self
    }

    /// Set the worker thread bound (0 = Rayon default).
    #[must_use]
    pub const fn max_threads(mut self, threads: usize) -> Self {
        self.config.search.max_threads = threads;
        self
    }

    /// Set the parallelization threshold.
    #[must_use]
    pub const fn min_parallel_jobs(mut self, jobs: usize) -> Self {
        self.config.search.min_parallel_jobs = jobs;
        self
    }

    /// Share a cancellation flag with the caller.
    #[must_use]
    pub fn cancellation(mut self, flag: CancellationFlag) -> Self {
        self.cancel = flag;
        self
    }

    /// Build the optimizer.
    ///
    /// # Errors
    ///
    /// Returns [`OptimizerError::Configuration`] for invalid fractions or a
    /// thread pool that cannot be built.
    pub fn build(self) -> Result<WalkForwardOptimizer<E>, OptimizerError> {
        WalkForwardOptimizer::with_cancellation(self.evaluator, self.config, self.cancel)
    }
}
