//! Parallel candidate evaluation on a bounded Rayon pool.
//!
//! Results come back in job order regardless of completion order, so the
//! thread count never changes a ranking.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, debug_span, info};

use super::cancel::CancellationFlag;
use super::evaluation::{Evaluation, Evaluator, StrategyFactory};
use super::progress::ProgressTracker;
use crate::backtest::CostConfig;
use crate::domain::{Candle, ParameterSet};
use crate::error::{EvaluationError, OptimizerError, Phase};
use crate::observability::record_candidate;

/// Configuration for candidate evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Maximum number of worker threads (0 = Rayon's global pool).
    pub max_threads: usize,

    /// Candidate counts below this run sequentially on the calling thread.
    pub min_parallel_jobs: usize,

    /// Whether to log per-candidate progress at debug level.
    pub track_progress: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_threads: 0,
            min_parallel_jobs: 4,
            track_progress: true,
        }
    }
}

/// Everything an evaluation needs besides the candidate and the segment.
pub struct EvalContext<'a, E: ?Sized> {
    /// Scores candidates.
    pub evaluator: &'a E,
    /// Builds strategies from parameter sets.
    pub factory: &'a dyn StrategyFactory,
    /// Cost model passed through to the backtest.
    pub costs: &'a CostConfig,
    /// Checked before each candidate starts.
    pub cancel: &'a CancellationFlag,
}

/// A candidate scheduled for evaluation.
#[derive(Debug, Clone, Copy)]
pub struct Job<'p> {
    /// Position in grid enumeration order.
    pub grid_index: usize,
    /// Parameters to evaluate.
    pub params: &'p ParameterSet,
}

/// Result of one job.
#[derive(Debug, Clone)]
pub struct JobResult {
    /// Position in grid enumeration order.
    pub grid_index: usize,
    /// Evaluation outcome.
    pub result: Result<Evaluation, EvaluationError>,
}

/// Evaluates batches of candidates, in parallel above a threshold.
#[derive(Debug)]
pub struct SearchExecutor {
    config: SearchConfig,
    pool: Option<rayon::ThreadPool>,
}

impl SearchExecutor {
    /// Create an executor, building a dedicated pool when `max_threads > 0`.
    ///
    /// # Errors
    ///
    /// Returns [`OptimizerError::Configuration`] if the thread pool cannot be built.
    pub fn new(config: SearchConfig) -> Result<Self, OptimizerError> {
        let pool = if config.max_threads > 0 {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(config.max_threads)
                .thread_name(|i| format!("optimizer-{i}"))
                .build()
                .map_err(|e| {
                    OptimizerError::configuration(format!("failed to build thread pool: {e}"))
                })?;
            Some(pool)
        } else {
            None
        };
        Ok(Self { config, pool })
    }

    /// Access the executor configuration.
    #[must_use]
    pub const fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Get effective thread count.
    #[must_use]
    pub fn effective_thread_count(&self) -> usize {
        self.pool
            .as_ref()
            .map_or_else(rayon::current_num_threads, rayon::ThreadPool::current_num_threads)
    }

    /// Evaluate every job on `segment`.
    ///
    /// Failures are returned per job, never raised. Candidates not yet
    /// started when cancellation is observed are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`OptimizerError::Cancelled`] if the flag was set during the batch.
    pub fn run<E: Evaluator + ?Sized>(
        &self,
        ctx: &EvalContext<'_, E>,
        phase: Phase,
        jobs: &[Job<'_>],
        segment: &[Candle],
    ) -> Result<Vec<JobResult>, OptimizerError> {
        let tracker = ProgressTracker::new(jobs.len() as u64);
        let evaluate = |job: &Job<'_>| self.evaluate_one(ctx, phase, job, segment, &tracker);

        let results: Vec<Option<JobResult>> = if jobs.len() >= self.config.min_parallel_jobs {
            debug!(
                %phase,
                jobs = jobs.len(),
                threads = self.effective_thread_count(),
                "Evaluating candidates in parallel"
            );
            self.install(|| jobs.par_iter().map(evaluate).collect())
        } else {
            jobs.iter().map(evaluate).collect()
        };

        let progress = tracker.progress();
        if ctx.cancel.is_cancelled() {
            info!(
                %phase,
                completed = progress.completed,
                total = progress.total,
                "Evaluation cancelled"
            );
            return Err(OptimizerError::Cancelled {
                phase,
                completed: progress.completed as usize,
                total: jobs.len(),
            });
        }

        debug!(
            %phase,
            succeeded = progress.succeeded(),
            failed = progress.failed,
            elapsed_ms = progress.elapsed_ms,
            evals_per_sec = progress.evals_per_sec,
            "Batch complete"
        );

        Ok(results.into_iter().flatten().collect())
    }

    fn install<R: Send>(&self, op: impl FnOnce() -> R + Send) -> R {
        match &self.pool {
            Some(pool) => pool.install(op),
            None => op(),
        }
    }

    fn evaluate_one<E: Evaluator + ?Sized>(
        &self,
        ctx: &EvalContext<'_, E>,
        phase: Phase,
        job: &Job<'_>,
        segment: &[Candle],
        tracker: &ProgressTracker,
    ) -> Option<JobResult> {
        if ctx.cancel.is_cancelled() {
            tracker.skipped();
            record_candidate(phase, "skipped", 0.0);
            return None;
        }

        let _span = debug_span!("candidate", %phase, grid_index = job.grid_index).entered();
        let start = Instant::now();

        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            ctx.evaluator
                .evaluate(ctx.factory, job.params, segment, ctx.costs)
        }))
        .unwrap_or_else(|payload| {
            Err(EvaluationError::Panicked(panic_message(payload.as_ref())))
        });

        let elapsed = start.elapsed().as_secs_f64();
        let success = result.is_ok();
        tracker.completed(success);
        record_candidate(phase, if success { "ok" } else { "failed" }, elapsed);

        match &result {
            Ok(evaluation) => debug!(
                params = %job.params,
                metric = %evaluation.metric,
                "Candidate evaluated"
            ),
            Err(e) => debug!(params = %job.params, error = %e, "Candidate failed"),
        }

        if self.config.track_progress {
            let progress = tracker.progress();
            debug!(
                "Progress: {:.1}% ({}/{}) - ETA: {}s",
                progress.percentage(),
                progress.completed,
                progress.total,
                progress.eta_secs
            );
        }

        Some(JobResult {
            grid_index: job.grid_index,
            result,
        })
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}
