//! Three-way walk-forward optimizer.
//!
//! Split → Search → Select → Report, never looping back. The test segment
//! is evaluated exactly once, for the selected parameters only.

use tracing::{info, info_span};

use super::builder::WalkForwardBuilder;
use super::types::{OptimizationResult, OverfittingCheck, WalkForwardConfig};
use crate::backtest::CostConfig;
use crate::domain::Candle;
use crate::error::OptimizerError;
use crate::observability::{record_run, record_test_metric};
use crate::optimization::cancel::CancellationFlag;
use crate::optimization::evaluation::{Evaluator, StrategyFactory};
use crate::optimization::grid::ParameterGrid;
use crate::optimization::phases;
use crate::optimization::search::{EvalContext, SearchExecutor};
use crate::optimization::splitter::DataSplitter;

/// Walk-forward optimizer over a train/validation/test split.
#[derive(Debug)]
pub struct WalkForwardOptimizer<E> {
    evaluator: E,
    config: WalkForwardConfig,
    splitter: DataSplitter,
    executor: SearchExecutor,
    cancel: CancellationFlag,
}

impl<E: Evaluator> WalkForwardOptimizer<E> {
    /// Create an optimizer.
    ///
    /// # Errors
    ///
    /// Returns [`OptimizerError::Configuration`] for invalid split fractions
    /// or a thread pool that cannot be built.
    pub fn new(evaluator: E, config: WalkForwardConfig) -> Result<Self, OptimizerError> {
        Self::with_cancellation(evaluator, config, CancellationFlag::new())
    }

    /// Create an optimizer observing `cancel`.
    ///
    /// # Errors
    ///
    /// Same as [`new`](Self::new).
    pub fn with_cancellation(
        evaluator: E,
        config: WalkForwardConfig,
        cancel: CancellationFlag,
    ) -> Result<Self, OptimizerError> {
        config.split.validate()?;
        let splitter = DataSplitter::new().with_min_segment_len(config.split.min_segment_len);
        let executor = SearchExecutor::new(config.search.clone())?;
        Ok(Self {
            evaluator,
            config,
            splitter,
            executor,
            cancel,
        })
    }

    /// Create a new builder.
    #[must_use]
    pub fn builder(evaluator: E) -> WalkForwardBuilder<E> {
        WalkForwardBuilder::new(evaluator)
    }

    /// Access the optimizer configuration.
    #[must_use]
    pub const fn config(&self) -> &WalkForwardConfig {
        &self.config
    }

    /// Access the evaluator.
    #[must_use]
    pub const fn evaluator(&self) -> &E {
        &self.evaluator
    }

    /// Handle for cancelling a running optimization from another thread.
    #[must_use]
    pub fn cancellation_flag(&self) -> CancellationFlag {
        self.cancel.clone()
    }

    /// Run a complete optimization.
    ///
    /// # Errors
    ///
    /// - [`OptimizerError::Configuration`] / [`OptimizerError::InsufficientData`] from the split.
    /// - [`OptimizerError::NoViableCandidate`] when every candidate fails search or selection.
    /// - [`OptimizerError::ReportFailed`] when the selected set fails on the test segment.
    /// - [`OptimizerError::Cancelled`] when the cancellation flag is raised.
    pub fn optimize(
        &self,
        factory: &dyn StrategyFactory,
        grid: &ParameterGrid,
        series: &[Candle],
        costs: &CostConfig,
    ) -> Result<OptimizationResult, OptimizerError> {
        let span = info_span!(
            "optimize",
            strategy = factory.name(),
            metric = self.evaluator.metric_name()
        );
        let _guard = span.enter();

        let result = self.run_phases(factory, grid, series, costs);
        match &result {
            Ok(r) => {
                record_run("walk_forward", "success");
                record_test_metric(&r.metric, r.test_metric);
            }
            Err(e) => record_run("walk_forward", e.kind()),
        }
        result
    }

    fn run_phases(
        &self,
        factory: &dyn StrategyFactory,
        grid: &ParameterGrid,
        series: &[Candle],
        costs: &CostConfig,
    ) -> Result<OptimizationResult, OptimizerError> {
        costs.validate()?;

        let split = info_span!("optimize.split").in_scope(|| {
            self.splitter.split(
                series,
                self.config.split.train_frac,
                self.config.split.validation_frac,
            )
        })?;

        info!(
            bars = series.len(),
            train = split.train.len(),
            validation = split.validation.len(),
            test = split.test.len(),
            candidates = grid.total_combinations(),
            "Starting walk-forward optimization"
        );

        let ctx = EvalContext {
            evaluator: &self.evaluator,
            factory,
            costs,
            cancel: &self.cancel,
        };
        let mut failures = Vec::new();

        let survivors = info_span!("optimize.search").in_scope(|| {
            phases::search(&self.executor, &ctx, grid, split.train, &mut failures)
        })?;

        let selection = info_span!("optimize.select").in_scope(|| {
            phases::select(&self.executor, &ctx, survivors, split.validation, &mut failures)
        })?;

        let test = info_span!("optimize.report").in_scope(|| {
            phases::report(&self.executor, &ctx, &selection.selected, split.test)
        })?;

        let selected = selection.selected;
        let overfitting =
            OverfittingCheck::new(selected.train_metric, selection.validation_metric, test.metric);

        info!(
            params = %selected.params,
            train = %selected.train_metric,
            validation = %selection.validation_metric,
            test = %test.metric,
            status = ?overfitting.status,
            "Walk-forward optimization complete"
        );

        Ok(OptimizationResult {
            strategy: factory.name().to_string(),
            metric: self.evaluator.metric_name().to_string(),
            best_params: selected.params,
            train_metric: selected.train_metric,
            validation_metric: selection.validation_metric,
            test_metric: test.metric,
            test_performance: test.performance,
            ranking: phases::ranking(selection.survivors),
            failures,
            candidates_total: grid.total_combinations(),
            split: split.summary(),
            overfitting,
        })
    }
}
