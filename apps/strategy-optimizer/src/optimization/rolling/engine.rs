//! Rolling walk-forward optimizer.
//!
//! Repeats search → (optional nested select) → report independently in
//! every anchored window. Robustness shows in how consistent the test
//! metric is across windows, not in any single window.

use tracing::{info, info_span, warn};

use super::analysis::{aggregate_test_metrics, analyze_parameter_stability, consensus_params};
use super::types::{RollingConfig, RollingOptimizationResult, WindowFailure, WindowResult};
use crate::backtest::CostConfig;
use crate::domain::{Candle, SegmentSummary};
use crate::error::{OptimizerError, Phase};
use crate::observability::{record_run, record_window};
use crate::optimization::cancel::CancellationFlag;
use crate::optimization::evaluation::{Evaluator, StrategyFactory};
use crate::optimization::grid::ParameterGrid;
use crate::optimization::phases;
use crate::optimization::search::{EvalContext, SearchConfig, SearchExecutor};
use crate::optimization::splitter::{DataSplitter, WalkForwardSplit};

/// Rolling-window optimizer.
#[derive(Debug)]
pub struct RollingOptimizer<E> {
    evaluator: E,
    config: RollingConfig,
    splitter: DataSplitter,
    executor: SearchExecutor,
    cancel: CancellationFlag,
}

impl<E: Evaluator> RollingOptimizer<E> {
    /// Create a rolling optimizer.
    ///
    /// # Errors
    ///
    /// Returns [`OptimizerError::Configuration`] for an invalid window
    /// geometry or a thread pool that cannot be built.
    pub fn new(
        evaluator: E,
        config: RollingConfig,
        search: SearchConfig,
    ) -> Result<Self, OptimizerError> {
        config.validate()?;
        let splitter = DataSplitter::new()
            .with_min_segment_len(config.min_segment_len)
            .with_initial_train_frac(config.initial_train_frac);
        Ok(Self {
            evaluator,
            config,
            splitter,
            executor: SearchExecutor::new(search)?,
            cancel: CancellationFlag::new(),
        })
    }

    /// Observe `flag` for cancellation.
    #[must_use]
    pub fn with_cancellation(mut self, flag: CancellationFlag) -> Self {
        self.cancel = flag;
        self
    }

    /// Access the rolling configuration.
    #[must_use]
    pub const fn config(&self) -> &RollingConfig {
        &self.config
    }

    /// Access the evaluator.
    #[must_use]
    pub const fn evaluator(&self) -> &E {
        &self.evaluator
    }

    /// Handle for cancelling a running optimization.
    #[must_use]
    pub fn cancellation_flag(&self) -> CancellationFlag {
        self.cancel.clone()
    }

    /// Optimize independently in every window and aggregate the test metrics.
    ///
    /// A window with no viable candidate (or a failing test evaluation) is
    /// recorded as failed; the run fails only when every window fails.
    ///
    /// # Errors
    ///
    /// - [`OptimizerError::Configuration`] / [`OptimizerError::InsufficientData`] from the split.
    /// - [`OptimizerError::AllWindowsFailed`] when no window succeeds.
    /// - [`OptimizerError::Cancelled`] when the cancellation flag is raised.
    pub fn optimize(
        &self,
        factory: &dyn StrategyFactory,
        grid: &ParameterGrid,
        series: &[Candle],
        costs: &CostConfig,
    ) -> Result<RollingOptimizationResult, OptimizerError> {
        let span = info_span!(
            "rolling",
            strategy = factory.name(),
            metric = self.evaluator.metric_name()
        );
        let _guard = span.enter();

        let result = self.run_windows(factory, grid, series, costs);
        match &result {
            Ok(_) => record_run("rolling", "success"),
            Err(e) => record_run("rolling", e.kind()),
        }
        result
    }

    fn run_windows(
        &self,
        factory: &dyn StrategyFactory,
        grid: &ParameterGrid,
        series: &[Candle],
        costs: &CostConfig,
    ) -> Result<RollingOptimizationResult, OptimizerError> {
        costs.validate()?;

        let splits = info_span!("rolling.split").in_scope(|| {
            self.splitter
                .walk_forward_splits(series, self.config.n_splits, self.config.test_size_frac)
        })?;

        info!(
            bars = series.len(),
            windows = splits.len(),
            candidates = grid.total_combinations(),
            nested_validation = self.config.nested_validation_frac.is_some(),
            "Starting rolling optimization"
        );

        let ctx = EvalContext {
            evaluator: &self.evaluator,
            factory,
            costs,
            cancel: &self.cancel,
        };

        let mut windows = Vec::with_capacity(splits.len());
        let mut failed_windows = Vec::new();

        for split in &splits {
            let span = info_span!("rolling.window", index = split.index);
            let _guard = span.enter();

            match self.run_window(&ctx, grid, split) {
                Ok(window) => {
                    record_window("success");
                    info!(
                        params = %window.best_params,
                        train = %window.train_metric,
                        test = %window.test_metric,
                        "Window complete"
                    );
                    windows.push(window);
                }
                Err(e @ OptimizerError::Cancelled { .. }) => return Err(e),
                Err(e) => {
                    record_window("failed");
                    warn!(error = %e, "Window failed");
                    failed_windows.push(WindowFailure {
                        index: split.index,
                        train: SegmentSummary::new(0, split.train),
                        test: SegmentSummary::new(split.test_range().start, split.test),
                        phase: e.phase(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        if windows.is_empty() {
            let last_error = failed_windows
                .last()
                .map(|f| f.reason.clone())
                .unwrap_or_default();
            return Err(OptimizerError::AllWindowsFailed {
                total: splits.len(),
                last_error,
            });
        }

        let aggregate = aggregate_test_metrics(&windows, splits.len());
        let parameter_stability = analyze_parameter_stability(&windows);
        if let Some(warning) = &parameter_stability.warning {
            warn!("{warning}");
        }

        info!(
            successful = aggregate.successful_windows,
            total = aggregate.total_windows,
            mean = %aggregate.mean,
            consistency = %aggregate.consistency,
            "Rolling optimization complete"
        );

        Ok(RollingOptimizationResult {
            strategy: factory.name().to_string(),
            metric: self.evaluator.metric_name().to_string(),
            consensus_params: consensus_params(&windows),
            windows,
            failed_windows,
            aggregate,
            parameter_stability,
        })
    }

    fn run_window(
        &self,
        ctx: &EvalContext<'_, E>,
        grid: &ParameterGrid,
        split: &WalkForwardSplit<'_, Candle>,
    ) -> Result<WindowResult, OptimizerError> {
        let mut failures = Vec::new();

        let (search_segment, validation_segment) = match self.config.nested_validation_frac {
            Some(frac) => {
                let (inner_train, validation) = self.nested_split(split.train, frac)?;
                (inner_train, Some(validation))
            }
            None => (split.train, None),
        };

        let survivors =
            phases::search(&self.executor, ctx, grid, search_segment, &mut failures)?;
        let survivor_count = survivors.len();

        let (selected, validation_metric) = match validation_segment {
            Some(validation) => {
                let selection =
                    phases::select(&self.executor, ctx, survivors, validation, &mut failures)?;
                (selection.selected, Some(selection.validation_metric))
            }
            None => {
                // Survivors are already in train-ranking order.
                let Some(best) = survivors.into_iter().next() else {
                    return Err(OptimizerError::NoViableCandidate {
                        phase: Phase::Search,
                        failed: failures.len(),
                        total: grid.total_combinations(),
                        search_failed: failures.len(),
                        select_failed: 0,
                    });
                };
                (best, None)
            }
        };

        let test = phases::report(&self.executor, ctx, &selected, split.test)?;

        Ok(WindowResult {
            index: split.index,
            train: SegmentSummary::new(0, split.train),
            test: SegmentSummary::new(split.test_range().start, split.test),
            best_params: selected.params,
            train_metric: selected.train_metric,
            validation_metric,
            test_metric: test.metric,
            test_performance: test.performance,
            survivors: survivor_count,
            failures,
        })
    }

    fn nested_split<'a>(
        &self,
        train: &'a [Candle],
        validation_frac: f64,
    ) -> Result<(&'a [Candle], &'a [Candle]), OptimizerError> {
        let cut = (train.len() as f64 * (1.0 - validation_frac)).floor() as usize;
        let (inner, validation) = train.split_at(cut.min(train.len()));
        let min = self.splitter.min_segment_len();
        for (context, len) in [
            ("nested train segment", inner.len()),
            ("nested validation segment", validation.len()),
        ] {
            if len < min {
                return Err(OptimizerError::insufficient_data(context, min, len));
            }
        }
        Ok((inner, validation))
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::domain::ParameterSet;
    use crate::error::EvaluationError;
    use crate::optimization::testing::{ScriptedEvaluator, UnusedFactory, indexed_candles};

    fn period_grid() -> ParameterGrid {
        let Ok(grid) = ParameterGrid::builder().int("period", [10, 20, 30]).build() else {
            panic!("valid grid");
        };
        grid
    }

    fn rolling<F>(
        evaluator: ScriptedEvaluator<F>,
        config: RollingConfig,
    ) -> RollingOptimizer<ScriptedEvaluator<F>>
    where
        F: Fn(&ParameterSet, usize) -> Result<Decimal, EvaluationError> + Send + Sync,
    {
        let Ok(optimizer) = RollingOptimizer::new(evaluator, config, SearchConfig::default()) else {
            panic!("valid rolling configuration");
        };
        optimizer
    }

    #[test]
    fn test_each_window_reports_once_on_its_test_segment() {
        let optimizer = rolling(
            ScriptedEvaluator::new(|p: &ParameterSet, start| {
                let period = p.int("period")?;
                // Train segments all start at 0; test windows start at 300, 400, ...
                Ok(if start == 0 {
                    Decimal::from(period)
                } else {
                    Decimal::from(start as i64 - 500)
                })
            }),
            RollingConfig::default(),
        );
        let series = indexed_candles(1000);

        let Ok(result) =
            optimizer.optimize(&UnusedFactory, &period_grid(), &series, &CostConfig::default())
        else {
            panic!("rolling optimization should succeed");
        };

        assert_eq!(result.windows.len(), 5);
        assert!(result.failed_windows.is_empty());
        for (i, window) in result.windows.iter().enumerate() {
            let test_start = 300 + i * 100;
            assert_eq!(window.test.start_index, test_start);
            assert_eq!(window.train.bars, test_start);
            assert_eq!(optimizer.evaluator().calls_starting_at(test_start).len(), 1);
            assert_eq!(window.best_params.int("period"), Ok(30));
            assert_eq!(window.validation_metric, None);
        }

        // Test metrics: -200, -100, 0, 100, 200.
        assert_eq!(result.aggregate.mean, Decimal::ZERO);
        assert_eq!(result.aggregate.min, Decimal::from(-200));
        assert_eq!(result.aggregate.max, Decimal::from(200));
        assert_eq!(result.aggregate.positive_windows, 2);
        assert!(result.aggregate.std_dev.is_some());
        assert!(result.parameter_stability.unstable_parameters.is_empty());
        assert_eq!(result.consensus_params.int("period"), Ok(30));
    }

    #[test]
    fn test_failed_windows_are_recorded() {
        let optimizer = rolling(
            ScriptedEvaluator::new(|_: &ParameterSet, start| {
                // Nothing survives search in the first window (train = [0, 300)).
                if start == 0 {
                    return Err(EvaluationError::InsufficientHistory {
                        required: 400,
                        available: 300,
                    });
                }
                Ok(Decimal::ONE)
            }),
            RollingConfig::default(),
        );
        let series = indexed_candles(1000);

        let result =
            optimizer.optimize(&UnusedFactory, &period_grid(), &series, &CostConfig::default());
        let Err(OptimizerError::AllWindowsFailed { total, last_error }) = result else {
            panic!("every window fails search");
        };
        assert_eq!(total, 5);
        assert!(last_error.contains("search phase"));
    }

    #[test]
    fn test_partial_window_failure() {
        let optimizer = rolling(
            ScriptedEvaluator::new(|_: &ParameterSet, start| {
                if start == 500 {
                    return Err(EvaluationError::Numeric("gap".to_string()));
                }
                Ok(Decimal::ONE)
            }),
            RollingConfig::default(),
        );
        let series = indexed_candles(1000);

        let Ok(result) =
            optimizer.optimize(&UnusedFactory, &period_grid(), &series, &CostConfig::default())
        else {
            panic!("four windows still succeed");
        };
        assert_eq!(result.windows.len(), 4);
        assert_eq!(result.failed_windows.len(), 1);
        assert_eq!(result.failed_windows[0].index, 2);
        assert_eq!(result.failed_windows[0].phase, Some(Phase::Report));
        assert_eq!(result.aggregate.total_windows, 5);
        assert_eq!(result.aggregate.successful_windows, 4);
    }

    #[test]
    fn test_nested_validation_selects_on_train_tail() {
        let config = RollingConfig {
            n_splits: 2,
            test_size_frac: 0.2,
            initial_train_frac: 0.5,
            nested_validation_frac: Some(0.25),
            min_segment_len: 10,
        };
        let optimizer = rolling(
            ScriptedEvaluator::new(|p: &ParameterSet, start| {
                let period = p.int("period")?;
                Ok(match start {
                    0 => Decimal::from(period),
                    // Nested validation tails start at 375 and 525.
                    375 | 525 => Decimal::from(100 - period),
                    _ => Decimal::ONE,
                })
            }),
            config,
        );
        let series = indexed_candles(1000);

        let Ok(result) =
            optimizer.optimize(&UnusedFactory, &period_grid(), &series, &CostConfig::default())
        else {
            panic!("nested rolling optimization should succeed");
        };
        assert_eq!(result.windows.len(), 2);
        for window in &result.windows {
            assert_eq!(window.best_params.int("period"), Ok(10));
            assert_eq!(window.validation_metric, Some(Decimal::from(90)));
        }
        assert_eq!(optimizer.evaluator().calls_starting_at(500).len(), 1);
        assert_eq!(optimizer.evaluator().calls_starting_at(700).len(), 1);
    }

    #[test]
    fn test_invalid_geometry_rejected_up_front() {
        let config = RollingConfig {
            n_splits: 10,
            test_size_frac: 0.1,
            ..Default::default()
        };
        let result = RollingOptimizer::new(
            ScriptedEvaluator::new(|_: &ParameterSet, _| Ok(Decimal::ONE)),
            config,
            SearchConfig::default(),
        );
        assert!(matches!(result, Err(OptimizerError::Configuration(_))));
    }

    #[test]
    fn test_short_series_is_insufficient_data() {
        let optimizer = rolling(
            ScriptedEvaluator::new(|_: &ParameterSet, _| Ok(Decimal::ONE)),
            RollingConfig::default(),
        );
        let series = indexed_candles(50);
        let result =
            optimizer.optimize(&UnusedFactory, &period_grid(), &series, &CostConfig::default());
        assert!(matches!(result, Err(OptimizerError::InsufficientData { .. })));
    }
}
