//! Run Optimization Use Case

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, info_span};

use crate::application::ports::{PriceDataError, PriceDataPort};
use crate::config::Config;
use crate::domain::Timeframe;
use crate::error::OptimizerError;
use crate::optimization::{
    BacktestEvaluator, CancellationFlag, MetricKind, OptimizationResult, RollingOptimizationResult,
    RollingOptimizer, WalkForwardConfig, WalkForwardOptimizer,
};
use crate::strategies::StrategyRegistry;

/// Which optimizer to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimizationMode {
    /// Single train / validation / test split.
    #[default]
    WalkForward,
    /// Anchored rolling windows.
    Rolling,
}

/// Command: optimize one strategy on one market.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptimizeRequest {
    /// Registered strategy name.
    pub strategy: String,
    /// Market symbol (e.g. "BTC/USDT").
    pub symbol: String,
    /// Bar timeframe.
    pub timeframe: Timeframe,
    /// Most recent bars to use (0 = all available).
    pub lookback_bars: usize,
    /// Metric to optimize.
    #[serde(default)]
    pub metric: MetricKind,
    /// Optimizer to run.
    #[serde(default)]
    pub mode: OptimizationMode,
}

impl OptimizeRequest {
    /// Walk-forward request optimizing the Sharpe ratio.
    pub fn new(
        strategy: impl Into<String>,
        symbol: impl Into<String>,
        timeframe: Timeframe,
        lookback_bars: usize,
    ) -> Self {
        Self {
            strategy: strategy.into(),
            symbol: symbol.into(),
            timeframe,
            lookback_bars,
            metric: MetricKind::default(),
            mode: OptimizationMode::default(),
        }
    }

    /// Optimize `metric` instead.
    #[must_use]
    pub const fn with_metric(mut self, metric: MetricKind) -> Self {
        self.metric = metric;
        self
    }

    /// Run `mode` instead.
    #[must_use]
    pub const fn with_mode(mut self, mode: OptimizationMode) -> Self {
        self.mode = mode;
        self
    }
}

/// Result of either optimizer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum OptimizationReport {
    /// Three-way walk-forward result.
    WalkForward(OptimizationResult),
    /// Rolling result.
    Rolling(RollingOptimizationResult),
}

/// Use case error: either the data could not be loaded or the run failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UseCaseError {
    /// Price data could not be loaded.
    #[error(transparent)]
    Data(#[from] PriceDataError),

    /// The optimizer failed.
    #[error(transparent)]
    Optimizer(#[from] OptimizerError),
}

/// Use case for running one optimization end to end.
pub struct RunOptimizationUseCase<P>
where
    P: PriceDataPort,
{
    price_data: Arc<P>,
    registry: StrategyRegistry,
    config: Config,
    cancel: CancellationFlag,
}

impl<P> RunOptimizationUseCase<P>
where
    P: PriceDataPort,
{
    /// Create a new RunOptimizationUseCase with the bundled strategies.
    pub fn new(price_data: Arc<P>, config: Config) -> Self {
        Self {
            price_data,
            registry: StrategyRegistry::with_defaults(),
            config,
            cancel: CancellationFlag::new(),
        }
    }

    /// Resolve strategies from `registry` instead.
    #[must_use]
    pub fn with_registry(mut self, registry: StrategyRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Observe `flag` for cancellation.
    #[must_use]
    pub fn with_cancellation(mut self, flag: CancellationFlag) -> Self {
        self.cancel = flag;
        self
    }

    /// Strategy registry in use.
    #[must_use]
    pub const fn registry(&self) -> &StrategyRegistry {
        &self.registry
    }

    /// Execute the use case.
    ///
    /// # Errors
    ///
    /// Returns [`UseCaseError::Data`] when the series cannot be loaded and
    /// [`UseCaseError::Optimizer`] for an unknown strategy, a missing grid
    /// or any fatal optimizer error.
    pub fn execute(&self, request: &OptimizeRequest) -> Result<OptimizationReport, UseCaseError> {
        let span = info_span!(
            "run_optimization",
            strategy = %request.strategy,
            symbol = %request.symbol,
            timeframe = %request.timeframe
        );
        let _guard = span.enter();

        // 1. Resolve strategy and grid before touching data
        let factory = self.registry.get(&request.strategy)?;
        let grid = self.config.grid_for(&request.strategy)?;

        // 2. Load price data
        let series =
            self.price_data
                .fetch(&request.symbol, request.timeframe, request.lookback_bars)?;
        info!(
            bars = series.len(),
            candidates = grid.total_combinations(),
            metric = %request.metric,
            mode = ?request.mode,
            "Loaded price data"
        );

        // 3. Annualize with the request's timeframe
        let costs = self
            .config
            .costs
            .clone()
            .with_periods_per_year(request.timeframe.periods_per_year());
        let evaluator = BacktestEvaluator::new(request.metric);

        // 4. Run the optimizer
        let report = match request.mode {
            OptimizationMode::WalkForward => {
                let config = WalkForwardConfig {
                    split: self.config.split.clone(),
                    search: self.config.search.clone(),
                };
                let optimizer = WalkForwardOptimizer::with_cancellation(
                    evaluator,
                    config,
                    self.cancel.clone(),
                )?;
                OptimizationReport::WalkForward(optimizer.optimize(
                    factory,
                    &grid,
                    series.as_slice(),
                    &costs,
                )?)
            }
            OptimizationMode::Rolling => {
                let optimizer = RollingOptimizer::new(
                    evaluator,
                    self.config.rolling.clone(),
                    self.config.search.clone(),
                )?
                .with_cancellation(self.cancel.clone());
                OptimizationReport::Rolling(optimizer.optimize(
                    factory,
                    &grid,
                    series.as_slice(),
                    &costs,
                )?)
            }
        };

        Ok(report)
    }
}
