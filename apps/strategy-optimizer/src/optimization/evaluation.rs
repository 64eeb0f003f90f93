//! Evaluation boundary between the optimizer and strategy/backtest code.
//!
//! The optimizer only sees [`Evaluator`]: given a parameter set and a
//! segment, produce one comparable score. [`BacktestEvaluator`] composes a
//! [`StrategyFactory`], a [`BacktestRunner`] and a [`MetricKind`] into one.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::metric::MetricKind;
use crate::backtest::{BacktestOutcome, CostConfig, PerformanceSummary, SignalBacktester};
use crate::domain::{Candle, ParameterSet, Signal};
use crate::error::EvaluationError;

/// A configured trading strategy.
pub trait Strategy: Send {
    /// Number of leading bars needed before the first meaningful signal.
    fn warmup_bars(&self) -> usize;

    /// Produce one signal per bar. Must be deterministic.
    fn generate_signals(&self, candles: &[Candle]) -> Result<Vec<Signal>, EvaluationError>;
}

/// Builds strategies from parameter sets.
pub trait StrategyFactory: Send + Sync {
    /// Registered strategy name.
    fn name(&self) -> &str;

    /// Instantiate the strategy, validating its parameters.
    fn build(&self, params: &ParameterSet) -> Result<Box<dyn Strategy>, EvaluationError>;
}

/// Runs a signal sequence against price data.
pub trait BacktestRunner: Send + Sync {
    /// Simulate trading `signals` over `candles`.
    fn run(
        &self,
        signals: &[Signal],
        candles: &[Candle],
        costs: &CostConfig,
    ) -> Result<BacktestOutcome, EvaluationError>;
}

/// Result of evaluating one parameter set on one segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evaluation {
    /// Comparable score, higher is better.
    pub metric: Decimal,
    /// Backtest statistics behind the score.
    pub performance: PerformanceSummary,
}

impl Evaluation {
    /// Evaluation carrying only a score.
    #[must_use]
    pub fn from_metric(metric: Decimal) -> Self {
        Self {
            metric,
            performance: PerformanceSummary::default(),
        }
    }
}

/// Scores a parameter set on a segment.
///
/// Implementations must be pure with respect to their inputs: the same
/// parameters and segment always produce the same score.
pub trait Evaluator: Send + Sync {
    /// Name of the metric produced.
    fn metric_name(&self) -> &str;

    /// Evaluate `params` on `segment`.
    fn evaluate(
        &self,
        factory: &dyn StrategyFactory,
        params: &ParameterSet,
        segment: &[Candle],
        costs: &CostConfig,
    ) -> Result<Evaluation, EvaluationError>;
}

/// Evaluator that backtests generated signals and extracts one metric.
#[derive(Debug, Clone, Default)]
pub struct BacktestEvaluator<R = SignalBacktester> {
    runner: R,
    metric: MetricKind,
}

impl BacktestEvaluator<SignalBacktester> {
    /// Evaluator using the reference backtester.
    #[must_use]
    pub const fn new(metric: MetricKind) -> Self {
        Self {
            runner: SignalBacktester,
            metric,
        }
    }
}

impl<R: BacktestRunner> BacktestEvaluator<R> {
    /// Evaluator using a custom runner.
    #[must_use]
    pub const fn with_runner(runner: R, metric: MetricKind) -> Self {
        Self { runner, metric }
    }

    /// Selected metric.
    #[must_use]
    pub const fn metric(&self) -> MetricKind {
        self.metric
    }
}

impl<R: BacktestRunner> Evaluator for BacktestEvaluator<R> {
    fn metric_name(&self) -> &str {
        self.metric.as_str()
    }

    fn evaluate(
        &self,
        factory: &dyn StrategyFactory,
        params: &ParameterSet,
        segment: &[Candle],
        costs: &CostConfig,
    ) -> Result<Evaluation, EvaluationError> {
        let strategy = factory.build(params)?;

        let warmup = strategy.warmup_bars();
        if segment.len() <= warmup {
            return Err(EvaluationError::InsufficientHistory {
                required: warmup + 1,
                available: segment.len(),
            });
        }

        let signals = strategy.generate_signals(segment)?;
        if signals.len() != segment.len() {
            return Err(EvaluationError::SignalLengthMismatch {
                signals: signals.len(),
                bars: segment.len(),
            });
        }

        let outcome = self.runner.run(&signals, segment, costs)?;
        let metric = self.metric.score(&outcome.performance)?;

        Ok(Evaluation {
            metric,
            performance: outcome.performance,
        })
    }
}
