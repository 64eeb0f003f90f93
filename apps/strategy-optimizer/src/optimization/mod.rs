//! Optimization Core
//!
//! Parameter grids, chronological splitting, parallel candidate search and
//! the two walk-forward drivers:
//!
//! - [`walkforward`]: single train / validation / test optimization
//! - [`rolling`]: anchored windows with aggregated out-of-sample metrics
//!
//! Candidates are scored through the [`Evaluator`] seam. The default
//! [`BacktestEvaluator`] builds a strategy from a [`StrategyFactory`], runs it
//! through a [`BacktestRunner`] and scores the result with a [`MetricKind`].

pub mod cancel;
pub mod candidate;
pub mod evaluation;
pub mod grid;
pub mod metric;
pub(crate) mod phases;
pub mod presets;
pub mod progress;
pub mod rolling;
pub mod search;
pub mod splitter;
pub mod walkforward;

#[cfg(test)]
pub(crate) mod testing;

pub use cancel::CancellationFlag;
pub use candidate::{CandidateFailure, RankedCandidate};
pub use evaluation::{
    BacktestEvaluator, BacktestRunner, Evaluation, Evaluator, Strategy, StrategyFactory,
};
pub use grid::{Combinations, GridParameter, ParameterGrid, ParameterGridBuilder};
pub use metric::MetricKind;
pub use presets::{PRESET_NAMES, normalize_strategy_name, preset_grid};
pub use progress::{Progress, ProgressTracker};
pub use rolling::{
    AggregatedMetrics, ParameterDispersion, ParameterStability, RollingConfig,
    RollingOptimizationResult, RollingOptimizer, WindowFailure, WindowResult,
};
pub use search::{SearchConfig, SearchExecutor};
pub use splitter::{DataSplit, DataSplitter, SplitConfig, SplitSummary, WalkForwardSplit};
pub use walkforward::{
    GeneralizationStatus, OptimizationResult, OverfittingCheck, WalkForwardBuilder,
    WalkForwardConfig, WalkForwardOptimizer, relative_degradation,
};
