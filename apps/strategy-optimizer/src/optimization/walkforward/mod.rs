//! Three-way walk-forward optimization.
//!
//! The series is split chronologically into train, validation and test.
//! Every grid candidate is scored on train, survivors are re-scored on
//! validation, and only the winner ever sees the test segment.
//!
//! # Example
//!
//! ```ignore
//! use strategy_optimizer::optimization::{
//!     BacktestEvaluator, MetricKind, WalkForwardOptimizer, preset_grid,
//! };
//!
//! let optimizer = WalkForwardOptimizer::builder(BacktestEvaluator::new(MetricKind::SharpeRatio))
//!     .train_frac(0.6)
//!     .validation_frac(0.2)
//!     .build()?;
//! let result = optimizer.optimize(&factory, &preset_grid("sma_crossover")?, series.as_slice(), &costs)?;
//! println!("{} -> test {}", result.best_params, result.test_metric);
//! ```

mod builder;
mod engine;
mod types;

pub use builder::WalkForwardBuilder;
pub use engine::WalkForwardOptimizer;
pub use types::{
    GeneralizationStatus, OptimizationResult, OverfittingCheck, WalkForwardConfig,
    relative_degradation,
};
