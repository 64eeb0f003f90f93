//! Rolling (anchored, expanding-window) walk-forward optimization.

mod analysis;
mod engine;
mod types;

pub use analysis::{aggregate_test_metrics, analyze_parameter_stability, consensus_params};
pub use engine::RollingOptimizer;
pub use types::{
    AggregatedMetrics, ParameterDispersion, ParameterStability, RollingConfig,
    RollingOptimizationResult, WindowFailure, WindowResult,
};
