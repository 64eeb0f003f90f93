// Allow unwrap/expect in tests - tests should panic on unexpected errors
// Allow test-specific patterns and pedantic lints in test code
#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::float_cmp,
        clippy::significant_drop_tightening,
        clippy::too_many_lines,
        clippy::match_same_arms,
        clippy::needless_pass_by_value,
        clippy::needless_collect,
        clippy::option_if_let_else,
        clippy::default_trait_access,
        clippy::items_after_statements,
        clippy::or_fun_call,
        clippy::cast_possible_wrap
    )
)]

//! Strategy Optimizer - Rust Core Library
//!
//! Walk-forward parameter optimization for trading strategy research.
//!
//! # Protocol
//!
//! A price series is split chronologically. Every candidate of a parameter
//! grid is scored on the earliest segment (search), survivors are re-scored
//! on the next (select), and only the selected parameters are evaluated on
//! the final, held-out segment (report). The rolling variant repeats this in
//! anchored, expanding windows and aggregates the out-of-sample scores.
//!
//! # Layers (inside → outside)
//!
//! - **Domain**: candles, price series, parameter sets, signals
//! - **Optimization**: grids, splitting, parallel search, walk-forward and
//!   rolling optimizers, the `Evaluator` seam
//! - **Backtest / Strategies**: reference collaborators that make the core
//!   runnable end to end
//! - **Application**: `RunOptimizationUseCase` and the `PriceDataPort`
//! - **Infrastructure**: in-memory and JSON file price data adapters
//!
//! # Determinism
//!
//! Results are identical across runs and thread counts: evaluations are
//! collected in grid order and ties break on train metric, then grid index.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

// =============================================================================
// Core
// =============================================================================

/// Domain layer - value objects shared by every other layer.
pub mod domain;

/// Error types.
pub mod error;

/// Optimization core - grids, splitting, search and walk-forward drivers.
pub mod optimization;

// =============================================================================
// Collaborators
// =============================================================================

/// Reference backtester and performance statistics.
pub mod backtest;

/// Reference strategies and the strategy registry.
pub mod strategies;

// =============================================================================
// Application & Infrastructure
// =============================================================================

/// Application layer - use cases and port definitions.
pub mod application;

/// Infrastructure layer - port adapters.
pub mod infrastructure;

/// YAML configuration.
pub mod config;

/// Logging and metrics.
pub mod observability;

// =============================================================================
// Re-exports
// =============================================================================

// Domain re-exports
pub use domain::{Candle, ParamValue, ParameterSet, PriceSeries, Signal, Timeframe};
pub use error::{EvaluationError, OptimizerError, Phase};

// Optimization re-exports
pub use optimization::{
    BacktestEvaluator, CancellationFlag, Evaluator, MetricKind, OptimizationResult, ParameterGrid,
    RollingConfig, RollingOptimizationResult, RollingOptimizer, SearchConfig, SplitConfig,
    Strategy, StrategyFactory, WalkForwardConfig, WalkForwardOptimizer, preset_grid,
};

// Collaborator re-exports
pub use backtest::{CostConfig, PerformanceSummary, SignalBacktester};
pub use strategies::StrategyRegistry;

// Application / infrastructure re-exports
pub use application::{
    OptimizationMode, OptimizationReport, OptimizeRequest, PriceDataError, PriceDataPort,
    RunOptimizationUseCase, UseCaseError,
};
pub use config::{Config, ConfigError, load_config, load_config_from_string};
pub use infrastructure::{InMemoryPriceData, JsonFilePriceData, PriceFile};
