//! Reference backtesting collaborator.
//!
//! The optimizer core only sees the [`BacktestRunner`](crate::optimization::BacktestRunner)
//! trait; this module supplies a vectorized implementation, its cost model
//! and the statistics it reports.

pub mod constants;
pub mod costs;
pub mod math;
pub mod performance;
pub mod runner;

pub use costs::CostConfig;
pub use performance::{PerformanceSummary, format_pct, format_ratio};
pub use runner::{BacktestOutcome, SignalBacktester};
