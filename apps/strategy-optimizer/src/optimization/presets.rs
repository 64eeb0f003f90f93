//! Predefined parameter grids for the bundled strategies.

use super::grid::ParameterGrid;
use crate::error::OptimizerError;

/// Names with a predefined grid.
pub const PRESET_NAMES: [&str; 4] = [
    "sma_crossover",
    "rsi_mean_reversion",
    "bollinger_breakout",
    "macd_momentum",
];

/// Canonical strategy name: lowercase, `-` replaced by `_`.
#[must_use]
pub fn normalize_strategy_name(name: &str) -> String {
    name.trim().to_ascii_lowercase().replace('-', "_")
}

/// Predefined grid for a strategy.
///
/// # Errors
///
/// Returns [`OptimizerError::Configuration`] naming the known presets when
/// `strategy` has none.
pub fn preset_grid(strategy: &str) -> Result<ParameterGrid, OptimizerError> {
    match normalize_strategy_name(strategy).as_str() {
        "sma_crossover" => ParameterGrid::builder()
            .int("fast_period", [5, 10, 20, 30])
            .int("slow_period", [50, 100, 150, 200])
            .build(),
        "rsi_mean_reversion" => ParameterGrid::builder()
            .int("period", [7, 14, 21, 28])
            .int("oversold", [20, 25, 30])
            .int("overbought", [70, 75, 80])
            .build(),
        "bollinger_breakout" => ParameterGrid::builder()
            .int("period", [10, 20, 30])
            .float("std_dev", [1.5, 2.0, 2.5, 3.0])
            .build(),
        "macd_momentum" => ParameterGrid::builder()
            .int("fast_period", [8, 12, 16])
            .int("slow_period", [21, 26, 30])
            .int("signal_period", [7, 9, 11])
            .build(),
        _ => Err(OptimizerError::configuration(format!(
            "no parameter grid for strategy '{strategy}' (available: {})",
            PRESET_NAMES.join(", ")
        ))),
    }
}
