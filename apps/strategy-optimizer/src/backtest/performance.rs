//! Backtest performance summary.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::constants::HUNDRED;

/// Performance summary of one backtest over one segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerformanceSummary {
    // Basic metrics
    /// Total return (decimal, e.g., 0.15 = 15%).
    pub total_return: Decimal,
    /// Simple annualized return (total return scaled by periods per year).
    pub annualized_return: Decimal,
    /// Initial equity.
    pub initial_equity: Decimal,
    /// Final equity.
    pub final_equity: Decimal,

    // Risk-adjusted metrics
    /// Sharpe ratio, annualized. None when returns have no dispersion.
    pub sharpe_ratio: Option<Decimal>,
    /// Sortino ratio, annualized. None when there are no losing bars.
    pub sortino_ratio: Option<Decimal>,
    /// Calmar ratio. None when there was no drawdown.
    pub calmar_ratio: Option<Decimal>,
    /// Maximum peak-to-trough drawdown (positive decimal, 0.10 = 10%).
    pub max_drawdown: Decimal,

    // Trade statistics
    /// Number of round trips (open positions are closed at the last bar).
    pub total_trades: u64,
    /// Fraction of round trips with positive net P&L.
    pub win_rate: Decimal,
    /// Commission and slippage paid.
    pub total_costs: Decimal,
    /// Fraction of bars spent holding a position.
    pub exposure: Decimal,
    /// Number of bar-to-bar returns.
    pub periods: u64,
}

impl Default for PerformanceSummary {
    fn default() -> Self {
        Self {
            total_return: Decimal::ZERO,
            annualized_return: Decimal::ZERO,
            initial_equity: Decimal::ZERO,
            final_equity: Decimal::ZERO,
            sharpe_ratio: None,
            sortino_ratio: None,
            calmar_ratio: None,
            max_drawdown: Decimal::ZERO,
            total_trades: 0,
            win_rate: Decimal::ZERO,
            total_costs: Decimal::ZERO,
            exposure: Decimal::ZERO,
            periods: 0,
        }
    }
}

/// Format a decimal as percentage string.
#[must_use]
pub fn format_pct(value: Decimal) -> String {
    format!("{:.2}%", value * HUNDRED)
}

/// Format an optional decimal ratio.
#[must_use]
pub fn format_ratio(value: Option<Decimal>) -> String {
    value.map_or_else(|| "N/A".to_string(), |v| format!("{v:.4}"))
}
