//! Optimization target selection.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::backtest::PerformanceSummary;
use crate::error::{EvaluationError, OptimizerError};

/// Named optimization target.
///
/// Every score is "higher is better": metrics that are natively
/// lower-is-better are negated before they reach the optimizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    /// Annualized Sharpe ratio.
    #[default]
    SharpeRatio,
    /// Annualized Sortino ratio.
    SortinoRatio,
    /// Total return over the segment.
    TotalReturn,
    /// Simple annualized return.
    AnnualizedReturn,
    /// Maximum drawdown, scored as `-|drawdown|`.
    MaxDrawdown,
    /// Fraction of winning round trips.
    WinRate,
    /// Annualized return over maximum drawdown.
    CalmarRatio,
}

impl MetricKind {
    /// All supported metrics.
    pub const ALL: [Self; 7] = [
        Self::SharpeRatio,
        Self::SortinoRatio,
        Self::TotalReturn,
        Self::AnnualizedReturn,
        Self::MaxDrawdown,
        Self::WinRate,
        Self::CalmarRatio,
    ];

    /// Metric name as used on the command line and in results.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::SharpeRatio => "sharpe_ratio",
            Self::SortinoRatio => "sortino_ratio",
            Self::TotalReturn => "total_return",
            Self::AnnualizedReturn => "annualized_return",
            Self::MaxDrawdown => "max_drawdown",
            Self::WinRate => "win_rate",
            Self::CalmarRatio => "calmar_ratio",
        }
    }

    /// Whether the raw metric is natively lower-is-better.
    #[must_use]
    pub const fn is_lower_better(&self) -> bool {
        matches!(self, Self::MaxDrawdown)
    }

    /// Extract the score from a performance summary.
    ///
    /// # Errors
    ///
    /// Returns [`EvaluationError::MetricUnavailable`] when the ratio is
    /// undefined for this result (no return dispersion, no drawdown).
    pub fn score(&self, performance: &PerformanceSummary) -> Result<Decimal, EvaluationError> {
        let unavailable = || EvaluationError::MetricUnavailable(self.as_str().to_string());
        match self {
            Self::SharpeRatio => performance.sharpe_ratio.ok_or_else(unavailable),
            Self::SortinoRatio => performance.sortino_ratio.ok_or_else(unavailable),
            Self::TotalReturn => Ok(performance.total_return),
            Self::AnnualizedReturn => Ok(performance.annualized_return),
            Self::MaxDrawdown => Ok(-performance.max_drawdown.abs()),
            Self::WinRate => Ok(performance.win_rate),
            Self::CalmarRatio => performance.calmar_ratio.ok_or_else(unavailable),
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MetricKind {
    type Err = OptimizerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        let normalized = match normalized.as_str() {
            "sharpe" => "sharpe_ratio",
            "sortino" => "sortino_ratio",
            "calmar" => "calmar_ratio",
            other => other,
        };
        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == normalized)
            .ok_or_else(|| {
                let known: Vec<&str> = Self::ALL.iter().map(Self::as_str).collect();
                OptimizerError::configuration(format!(
                    "unknown metric '{s}' (expected one of {})",
                    known.join(", ")
                ))
            })
    }
}
