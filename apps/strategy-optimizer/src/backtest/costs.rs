//! Trading cost configuration passed through to every evaluation.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::OptimizerError;

/// Cost and capital assumptions for a backtest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CostConfig {
    /// Commission as a fraction of traded notional (0.001 = 10 bps).
    pub commission_rate: Decimal,
    /// Slippage as a fraction of traded notional.
    pub slippage_rate: Decimal,
    /// Starting equity.
    pub initial_capital: Decimal,
    /// Bars per year, used to annualize returns and ratios.
    pub periods_per_year: u32,
}

impl Default for CostConfig {
    fn default() -> Self {
        Self {
            commission_rate: Decimal::new(1, 3), // 0.001
            slippage_rate: Decimal::new(5, 4),   // 0.0005
            initial_capital: Decimal::new(10_000, 0),
            periods_per_year: 365,
        }
    }
}

impl CostConfig {
    /// Override the annualization factor.
    #[must_use]
    pub const fn with_periods_per_year(mut self, periods: u32) -> Self {
        self.periods_per_year = periods;
        self
    }

    /// Combined per-unit-turnover cost rate.
    #[must_use]
    pub fn cost_rate(&self) -> Decimal {
        self.commission_rate + self.slippage_rate
    }

    /// Validate ranges.
    ///
    /// # Errors
    ///
    /// Returns [`OptimizerError::Configuration`] when capital is not positive,
    /// a rate is negative or at least 1, or the annualization factor is zero.
    pub fn validate(&self) -> Result<(), OptimizerError> {
        if self.initial_capital <= Decimal::ZERO {
            return Err(OptimizerError::configuration(format!(
                "initial_capital must be positive, got {}",
                self.initial_capital
            )));
        }
        for (name, rate) in [
            ("commission_rate", self.commission_rate),
            ("slippage_rate", self.slippage_rate),
        ] {
            if rate < Decimal::ZERO || rate >= Decimal::ONE {
                return Err(OptimizerError::configuration(format!(
                    "{name} must be in [0, 1), got {rate}"
                )));
            }
        }
        if self.periods_per_year == 0 {
            return Err(OptimizerError::configuration(
                "periods_per_year must be positive",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let costs = CostConfig::default();
        assert!(costs.validate().is_ok());
        assert_eq!(costs.cost_rate(), dec!(0.0015));
    }

    #[test]
    fn test_rejects_non_positive_capital() {
        let costs = CostConfig {
            initial_capital: Decimal::ZERO,
            ..Default::default()
        };
        assert!(matches!(
            costs.validate(),
            Err(OptimizerError::Configuration(_))
        ));
    }

    #[test]
    fn test_rejects_negative_commission() {
        let costs = CostConfig {
            commission_rate: dec!(-0.001),
            ..Default::default()
        };
        assert!(costs.validate().is_err());
    }

    #[test]
    fn test_with_periods_per_year() {
        let costs = CostConfig::default().with_periods_per_year(8_760);
        assert_eq!(costs.periods_per_year, 8_760);
    }
}
