//! Moving average crossover.

use super::indicators::sma;
use super::{Action, latch, period_or};
use crate::domain::{Candle, ParameterSet, Signal, closes};
use crate::error::EvaluationError;
use crate::optimization::Strategy;

/// Long while the fast SMA is above the slow SMA.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SmaCrossover {
    fast_period: usize,
    slow_period: usize,
}

impl SmaCrossover {
    /// Registered name.
    pub const NAME: &'static str = "sma_crossover";

    /// Create the strategy.
    ///
    /// # Errors
    ///
    /// Returns [`EvaluationError::InvalidParameter`] unless `fast_period < slow_period`.
    pub fn new(fast_period: usize, slow_period: usize) -> Result<Self, EvaluationError> {
        if fast_period == 0 || fast_period >= slow_period {
            return Err(EvaluationError::invalid_parameter(
                "fast_period",
                format!("must be positive and below slow_period ({fast_period} >= {slow_period})"),
            ));
        }
        Ok(Self {
            fast_period,
            slow_period,
        })
    }

    /// Build from `fast_period` (default 20) and `slow_period` (default 50).
    pub fn from_params(params: &ParameterSet) -> Result<Self, EvaluationError> {
        Self::new(
            period_or(params, "fast_period", 20)?,
            period_or(params, "slow_period", 50)?,
        )
    }
}

impl Strategy for SmaCrossover {
    fn warmup_bars(&self) -> usize {
        self.slow_period - 1
    }

    fn generate_signals(&self, candles: &[Candle]) -> Result<Vec<Signal>, EvaluationError> {
        let prices = closes(candles);
        let fast = sma(&prices, self.fast_period);
        let slow = sma(&prices, self.slow_period);

        Ok(latch(fast.iter().zip(&slow).map(|pair| match pair {
            (Some(f), Some(s)) if f > s => Action::Enter,
            (Some(f), Some(s)) if f < s => Action::Exit,
            _ => Action::Hold,
        })))
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::optimization::testing::indexed_candles;

    #[test]
    fn test_uptrend_goes_long_after_warmup() {
        let Ok(strategy) = SmaCrossover::new(2, 4) else {
            panic!("valid periods");
        };
        let Ok(signals) = strategy.generate_signals(&indexed_candles(10)) else {
            panic!("signals should generate");
        };
        assert_eq!(strategy.warmup_bars(), 3);
        assert!(signals[..3].iter().all(|s| *s == Signal::Flat));
        assert!(signals[3..].iter().all(|s| *s == Signal::Long));
    }

    #[test]
    fn test_downtrend_stays_flat() {
        let mut candles = indexed_candles(10);
        for (i, candle) in candles.iter_mut().enumerate() {
            candle.close = Decimal::from(200 - i as i64);
        }
        let Ok(strategy) = SmaCrossover::new(2, 4) else {
            panic!("valid periods");
        };
        let Ok(signals) = strategy.generate_signals(&candles) else {
            panic!("signals should generate");
        };
        assert!(signals.iter().all(|s| *s == Signal::Flat));
    }

    #[test]
    fn test_rejects_inverted_periods() {
        let params: ParameterSet = [("fast_period", 50), ("slow_period", 20)]
            .into_iter()
            .collect();
        assert!(matches!(
            SmaCrossover::from_params(&params),
            Err(EvaluationError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_defaults() {
        assert_eq!(
            SmaCrossover::from_params(&ParameterSet::empty()),
            SmaCrossover::new(20, 50)
        );
    }
}
