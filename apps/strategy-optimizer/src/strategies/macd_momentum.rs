//! MACD momentum.

use super::indicators::macd;
use super::{Action, latch, period_or};
use crate::domain::{Candle, ParameterSet, Signal, closes};
use crate::error::EvaluationError;
use crate::optimization::Strategy;

/// Long while the MACD line is above its signal line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MacdMomentum {
    fast_period: usize,
    slow_period: usize,
    signal_period: usize,
}

impl MacdMomentum {
    /// Registered name.
    pub const NAME: &'static str = "macd_momentum";

    /// Create the strategy.
    ///
    /// # Errors
    ///
    /// Returns [`EvaluationError::InvalidParameter`] unless `fast_period < slow_period`.
    pub fn new(
        fast_period: usize,
        slow_period: usize,
        signal_period: usize,
    ) -> Result<Self, EvaluationError> {
        if fast_period >= slow_period {
            return Err(EvaluationError::invalid_parameter(
                "fast_period",
                format!("must be below slow_period ({fast_period} >= {slow_period})"),
            ));
        }
        Ok(Self {
            fast_period,
            slow_period,
            signal_period,
        })
    }

    /// Build from `fast_period` (12), `slow_period` (26) and `signal_period` (9).
    pub fn from_params(params: &ParameterSet) -> Result<Self, EvaluationError> {
        Self::new(
            period_or(params, "fast_period", 12)?,
            period_or(params, "slow_period", 26)?,
            period_or(params, "signal_period", 9)?,
        )
    }
}

impl Strategy for MacdMomentum {
    fn warmup_bars(&self) -> usize {
        self.slow_period + self.signal_period - 2
    }

    fn generate_signals(&self, candles: &[Candle]) -> Result<Vec<Signal>, EvaluationError> {
        let (line, signal) = macd(
            &closes(candles),
            self.fast_period,
            self.slow_period,
            self.signal_period,
        );
        let warmup = self.warmup_bars();

        Ok(latch(line.iter().zip(&signal).enumerate().map(
            |(i, (m, s))| {
                if i < warmup {
                    Action::Hold
                } else if m > s {
                    Action::Enter
                } else if m < s {
                    Action::Exit
                } else {
                    Action::Hold
                }
            },
        )))
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::optimization::testing::indexed_candles;

    #[test]
    fn test_flat_through_warmup_then_long_in_accelerating_trend() {
        let mut candles = indexed_candles(40);
        for (i, candle) in candles.iter_mut().enumerate() {
            candle.close = Decimal::from(100 + (i * i) as i64);
        }
        let Ok(strategy) = MacdMomentum::new(3, 6, 3) else {
            panic!("valid periods");
        };
        let Ok(signals) = strategy.generate_signals(&candles) else {
            panic!("signals should generate");
        };
        assert_eq!(strategy.warmup_bars(), 7);
        assert!(signals[..7].iter().all(|s| *s == Signal::Flat));
        assert_eq!(signals[39], Signal::Long);
    }

    #[test]
    fn test_rejects_inverted_periods() {
        assert!(MacdMomentum::new(26, 12, 9).is_err());
        assert_eq!(
            MacdMomentum::from_params(&ParameterSet::empty()),
            MacdMomentum::new(12, 26, 9)
        );
    }
}
