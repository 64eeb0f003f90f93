//! Bollinger band breakout.

use rust_decimal::Decimal;

use super::indicators::bollinger;
use super::{Action, latch, period_or};
use crate::domain::{Candle, ParameterSet, Signal};
use crate::error::EvaluationError;
use crate::optimization::Strategy;

/// Enters when the close breaks above the upper band, exits below the middle band.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BollingerBreakout {
    period: usize,
    std_dev: Decimal,
}

impl BollingerBreakout {
    /// Registered name.
    pub const NAME: &'static str = "bollinger_breakout";

    /// Create the strategy.
    ///
    /// # Errors
    ///
    /// Returns [`EvaluationError::InvalidParameter`] for a period below 2 or
    /// a non-positive band width.
    pub fn new(period: usize, std_dev: Decimal) -> Result<Self, EvaluationError> {
        if period < 2 {
            return Err(EvaluationError::invalid_parameter(
                "period",
                format!("must be at least 2, got {period}"),
            ));
        }
        if std_dev <= Decimal::ZERO {
            return Err(EvaluationError::invalid_parameter(
                "std_dev",
                format!("must be positive, got {std_dev}"),
            ));
        }
        Ok(Self { period, std_dev })
    }

    /// Build from `period` (20) and `std_dev` (2.0).
    pub fn from_params(params: &ParameterSet) -> Result<Self, EvaluationError> {
        let width = params.float_or("std_dev", 2.0)?;
        let width = Decimal::try_from(width).map_err(|_| {
            EvaluationError::invalid_parameter("std_dev", format!("not representable: {width}"))
        })?;
        Self::new(period_or(params, "period", 20)?, width)
    }
}

impl Strategy for BollingerBreakout {
    fn warmup_bars(&self) -> usize {
        self.period - 1
    }

    fn generate_signals(&self, candles: &[Candle]) -> Result<Vec<Signal>, EvaluationError> {
        let closes: Vec<Decimal> = candles.iter().map(|c| c.close).collect();
        let bands = bollinger(&closes, self.period, self.std_dev);

        Ok(latch(closes.iter().zip(&bands).map(|(close, band)| match band {
            Some((_, upper, _)) if close > upper => Action::Enter,
            Some((middle, _, _)) if close < middle => Action::Exit,
            _ => Action::Hold,
        })))
    }
}
