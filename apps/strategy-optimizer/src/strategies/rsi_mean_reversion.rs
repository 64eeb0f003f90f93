//! RSI mean reversion.

use rust_decimal::Decimal;

use super::indicators::rsi;
use super::{Action, latch, period_or};
use crate::domain::{Candle, ParameterSet, Signal, closes};
use crate::error::EvaluationError;
use crate::optimization::Strategy;

/// Buys oversold conditions and exits once the market is overbought.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RsiMeanReversion {
    period: usize,
    oversold: Decimal,
    overbought: Decimal,
}

impl RsiMeanReversion {
    /// Registered name.
    pub const NAME: &'static str = "rsi_mean_reversion";

    /// Create the strategy.
    ///
    /// # Errors
    ///
    /// Returns [`EvaluationError::InvalidParameter`] unless
    /// `0 < oversold < overbought < 100`.
    pub fn new(
        period: usize,
        oversold: Decimal,
        overbought: Decimal,
    ) -> Result<Self, EvaluationError> {
        if oversold <= Decimal::ZERO || oversold >= overbought {
            return Err(EvaluationError::invalid_parameter(
                "oversold",
                format!("must be positive and below overbought ({oversold} >= {overbought})"),
            ));
        }
        if overbought >= Decimal::ONE_HUNDRED {
            return Err(EvaluationError::invalid_parameter(
                "overbought",
                format!("must be below 100, got {overbought}"),
            ));
        }
        Ok(Self {
            period,
            oversold,
            overbought,
        })
    }

    /// Build from `period` (14), `oversold` (30) and `overbought` (70).
    pub fn from_params(params: &ParameterSet) -> Result<Self, EvaluationError> {
        Self::new(
            period_or(params, "period", 14)?,
            threshold(params, "oversold", 30.0)?,
            threshold(params, "overbought", 70.0)?,
        )
    }
}

fn threshold(params: &ParameterSet, name: &str, default: f64) -> Result<Decimal, EvaluationError> {
    let value = params.float_or(name, default)?;
    Decimal::try_from(value)
        .map_err(|_| {
            EvaluationError::invalid_parameter(name, format!("not representable: {value}"))
        })
}

impl Strategy for RsiMeanReversion {
    fn warmup_bars(&self) -> usize {
        self.period
    }

    fn generate_signals(&self, candles: &[Candle]) -> Result<Vec<Signal>, EvaluationError> {
        let values = rsi(&closes(candles), self.period);
        Ok(latch(values.iter().map(|value| match value {
            Some(v) if *v < self.oversold => Action::Enter,
            Some(v) if *v > self.overbought => Action::Exit,
            _ => Action::Hold,
        })))
    }
}
