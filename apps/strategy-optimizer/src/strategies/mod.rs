//! Reference Strategies
//!
//! Long/flat strategies used to drive the optimizer end to end. The
//! optimizer core never names them; it only sees
//! [`StrategyFactory`](crate::optimization::StrategyFactory), which the
//! [`StrategyRegistry`] supplies by name.
//!
//! | Strategy | Parameters | Enters | Exits |
//! |----------|------------|--------|-------|
//! | `sma_crossover` | `fast_period`, `slow_period` | fast SMA above slow | fast SMA below slow |
//! | `rsi_mean_reversion` | `period`, `oversold`, `overbought` | RSI below oversold | RSI above overbought |
//! | `bollinger_breakout` | `period`, `std_dev` | close above upper band | close below middle band |
//! | `macd_momentum` | `fast_period`, `slow_period`, `signal_period` | MACD above signal | MACD below signal |

pub mod bollinger_breakout;
pub mod indicators;
pub mod macd_momentum;
pub mod registry;
pub mod rsi_mean_reversion;
pub mod sma_crossover;

pub use bollinger_breakout::BollingerBreakout;
pub use macd_momentum::MacdMomentum;
pub use registry::{StrategyDescriptor, StrategyRegistry};
pub use rsi_mean_reversion::RsiMeanReversion;
pub use sma_crossover::SmaCrossover;

use crate::domain::{ParameterSet, Signal};
use crate::error::EvaluationError;

/// What a strategy wants to do on one bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Action {
    Enter,
    Exit,
    Hold,
}

/// Latch per-bar actions into long/flat positions.
pub(crate) fn latch(actions: impl IntoIterator<Item = Action>) -> Vec<Signal> {
    let mut position = Signal::Flat;
    actions
        .into_iter()
        .map(|action| {
            match action {
                Action::Enter => position = Signal::Long,
                Action::Exit => position = Signal::Flat,
                Action::Hold => {}
            }
            position
        })
        .collect()
}

/// Positive period parameter, or `default` when absent.
pub(crate) fn period_or(
    params: &ParameterSet,
    name: &str,
    default: usize,
) -> Result<usize, EvaluationError> {
    if params.get(name).is_some() {
        params.period(name)
    } else {
        Ok(default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latch_holds_position_between_actions() {
        let signals = latch([
            Action::Hold,
            Action::Enter,
            Action::Hold,
            Action::Exit,
            Action::Hold,
        ]);
        assert_eq!(
            signals,
            vec![
                Signal::Flat,
                Signal::Long,
                Signal::Long,
                Signal::Flat,
                Signal::Flat
            ]
        );
    }

    #[test]
    fn test_period_or() {
        let params: ParameterSet = [("period", 14)].into_iter().collect();
        assert_eq!(period_or(&params, "period", 20), Ok(14));
        assert_eq!(period_or(&params, "missing", 20), Ok(20));

        let bad: ParameterSet = [("period", -3)].into_iter().collect();
        assert!(period_or(&bad, "period", 20).is_err());
    }
}
