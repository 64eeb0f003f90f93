//! Reference vectorized backtester.
//!
//! Trades at the close of the bar that produced the signal and holds the
//! position over the following bar, so a signal never sees the return it
//! trades on. Costs are charged on turnover:
//! `equity * |Δexposure| * (commission + slippage)`.
//!
//! Exposure follows [`Signal::exposure`]: the bundled strategies are
//! long/flat, but a [`Signal::Short`] from any other strategy holds -1
//! exposure, and a long/short flip pays twice the turnover.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::costs::CostConfig;
use super::math::{downside_deviation, mean, sqrt_decimal, std_dev};
use super::performance::PerformanceSummary;
use crate::domain::{Candle, Signal};
use crate::error::EvaluationError;
use crate::optimization::BacktestRunner;

/// Raw backtest output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BacktestOutcome {
    /// Summary statistics.
    pub performance: PerformanceSummary,
    /// Equity after each bar, starting with the initial capital.
    pub equity_curve: Vec<Decimal>,
}

/// Signal-driven backtester supporting long, flat and short exposure.
#[derive(Debug, Clone, Copy, Default)]
pub struct SignalBacktester;

impl SignalBacktester {
    /// Create a new backtester.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

/// Running state of an open position.
#[derive(Debug, Clone, Copy)]
struct OpenTrade {
    entry_equity: Decimal,
}

fn numeric(message: &str) -> EvaluationError {
    EvaluationError::Numeric(message.to_string())
}

impl BacktestRunner for SignalBacktester {
    fn run(
        &self,
        signals: &[Signal],
        candles: &[Candle],
        costs: &CostConfig,
    ) -> Result<BacktestOutcome, EvaluationError> {
        if candles.len() < 2 {
            return Err(EvaluationError::InsufficientHistory {
                required: 2,
                available: candles.len(),
            });
        }
        if signals.len() != candles.len() {
            return Err(EvaluationError::SignalLengthMismatch {
                signals: signals.len(),
                bars: candles.len(),
            });
        }

        let cost_rate = costs.cost_rate();
        let mut equity = costs.initial_capital;
        let mut peak = equity;
        let mut max_drawdown = Decimal::ZERO;
        let mut position = Decimal::ZERO;
        let mut open: Option<OpenTrade> = None;
        let mut total_costs = Decimal::ZERO;
        let mut total_trades = 0_u64;
        let mut winning_trades = 0_u64;
        let mut bars_in_market = 0_u64;

        let mut equity_curve = Vec::with_capacity(candles.len());
        equity_curve.push(equity);
        let mut returns = Vec::with_capacity(candles.len() - 1);

        for i in 1..candles.len() {
            let prev_close = candles[i - 1].close;
            if prev_close <= Decimal::ZERO {
                return Err(EvaluationError::Numeric(format!(
                    "non-positive close {prev_close} at bar {}",
                    i - 1
                )));
            }
            let start_equity = equity;
            let target = signals[i - 1].exposure();

            if target != position {
                let turnover = (target - position).abs();
                let cost = equity
                    .checked_mul(turnover)
                    .and_then(|v| v.checked_mul(cost_rate))
                    .ok_or_else(|| numeric("cost overflow"))?;
                equity -= cost;
                total_costs += cost;

                // Closing or flipping realizes the open trade.
                if let Some(trade) = open.take() {
                    total_trades += 1;
                    if equity > trade.entry_equity {
                        winning_trades += 1;
                    }
                }
                if target != Decimal::ZERO {
                    open = Some(OpenTrade {
                        entry_equity: equity + cost,
                    });
                }
                position = target;
            }

            if position != Decimal::ZERO {
                bars_in_market += 1;
                let bar_return = (candles[i].close - prev_close)
                    .checked_div(prev_close)
                    .ok_or_else(|| numeric("return overflow"))?;
                let pnl = equity
                    .checked_mul(position)
                    .and_then(|v| v.checked_mul(bar_return))
                    .ok_or_else(|| numeric("equity overflow"))?;
                equity = equity
                    .checked_add(pnl)
                    .ok_or_else(|| numeric("equity overflow"))?;
            }

            if equity <= Decimal::ZERO {
                return Err(EvaluationError::Numeric(format!(
                    "equity depleted at bar {i}"
                )));
            }

            returns.push((equity - start_equity) / start_equity);
            if equity > peak {
                peak = equity;
            }
            let drawdown = (peak - equity) / peak;
            if drawdown > max_drawdown {
                max_drawdown = drawdown;
            }
            equity_curve.push(equity);
        }

        // Mark the open position to market at the last bar.
        if let Some(trade) = open {
            total_trades += 1;
            if equity > trade.entry_equity {
                winning_trades += 1;
            }
        }

        let periods = returns.len() as u64;
        let periods_per_year = Decimal::from(costs.periods_per_year);
        let total_return = equity / costs.initial_capital - Decimal::ONE;
        let annualized_return = total_return * periods_per_year / Decimal::from(periods);
        let annualizer = sqrt_decimal(periods_per_year).unwrap_or(Decimal::ONE);

        let avg_return = mean(&returns).unwrap_or_default();
        let sharpe_ratio = std_dev(&returns)
            .filter(|sd| *sd > Decimal::ZERO)
            .map(|sd| avg_return / sd * annualizer);
        let sortino_ratio = downside_deviation(&returns)
            .filter(|dd| *dd > Decimal::ZERO)
            .map(|dd| avg_return / dd * annualizer);
        let calmar_ratio =
            (max_drawdown > Decimal::ZERO).then(|| annualized_return / max_drawdown);

        let win_rate = if total_trades > 0 {
            Decimal::from(winning_trades) / Decimal::from(total_trades)
        } else {
            Decimal::ZERO
        };

        Ok(BacktestOutcome {
            performance: PerformanceSummary {
                total_return,
                annualized_return,
                initial_equity: costs.initial_capital,
                final_equity: equity,
                sharpe_ratio,
                sortino_ratio,
                calmar_ratio,
                max_drawdown,
                total_trades,
                win_rate,
                total_costs,
                exposure: Decimal::from(bars_in_market) / Decimal::from(periods),
                periods,
            },
            equity_curve,
        })
    }
}
