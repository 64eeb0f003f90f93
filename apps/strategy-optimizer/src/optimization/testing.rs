//! Test doubles for the optimizer.

use std::sync::Mutex;

use chrono::{Duration, TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use super::evaluation::{Evaluation, Evaluator, Strategy, StrategyFactory};
use crate::backtest::CostConfig;
use crate::domain::{Candle, ParameterSet};
use crate::error::EvaluationError;

/// Daily candles whose close is `100 + index`, so a segment's first close
/// identifies where it starts.
pub fn indexed_candles(n: usize) -> Vec<Candle> {
    let Some(base) = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).single() else {
        panic!("valid base timestamp");
    };
    (0..n)
        .map(|i| {
            Candle::flat(
                base + Duration::days(i as i64),
                Decimal::from(100 + i as u64),
                Decimal::ONE,
            )
        })
        .collect()
}

/// Index of the segment's first bar in a series from [`indexed_candles`].
pub fn segment_start(segment: &[Candle]) -> usize {
    segment
        .first()
        .and_then(|c| (c.close - Decimal::from(100)).to_usize())
        .unwrap_or(usize::MAX)
}

/// Factory that is never asked to build anything.
pub struct UnusedFactory;

impl StrategyFactory for UnusedFactory {
    fn name(&self) -> &str {
        "scripted"
    }

    fn build(&self, _params: &ParameterSet) -> Result<Box<dyn Strategy>, EvaluationError> {
        Err(EvaluationError::Numeric("scripted evaluator builds no strategy".to_string()))
    }
}

/// One recorded evaluator call.
#[derive(Debug, Clone)]
pub struct Call {
    pub params: ParameterSet,
    pub start: usize,
    pub len: usize,
}

/// Evaluator driven by a closure over `(params, segment_start)`, recording every call.
pub struct ScriptedEvaluator<F> {
    score: F,
    calls: Mutex<Vec<Call>>,
}

impl<F> ScriptedEvaluator<F>
where
    F: Fn(&ParameterSet, usize) -> Result<Decimal, EvaluationError> + Send + Sync,
{
    pub fn new(score: F) -> Self {
        Self {
            score,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn calls_starting_at(&self, start: usize) -> Vec<Call> {
        self.calls().into_iter().filter(|c| c.start == start).collect()
    }
}

impl<F> Evaluator for ScriptedEvaluator<F>
where
    F: Fn(&ParameterSet, usize) -> Result<Decimal, EvaluationError> + Send + Sync,
{
    fn metric_name(&self) -> &str {
        "scripted"
    }

    fn evaluate(
        &self,
        _factory: &dyn StrategyFactory,
        params: &ParameterSet,
        segment: &[Candle],
        _costs: &CostConfig,
    ) -> Result<Evaluation, EvaluationError> {
        let start = segment_start(segment);
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(Call {
                params: params.clone(),
                start,
                len: segment.len(),
            });
        }
        (self.score)(params, start).map(Evaluation::from_metric)
    }
}

/// Daily candles tracing a slow uptrend with a superimposed cycle, enough
/// structure for the bundled strategies to trade on.
pub fn wave_candles(n: usize) -> Vec<Candle> {
    let mut candles = indexed_candles(n);
    for (i, candle) in candles.iter_mut().enumerate() {
        let t = i as f64;
        let price = 100.0 + 0.05 * t + 10.0 * (t / 15.0).sin();
        let Ok(close) = Decimal::try_from(price) else {
            panic!("finite price");
        };
        candle.close = close.round_dp(4);
        candle.open = candle.close;
        candle.high = candle.close;
        candle.low = candle.close;
    }
    candles
}
