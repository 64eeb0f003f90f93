//! Technical indicators over decimal price series.
//!
//! Every indicator returns one value per input bar, aligned with the input.
//! Bars before an indicator has enough history are `None`.

use rust_decimal::Decimal;

use crate::backtest::constants::HUNDRED;
use crate::backtest::math::{mean, population_std_dev};

/// Simple moving average over `period` bars.
#[must_use]
pub fn sma(values: &[Decimal], period: usize) -> Vec<Option<Decimal>> {
    if period == 0 {
        return vec![None; values.len()];
    }
    let divisor = Decimal::from(period as u64);
    let mut out = Vec::with_capacity(values.len());
    let mut sum = Decimal::ZERO;
    for (i, value) in values.iter().enumerate() {
        sum += *value;
        if i >= period {
            sum -= values[i - period];
        }
        out.push((i + 1 >= period).then(|| sum / divisor));
    }
    out
}

/// Exponential moving average with smoothing `2 / (span + 1)`, seeded with
/// the first value.
#[must_use]
pub fn ema(values: &[Decimal], span: usize) -> Vec<Decimal> {
    let alpha = Decimal::TWO / Decimal::from(span as u64 + 1);
    let mut out = Vec::with_capacity(values.len());
    let mut current: Option<Decimal> = None;
    for value in values {
        let next = match current {
            Some(prev) => prev + alpha * (*value - prev),
            None => *value,
        };
        current = Some(next);
        out.push(next);
    }
    out
}

/// Relative strength index using simple averages of gains and losses over
/// the last `period` price changes.
///
/// A window with no losses reads 100; a window with no movement at all reads 50.
#[must_use]
pub fn rsi(values: &[Decimal], period: usize) -> Vec<Option<Decimal>> {
    let mut out = vec![None; values.len()];
    if period == 0 || values.len() <= period {
        return out;
    }

    let changes: Vec<Decimal> = values.windows(2).map(|w| w[1] - w[0]).collect();
    for end in period..=changes.len() {
        let window = &changes[end - period..end];
        let gains: Decimal = window.iter().filter(|c| **c > Decimal::ZERO).sum();
        let losses: Decimal = window
            .iter()
            .filter(|c| **c < Decimal::ZERO)
            .map(|c| c.abs())
            .sum();

        let value = if losses.is_zero() {
            if gains.is_zero() {
                Decimal::from(50)
            } else {
                HUNDRED
            }
        } else {
            let rs = gains / losses;
            HUNDRED - HUNDRED / (Decimal::ONE + rs)
        };
        out[end] = Some(value);
    }
    out
}

/// Bollinger bands: `(middle, upper, lower)` with population standard deviation.
#[must_use]
pub fn bollinger(
    values: &[Decimal],
    period: usize,
    width: Decimal,
) -> Vec<Option<(Decimal, Decimal, Decimal)>> {
    if period == 0 {
        return vec![None; values.len()];
    }
    (0..values.len())
        .map(|i| {
            if i + 1 < period {
                return None;
            }
            let window = &values[i + 1 - period..=i];
            let middle = mean(window)?;
            let deviation = population_std_dev(window)?;
            Some((middle, middle + width * deviation, middle - width * deviation))
        })
        .collect()
}

/// MACD line and its signal line.
#[must_use]
pub fn macd(
    values: &[Decimal],
    fast: usize,
    slow: usize,
    signal: usize,
) -> (Vec<Decimal>, Vec<Decimal>) {
    let fast_ema = ema(values, fast);
    let slow_ema = ema(values, slow);
    let line: Vec<Decimal> = fast_ema
        .iter()
        .zip(&slow_ema)
        .map(|(f, s)| *f - *s)
        .collect();
    let signal_line = ema(&line, signal);
    (line, signal_line)
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    fn ramp(n: i64) -> Vec<Decimal> {
        (1..=n).map(Decimal::from).collect()
    }

    #[test]
    fn test_sma_alignment() {
        let out = sma(&ramp(5), 3);
        assert_eq!(out, vec![None, None, Some(dec!(2)), Some(dec!(3)), Some(dec!(4))]);
        assert!(sma(&ramp(5), 0).iter().all(Option::is_none));
    }

    #[test]
    fn test_ema_seeded_with_first_value() {
        let out = ema(&[dec!(10), dec!(20), dec!(20)], 3);
        // alpha = 0.5
        assert_eq!(out, vec![dec!(10), dec!(15), dec!(17.5)]);
    }

    #[test]
    fn test_rsi_extremes() {
        let up = rsi(&ramp(10), 4);
        assert!(up[..4].iter().all(Option::is_none));
        assert_eq!(up[4], Some(dec!(100)));

        let flat = rsi(&[dec!(5); 6], 3);
        assert_eq!(flat[5], Some(dec!(50)));
    }

    #[test]
    fn test_rsi_balanced_moves() {
        let values = vec![dec!(10), dec!(11), dec!(10), dec!(11), dec!(10)];
        let out = rsi(&values, 4);
        assert_eq!(out[4], Some(dec!(50)));
    }

    #[test]
    fn test_bollinger_bands_bracket_the_mean() {
        let values = vec![dec!(2), dec!(4), dec!(4), dec!(4), dec!(5), dec!(5), dec!(7), dec!(9)];
        let out = bollinger(&values, 8, dec!(2));
        assert!(out[6].is_none());
        let Some((middle, upper, lower)) = out[7] else {
            panic!("band defined at the last bar");
        };
        assert_eq!(middle, dec!(5));
        assert!((upper - dec!(9)).abs() < dec!(0.000001));
        assert!((lower - dec!(1)).abs() < dec!(0.000001));
    }

    #[test]
    fn test_macd_positive_in_uptrend() {
        let (line, signal) = macd(&ramp(60), 12, 26, 9);
        assert_eq!(line.len(), 60);
        assert_eq!(line[0], Decimal::ZERO);
        assert!(line[59] > Decimal::ZERO);
        assert!(signal[59] > Decimal::ZERO);
    }
}
