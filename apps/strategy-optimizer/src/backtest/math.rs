//! Statistical math utilities over decimals.
//!
//! Shared by the reference backtester, the indicator library and the rolling
//! window aggregation.

use rust_decimal::Decimal;

use super::constants::{TOLERANCE, TWO};

/// Arithmetic mean.
#[must_use]
pub fn mean(values: &[Decimal]) -> Option<Decimal> {
    if values.is_empty() {
        return None;
    }
    let sum: Decimal = values.iter().sum();
    Some(sum / Decimal::from(values.len() as u64))
}

/// Sample variance (n - 1 denominator).
#[must_use]
pub fn sample_variance(values: &[Decimal]) -> Option<Decimal> {
    if values.len() < 2 {
        return None;
    }

    let avg = mean(values)?;
    let variance_sum: Decimal = values.iter().map(|v| (*v - avg) * (*v - avg)).sum();
    Some(variance_sum / Decimal::from((values.len() - 1) as u64))
}

/// Sample standard deviation.
#[must_use]
pub fn std_dev(values: &[Decimal]) -> Option<Decimal> {
    sqrt_decimal(sample_variance(values)?)
}

/// Population standard deviation (n denominator), as used by Bollinger bands.
#[must_use]
pub fn population_std_dev(values: &[Decimal]) -> Option<Decimal> {
    let avg = mean(values)?;
    let variance_sum: Decimal = values.iter().map(|v| (*v - avg) * (*v - avg)).sum();
    sqrt_decimal(variance_sum / Decimal::from(values.len() as u64))
}

/// Downside deviation: root mean square of negative values over the full count.
#[must_use]
pub fn downside_deviation(values: &[Decimal]) -> Option<Decimal> {
    if values.len() < 2 {
        return None;
    }

    let variance_sum: Decimal = values
        .iter()
        .filter(|v| **v < Decimal::ZERO)
        .map(|v| *v * *v)
        .sum();

    sqrt_decimal(variance_sum / Decimal::from(values.len() as u64))
}

/// Square root by Newton's method.
#[must_use]
pub fn sqrt_decimal(value: Decimal) -> Option<Decimal> {
    if value < Decimal::ZERO {
        return None;
    }
    if value == Decimal::ZERO {
        return Some(Decimal::ZERO);
    }

    let mut guess = if value > Decimal::ONE {
        value / TWO
    } else {
        Decimal::ONE
    };

    for _ in 0..100 {
        let next = (guess + value / guess) / TWO;
        if (next - guess).abs() < TOLERANCE {
            return Some(next);
        }
        guess = next;
    }

    Some(guess)
}
