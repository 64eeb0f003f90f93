//! Analysis functions for rolling windows.

use std::collections::BTreeMap;

use rust_decimal::Decimal;

use super::types::{AggregatedMetrics, ParameterDispersion, ParameterStability, WindowResult};
use crate::backtest::math::{mean, sample_variance, sqrt_decimal};
use crate::domain::ParameterSet;

/// Coefficient of variation above which a parameter is unstable.
const UNSTABLE_CV: Decimal = Decimal::from_parts(5, 0, 0, false, 1);

/// Aggregate test metrics from successful windows.
///
/// Consistency counts failed windows as not positive.
#[must_use]
pub fn aggregate_test_metrics(windows: &[WindowResult], total_windows: usize) -> AggregatedMetrics {
    let metrics: Vec<Decimal> = windows.iter().map(|w| w.test_metric).collect();
    let Some(avg) = mean(&metrics) else {
        return AggregatedMetrics {
            total_windows,
            ..Default::default()
        };
    };

    let positive_windows = metrics.iter().filter(|m| **m > Decimal::ZERO).count();
    let attempted = total_windows.max(metrics.len());

    AggregatedMetrics {
        total_windows,
        successful_windows: metrics.len(),
        mean: avg,
        std_dev: sample_variance(&metrics).and_then(sqrt_decimal),
        min: metrics.iter().copied().min().unwrap_or_default(),
        max: metrics.iter().copied().max().unwrap_or_default(),
        positive_windows,
        consistency: Decimal::from(positive_windows as u64) / Decimal::from(attempted as u64),
    }
}

/// Analyze parameter stability across windows.
#[must_use]
pub fn analyze_parameter_stability(windows: &[WindowResult]) -> ParameterStability {
    if windows.is_empty() {
        return ParameterStability::default();
    }

    let mut by_name: BTreeMap<&str, Vec<String>> = BTreeMap::new();
    let mut numeric: BTreeMap<&str, Vec<Decimal>> = BTreeMap::new();

    for window in windows {
        for (name, value) in window.best_params.iter() {
            by_name.entry(name).or_default().push(value.to_string());
            if let Some(v) = value.as_float().and_then(|f| Decimal::try_from(f).ok()) {
                numeric.entry(name).or_default().push(v);
            }
        }
    }

    let mut parameters = Vec::with_capacity(by_name.len());
    let mut unstable_parameters = Vec::new();

    for (name, mut rendered) in by_name {
        rendered.sort();
        rendered.dedup();

        let values = numeric.get(name).map(Vec::as_slice).unwrap_or_default();
        let avg = mean(values);
        let variance = sample_variance(values);
        let coefficient_of_variation = match (avg, variance.and_then(sqrt_decimal)) {
            (Some(m), Some(sd)) if !m.is_zero() => Some(sd / m.abs()),
            _ => None,
        };

        if coefficient_of_variation.is_some_and(|cv| cv > UNSTABLE_CV) {
            unstable_parameters.push(name.to_string());
        }

        parameters.push(ParameterDispersion {
            name: name.to_string(),
            distinct_values: rendered.len(),
            mean: avg,
            variance,
            coefficient_of_variation,
        });
    }

    let stability_score = if parameters.is_empty() {
        Decimal::ONE
    } else {
        let stable = parameters.len() - unstable_parameters.len();
        Decimal::from(stable as u64) / Decimal::from(parameters.len() as u64)
    };

    let warning = if unstable_parameters.is_empty() {
        None
    } else {
        Some(format!(
            "Parameters with high variance: {}",
            unstable_parameters.join(", ")
        ))
    };

    ParameterStability {
        parameters,
        unstable_parameters,
        stability_score,
        warning,
    }
}

/// Most frequently selected parameter set; the earliest window wins ties.
#[must_use]
pub fn consensus_params(windows: &[WindowResult]) -> ParameterSet {
    let mut best: Option<(&ParameterSet, usize)> = None;
    for window in windows {
        let count = windows
            .iter()
            .filter(|w| w.best_params == window.best_params)
            .count();
        if best.is_none_or(|(_, c)| count > c) {
            best = Some((&window.best_params, count));
        }
    }
    best.map(|(p, _)| p.clone()).unwrap_or_default()
}
