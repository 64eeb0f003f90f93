//! Rolling optimization integration tests
//!
//! Anchored windows over a synthetic series with the bundled strategies.

#![allow(clippy::unwrap_used)]

mod common;

use std::sync::Arc;

use rust_decimal::Decimal;
use strategy_optimizer::backtest::CostConfig;
use strategy_optimizer::optimization::ParameterGrid;
use strategy_optimizer::{
    BacktestEvaluator, Config, JsonFilePriceData, MetricKind, OptimizationMode,
    OptimizationReport, OptimizeRequest, OptimizerError, RollingConfig, RollingOptimizer,
    RunOptimizationUseCase, SearchConfig, StrategyRegistry, Timeframe, preset_grid,
};

use common::{wave_series, write_price_file};

fn optimizer(config: RollingConfig) -> RollingOptimizer<BacktestEvaluator> {
    let Ok(optimizer) = RollingOptimizer::new(
        BacktestEvaluator::new(MetricKind::TotalReturn),
        config,
        SearchConfig::default(),
    ) else {
        panic!("valid rolling configuration");
    };
    optimizer
}

#[test]
fn test_windows_are_anchored_and_contiguous() {
    let registry = StrategyRegistry::with_defaults();
    let (Ok(factory), Ok(grid)) = (registry.get("sma_crossover"), preset_grid("sma_crossover"))
    else {
        panic!("sma_crossover is registered with a preset");
    };
    // Test windows of 250 bars cover the longest slow SMA warm-up (199 bars).
    let series = wave_series(2500);

    let result = match optimizer(RollingConfig::default()).optimize(
        factory,
        &grid,
        series.as_slice(),
        &CostConfig::default(),
    ) {
        Ok(r) => r,
        Err(e) => panic!("rolling optimization should succeed: {e}"),
    };

    assert_eq!(result.aggregate.total_windows, 5);
    assert_eq!(result.windows.len(), 5);
    for (i, window) in result.windows.iter().enumerate() {
        assert_eq!(window.index, i);
        assert_eq!(window.train.start_index, 0);
        assert_eq!(window.train.end_index, window.test.start_index);
        assert_eq!(window.test.bars, 250);
    }
    for pair in result.windows.windows(2) {
        assert_eq!(pair[0].test.end_index, pair[1].test.start_index);
        assert_eq!(pair[1].train.end_index, pair[0].test.end_index);
    }

    let aggregate = &result.aggregate;
    assert!(aggregate.min <= aggregate.mean && aggregate.mean <= aggregate.max);
    assert!(aggregate.consistency >= Decimal::ZERO && aggregate.consistency <= Decimal::ONE);
    assert!(result.windows.iter().any(|w| w.best_params == result.consensus_params));
    assert_eq!(result.parameter_stability.parameters.len(), 2);
}

#[test]
fn test_nested_validation_reports_validation_metric() {
    let registry = StrategyRegistry::with_defaults();
    let (Ok(factory), Ok(grid)) = (registry.get("macd_momentum"), preset_grid("macd_momentum"))
    else {
        panic!("macd_momentum is registered with a preset");
    };
    let series = wave_series(1200);
    let config = RollingConfig {
        n_splits: 3,
        test_size_frac: 0.15,
        nested_validation_frac: Some(0.3),
        ..Default::default()
    };

    let costs = CostConfig::default();
    let Ok(result) = optimizer(config).optimize(factory, &grid, series.as_slice(), &costs) else {
        panic!("nested rolling optimization should succeed");
    };

    assert_eq!(result.windows.len(), 3);
    assert!(result.windows.iter().all(|w| w.validation_metric.is_some()));
}

#[test]
fn test_every_window_failing_is_fatal() {
    let registry = StrategyRegistry::with_defaults();
    let Ok(factory) = registry.get("sma_crossover") else {
        panic!("sma_crossover is registered");
    };
    // Slow SMA warm-up exceeds every train window (seed window is 90 bars).
    let Ok(grid) = ParameterGrid::builder()
        .int("fast_period", [10])
        .int("slow_period", [400])
        .build()
    else {
        panic!("valid grid");
    };
    let series = wave_series(300);

    let result = optimizer(RollingConfig::default()).optimize(
        factory,
        &grid,
        series.as_slice(),
        &CostConfig::default(),
    );
    assert!(matches!(
        result,
        Err(OptimizerError::AllWindowsFailed { total: 5, .. })
    ));
}

#[test]
fn test_rolling_request_through_json_file() {
    let Ok(dir) = tempfile::tempdir() else {
        panic!("temp dir should be created");
    };
    let path = write_price_file(dir.path(), "ETH/USDT", Timeframe::D1, wave_series(1000));

    let mut config = Config::default();
    config.rolling.n_splits = 4;
    let use_case = RunOptimizationUseCase::new(Arc::new(JsonFilePriceData::new(path)), config);
    let request = OptimizeRequest::new("bollinger-breakout", "ETH/USDT", Timeframe::D1, 0)
        .with_metric(MetricKind::TotalReturn)
        .with_mode(OptimizationMode::Rolling);

    let report = match use_case.execute(&request) {
        Ok(r) => r,
        Err(e) => panic!("rolling optimization should succeed: {e}"),
    };
    let OptimizationReport::Rolling(result) = report else {
        panic!("rolling report expected");
    };
    assert_eq!(result.strategy, "bollinger_breakout");
    assert_eq!(result.aggregate.total_windows, 4);
    assert_eq!(
        result.aggregate.successful_windows,
        result.windows.len()
    );
}
