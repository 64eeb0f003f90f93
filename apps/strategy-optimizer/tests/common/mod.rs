//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use chrono::{Duration, TimeZone, Utc};
use rust_decimal::Decimal;
use strategy_optimizer::{Candle, JsonFilePriceData, PriceFile, PriceSeries, Timeframe};

/// Daily candles: slow uptrend with a superimposed cycle.
pub fn wave_series(n: usize) -> PriceSeries {
    let Some(base) = Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).single() else {
        panic!("valid base timestamp");
    };
    let candles = (0..n)
        .map(|i| {
            let t = i as f64;
            let price = 100.0 + 0.05 * t + 10.0 * (t / 15.0).sin();
            let Ok(close) = Decimal::try_from(price) else {
                panic!("finite price");
            };
            Candle::flat(base + Duration::days(i as i64), close.round_dp(4), Decimal::ONE)
        })
        .collect();
    let Ok(series) = PriceSeries::new(candles) else {
        panic!("generated candles are ordered");
    };
    series
}

/// Write `series` as a price file under `dir`.
pub fn write_price_file(
    dir: &Path,
    symbol: &str,
    timeframe: Timeframe,
    series: PriceSeries,
) -> PathBuf {
    let path = dir.join("prices.json");
    let file = PriceFile {
        symbol: symbol.to_string(),
        timeframe,
        candles: series,
    };
    let Ok(()) = JsonFilePriceData::new(&path).save(&file) else {
        panic!("price file should be written");
    };
    path
}
