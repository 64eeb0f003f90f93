//! Price data adapters.
//!
//! - [`InMemoryPriceData`]: series held in memory, keyed by symbol and timeframe
//! - [`JsonFilePriceData`]: one JSON file per symbol and timeframe

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::application::ports::{PriceDataError, PriceDataPort};
use crate::domain::{PriceSeries, Timeframe};

/// In-memory price data.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPriceData {
    series: HashMap<(String, Timeframe), PriceSeries>,
}

impl InMemoryPriceData {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a series.
    pub fn insert(&mut self, symbol: impl Into<String>, timeframe: Timeframe, series: PriceSeries) {
        self.series.insert((symbol.into(), timeframe), series);
    }
}

impl PriceDataPort for InMemoryPriceData {
    fn fetch(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        lookback: usize,
    ) -> Result<PriceSeries, PriceDataError> {
        self.series
            .get(&(symbol.to_string(), timeframe))
            .map(|series| series.tail(lookback))
            .ok_or_else(|| PriceDataError::NotFound {
                symbol: symbol.to_string(),
                timeframe: timeframe.to_string(),
            })
    }
}

/// On-disk price file layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceFile {
    /// Market symbol.
    pub symbol: String,
    /// Bar timeframe.
    pub timeframe: Timeframe,
    /// Candles, oldest first. Ordering is validated on load.
    pub candles: PriceSeries,
}

/// Price data read from a JSON [`PriceFile`].
///
/// The file is read on every fetch; the optimizer fetches once per run.
#[derive(Debug, Clone)]
pub struct JsonFilePriceData {
    path: PathBuf,
}

impl JsonFilePriceData {
    /// Adapter reading `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// File being read.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and parse the whole file.
    ///
    /// # Errors
    ///
    /// Returns [`PriceDataError::Unavailable`] if the file cannot be read and
    /// [`PriceDataError::Invalid`] if it is not a valid price file (including
    /// out-of-order timestamps).
    pub fn load(&self) -> Result<PriceFile, PriceDataError> {
        let contents =
            std::fs::read_to_string(&self.path).map_err(|e| PriceDataError::Unavailable {
                source_name: self.path.display().to_string(),
                message: e.to_string(),
            })?;
        serde_json::from_str(&contents).map_err(|e| PriceDataError::Invalid(e.to_string()))
    }

    /// Write `file` as pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns [`PriceDataError::Unavailable`] if the file cannot be written.
    pub fn save(&self, file: &PriceFile) -> Result<(), PriceDataError> {
        let unavailable = |message: String| PriceDataError::Unavailable {
            source_name: self.path.display().to_string(),
            message,
        };
        let json = serde_json::to_string_pretty(file).map_err(|e| unavailable(e.to_string()))?;
        std::fs::write(&self.path, json).map_err(|e| unavailable(e.to_string()))
    }
}

impl PriceDataPort for JsonFilePriceData {
    fn fetch(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        lookback: usize,
    ) -> Result<PriceSeries, PriceDataError> {
        let file = self.load()?;
        if !file.symbol.eq_ignore_ascii_case(symbol) || file.timeframe != timeframe {
            return Err(PriceDataError::NotFound {
                symbol: symbol.to_string(),
                timeframe: timeframe.to_string(),
            });
        }

        debug!(
            path = %self.path.display(),
            bars = file.candles.len(),
            lookback,
            "Loaded price file"
        );
        Ok(file.candles.tail(lookback))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimization::testing::indexed_candles;

    fn series(n: usize) -> PriceSeries {
        let Ok(series) = PriceSeries::new(indexed_candles(n)) else {
            panic!("indexed candles are ordered");
        };
        series
    }

    #[test]
    fn test_in_memory_fetch_applies_lookback() {
        let mut data = InMemoryPriceData::new();
        data.insert("BTC/USDT", Timeframe::H1, series(100));

        let Ok(fetched) = data.fetch("BTC/USDT", Timeframe::H1, 30) else {
            panic!("series should be found");
        };
        assert_eq!(fetched.len(), 30);
        assert!(matches!(
            data.fetch("BTC/USDT", Timeframe::H4, 30),
            Err(PriceDataError::NotFound { .. })
        ));
    }

    #[test]
    fn test_json_file_round_trip() {
        let Ok(dir) = tempfile::tempdir() else {
            panic!("temp dir should be created");
        };
        let adapter = JsonFilePriceData::new(dir.path().join("btc_1d.json"));
        let file = PriceFile {
            symbol: "BTC/USDT".to_string(),
            timeframe: Timeframe::D1,
            candles: series(50),
        };
        let Ok(()) = adapter.save(&file) else {
            panic!("price file should be written");
        };

        let Ok(fetched) = adapter.fetch("btc/usdt", Timeframe::D1, 0) else {
            panic!("price file should be read");
        };
        assert_eq!(fetched, file.candles);
        assert!(matches!(
            adapter.fetch("ETH/USDT", Timeframe::D1, 0),
            Err(PriceDataError::NotFound { .. })
        ));
    }

    #[test]
    fn test_json_file_rejects_unordered_candles() {
        let Ok(dir) = tempfile::tempdir() else {
            panic!("temp dir should be created");
        };
        let path = dir.path().join("bad.json");
        let mut candles = indexed_candles(3);
        candles.swap(0, 2);
        let body = serde_json::json!({
            "symbol": "BTC/USDT",
            "timeframe": "1d",
            "candles": candles,
        });
        let Ok(()) = std::fs::write(&path, body.to_string()) else {
            panic!("temp file should be writable");
        };

        let result = JsonFilePriceData::new(path).fetch("BTC/USDT", Timeframe::D1, 0);
        assert!(matches!(result, Err(PriceDataError::Invalid(_))));
    }

    #[test]
    fn test_missing_file_is_unavailable() {
        let adapter = JsonFilePriceData::new("/nonexistent/prices.json");
        assert!(matches!(
            adapter.fetch("BTC/USDT", Timeframe::D1, 0),
            Err(PriceDataError::Unavailable { .. })
        ));
    }
}
