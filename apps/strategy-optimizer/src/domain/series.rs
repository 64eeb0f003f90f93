//! Price series value objects.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::OptimizerError;

/// OHLCV candle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candle {
    /// Bar open time (UTC).
    pub timestamp: DateTime<Utc>,
    /// Candle open price.
    pub open: Decimal,
    /// Candle high price.
    pub high: Decimal,
    /// Candle low price.
    pub low: Decimal,
    /// Candle close price.
    pub close: Decimal,
    /// Candle volume.
    pub volume: Decimal,
}

impl Candle {
    /// Create a new candle.
    #[must_use]
    pub const fn new(
        timestamp: DateTime<Utc>,
        open: Decimal,
        high: Decimal,
        low: Decimal,
        close: Decimal,
        volume: Decimal,
    ) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// Candle whose open, high, low and close are all `price`.
    #[must_use]
    pub const fn flat(timestamp: DateTime<Utc>, price: Decimal, volume: Decimal) -> Self {
        Self::new(timestamp, price, price, price, price, volume)
    }
}

/// Chronologically ordered candles with strictly increasing timestamps.
///
/// Owned by the caller. The optimizer only ever borrows slices of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Candle>", into = "Vec<Candle>")]
pub struct PriceSeries {
    candles: Vec<Candle>,
}

impl PriceSeries {
    /// Validate ordering and wrap the candles.
    ///
    /// # Errors
    ///
    /// Returns [`OptimizerError::Configuration`] if any timestamp is not
    /// strictly greater than its predecessor.
    pub fn new(candles: Vec<Candle>) -> Result<Self, OptimizerError> {
        if let Some(position) = candles
            .windows(2)
            .position(|pair| pair[1].timestamp <= pair[0].timestamp)
        {
            return Err(OptimizerError::configuration(format!(
                "price series timestamps must be strictly increasing (bar {} at {} follows {})",
                position + 1,
                candles[position + 1].timestamp,
                candles[position].timestamp
            )));
        }

        Ok(Self { candles })
    }

    /// Borrow the candles.
    #[must_use]
    pub fn as_slice(&self) -> &[Candle] {
        &self.candles
    }

    /// Number of bars.
    #[must_use]
    pub fn len(&self) -> usize {
        self.candles.len()
    }

    /// Whether the series has no bars.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    /// Timestamp of the first bar.
    #[must_use]
    pub fn start(&self) -> Option<DateTime<Utc>> {
        self.candles.first().map(|c| c.timestamp)
    }

    /// Timestamp of the last bar.
    #[must_use]
    pub fn end(&self) -> Option<DateTime<Utc>> {
        self.candles.last().map(|c| c.timestamp)
    }

    /// The most recent `bars` candles (all of them when `bars` is 0 or too large).
    #[must_use]
    pub fn tail(&self, bars: usize) -> Self {
        if bars == 0 || bars >= self.candles.len() {
            return self.clone();
        }
        Self {
            candles: self.candles[self.candles.len() - bars..].to_vec(),
        }
    }

    /// Consume the series, returning the candles.
    #[must_use]
    pub fn into_inner(self) -> Vec<Candle> {
        self.candles
    }
}

impl AsRef<[Candle]> for PriceSeries {
    fn as_ref(&self) -> &[Candle] {
        &self.candles
    }
}

impl TryFrom<Vec<Candle>> for PriceSeries {
    type Error = OptimizerError;

    fn try_from(candles: Vec<Candle>) -> Result<Self, Self::Error> {
        Self::new(candles)
    }
}

impl From<PriceSeries> for Vec<Candle> {
    fn from(series: PriceSeries) -> Self {
        series.candles
    }
}

/// Closing prices of a slice of candles.
#[must_use]
pub fn closes(candles: &[Candle]) -> Vec<Decimal> {
    candles.iter().map(|c| c.close).collect()
}

/// Position and extent of one segment within the source series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentSummary {
    /// Index of the first bar (inclusive).
    pub start_index: usize,
    /// Index one past the last bar (exclusive).
    pub end_index: usize,
    /// Number of bars.
    pub bars: usize,
    /// Timestamp of the first bar.
    pub start_time: Option<DateTime<Utc>>,
    /// Timestamp of the last bar.
    pub end_time: Option<DateTime<Utc>>,
}

impl SegmentSummary {
    /// Summarize `candles`, which start at `start_index` in the source series.
    #[must_use]
    pub fn new(start_index: usize, candles: &[Candle]) -> Self {
        Self {
            start_index,
            end_index: start_index + candles.len(),
            bars: candles.len(),
            start_time: candles.first().map(|c| c.timestamp),
            end_time: candles.last().map(|c| c.timestamp),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;

    fn candle_at(hour: i64, close: i64) -> Candle {
        let Some(base) = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).single() else {
            panic!("valid base timestamp");
        };
        Candle::flat(
            base + Duration::hours(hour),
            Decimal::new(close, 0),
            Decimal::ONE,
        )
    }

    #[test]
    fn test_series_accepts_increasing_timestamps() {
        let series = PriceSeries::new(vec![candle_at(0, 100), candle_at(1, 101), candle_at(2, 99)]);
        let Ok(series) = series else {
            panic!("increasing timestamps should be accepted");
        };
        assert_eq!(series.len(), 3);
        assert_eq!(closes(series.as_slice())[2], Decimal::new(99, 0));
    }

    #[test]
    fn test_series_rejects_duplicate_timestamp() {
        let result =
            PriceSeries::new(vec![candle_at(0, 100), candle_at(1, 101), candle_at(1, 102)]);
        assert!(matches!(result, Err(OptimizerError::Configuration(_))));
    }

    #[test]
    fn test_series_rejects_out_of_order_timestamp() {
        let result = PriceSeries::new(vec![candle_at(2, 100), candle_at(1, 101)]);
        assert!(result.is_err());
    }

    #[test]
    fn test_tail() {
        let Ok(series) = PriceSeries::new((0..10).map(|h| candle_at(h, 100 + h)).collect()) else {
            panic!("valid series");
        };
        let tail = series.tail(3);
        assert_eq!(tail.len(), 3);
        assert_eq!(tail.as_slice()[0].close, Decimal::new(107, 0));
        assert_eq!(series.tail(0).len(), 10);
        assert_eq!(series.tail(50).len(), 10);
    }

    #[test]
    fn test_deserialize_validates_order() {
        let Ok(series) = PriceSeries::new(vec![candle_at(0, 101), candle_at(1, 100)]) else {
            panic!("ordered input should be accepted");
        };
        let Ok(json) = serde_json::to_string(&series) else {
            panic!("serialization should succeed");
        };
        let Ok(back) = serde_json::from_str::<PriceSeries>(&json) else {
            panic!("ordered json should deserialize");
        };
        assert_eq!(back, series);

        let unordered = serde_json::to_string(&vec![candle_at(1, 100), candle_at(0, 101)])
            .unwrap_or_default();
        assert!(serde_json::from_str::<PriceSeries>(&unordered).is_err());
    }

    #[test]
    fn test_segment_summary() {
        let candles = vec![candle_at(5, 1), candle_at(6, 2)];
        let summary = SegmentSummary::new(5, &candles);
        assert_eq!(summary.start_index, 5);
        assert_eq!(summary.end_index, 7);
        assert_eq!(summary.bars, 2);
        assert_eq!(summary.start_time, Some(candles[0].timestamp));
    }
}
