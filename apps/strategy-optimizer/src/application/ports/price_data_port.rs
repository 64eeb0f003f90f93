//! Price Data Port (Driven Port)
//!
//! Source of historical candles. Data returned through this port is treated
//! as already validated: the series type guarantees chronological order.

use crate::domain::{PriceSeries, Timeframe};

/// Price data error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PriceDataError {
    /// No data for this symbol and timeframe.
    #[error("No price data for {symbol} ({timeframe})")]
    NotFound {
        /// Requested symbol.
        symbol: String,
        /// Requested timeframe.
        timeframe: String,
    },

    /// The source could not be read.
    #[error("Failed to read price data from '{source_name}': {message}")]
    Unavailable {
        /// File path or source name.
        source_name: String,
        /// Error details.
        message: String,
    },

    /// The source was read but its contents are unusable.
    #[error("Invalid price data: {0}")]
    Invalid(String),
}

/// Port for loading historical price series.
pub trait PriceDataPort: Send + Sync {
    /// Fetch the most recent `lookback` bars (all bars when `lookback` is 0).
    ///
    /// # Errors
    ///
    /// Returns [`PriceDataError`] when the series is missing or unreadable.
    fn fetch(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        lookback: usize,
    ) -> Result<PriceSeries, PriceDataError>;
}
