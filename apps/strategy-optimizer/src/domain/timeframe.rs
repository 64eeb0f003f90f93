//! Bar timeframe value object.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::OptimizerError;

/// Candle timeframe. Crypto markets trade around the clock, so annualization
/// uses calendar time rather than exchange sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Timeframe {
    /// One minute.
    #[serde(rename = "1m")]
    M1,
    /// Five minutes.
    #[serde(rename = "5m")]
    M5,
    /// Fifteen minutes.
    #[serde(rename = "15m")]
    M15,
    /// Thirty minutes.
    #[serde(rename = "30m")]
    M30,
    /// One hour.
    #[serde(rename = "1h")]
    H1,
    /// Four hours.
    #[serde(rename = "4h")]
    H4,
    /// One day.
    #[serde(rename = "1d")]
    D1,
    /// One week.
    #[serde(rename = "1w")]
    W1,
}

impl Timeframe {
    /// All supported timeframes, shortest first.
    pub const ALL: [Self; 8] = [
        Self::M1,
        Self::M5,
        Self::M15,
        Self::M30,
        Self::H1,
        Self::H4,
        Self::D1,
        Self::W1,
    ];

    /// Canonical label (e.g. "1h").
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::M1 => "1m",
            Self::M5 => "5m",
            Self::M15 => "15m",
            Self::M30 => "30m",
            Self::H1 => "1h",
            Self::H4 => "4h",
            Self::D1 => "1d",
            Self::W1 => "1w",
        }
    }

    /// Number of bars in a 365-day year.
    #[must_use]
    pub const fn periods_per_year(&self) -> u32 {
        match self {
            Self::M1 => 525_600,
            Self::M5 => 105_120,
            Self::M15 => 35_040,
            Self::M30 => 17_520,
            Self::H1 => 8_760,
            Self::H4 => 2_190,
            Self::D1 => 365,
            Self::W1 => 52,
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Timeframe {
    type Err = OptimizerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|tf| tf.as_str() == normalized)
            .ok_or_else(|| {
                let known: Vec<&str> = Self::ALL.iter().map(Self::as_str).collect();
                OptimizerError::configuration(format!(
                    "unknown timeframe '{s}' (expected one of {})",
                    known.join(", ")
                ))
            })
    }
}
