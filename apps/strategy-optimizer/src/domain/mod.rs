//! Domain Layer
//!
//! Value objects shared by the optimizer core and its collaborators:
//!
//! - [`series`]: candles and chronologically validated price series
//! - [`timeframe`]: bar timeframes and annualization
//! - [`params`]: parameter values and immutable parameter sets
//! - [`signal`]: long/flat/short signals emitted by strategies

pub mod params;
pub mod series;
pub mod signal;
pub mod timeframe;

pub use params::{ParamValue, ParameterSet};
pub use series::{Candle, PriceSeries, SegmentSummary, closes};
pub use signal::Signal;
pub use timeframe::Timeframe;
