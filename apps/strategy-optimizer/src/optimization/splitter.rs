//! Chronological data splitting.
//!
//! Segments are borrowed sub-slices of the caller's series; nothing is
//! copied. Boundaries use floored fractional indices, so a 1000-bar series
//! split 0.6/0.2 yields 600/200/200 bars.

use std::ops::Range;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{Candle, SegmentSummary};
use crate::error::OptimizerError;

/// Slack allowed when checking fraction sums.
const FRACTION_EPSILON: f64 = 1e-9;

/// Three-way split configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitConfig {
    /// Fraction of bars in the train segment.
    pub train_frac: f64,
    /// Fraction of bars in the validation segment.
    pub validation_frac: f64,
    /// Minimum bars in each segment.
    pub min_segment_len: usize,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            train_frac: 0.6,
            validation_frac: 0.2,
            min_segment_len: 1,
        }
    }
}

impl SplitConfig {
    /// Test fraction implied by the other two.
    #[must_use]
    pub fn test_frac(&self) -> f64 {
        1.0 - self.train_frac - self.validation_frac
    }

    /// Check fraction ranges.
    ///
    /// # Errors
    ///
    /// Returns [`OptimizerError::Configuration`] unless both fractions are
    /// finite and positive and sum to less than one.
    pub fn validate(&self) -> Result<(), OptimizerError> {
        validate_three_way(self.train_frac, self.validation_frac)
    }
}

fn validate_fraction(name: &str, value: f64) -> Result<(), OptimizerError> {
    if !value.is_finite() || value <= 0.0 || value >= 1.0 {
        return Err(OptimizerError::configuration(format!(
            "{name} must be in (0, 1), got {value}"
        )));
    }
    Ok(())
}

fn validate_three_way(train_frac: f64, val_frac: f64) -> Result<(), OptimizerError> {
    validate_fraction("train_frac", train_frac)?;
    validate_fraction("validation_frac", val_frac)?;
    if train_frac + val_frac >= 1.0 {
        return Err(OptimizerError::configuration(format!(
            "train_frac + validation_frac must be below 1 to leave a test segment, got {}",
            train_frac + val_frac
        )));
    }
    Ok(())
}

fn floor_index(len: usize, frac: f64) -> usize {
    (len as f64 * frac).floor() as usize
}

/// Train, validation and test segments of one series.
///
/// Their concatenation is the original series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataSplit<'a, T = Candle> {
    /// Earliest segment, used for grid search.
    pub train: &'a [T],
    /// Middle segment, used for selection.
    pub validation: &'a [T],
    /// Latest segment, evaluated once.
    pub test: &'a [T],
}

impl<T> DataSplit<'_, T> {
    /// Index range of the train segment in the source series.
    #[must_use]
    pub const fn train_range(&self) -> Range<usize> {
        0..self.train.len()
    }

    /// Index range of the validation segment.
    #[must_use]
    pub const fn validation_range(&self) -> Range<usize> {
        self.train.len()..self.train.len() + self.validation.len()
    }

    /// Index range of the test segment.
    #[must_use]
    pub const fn test_range(&self) -> Range<usize> {
        let start = self.train.len() + self.validation.len();
        start..start + self.test.len()
    }
}

impl DataSplit<'_, Candle> {
    /// Positions and time bounds of the three segments.
    #[must_use]
    pub fn summary(&self) -> SplitSummary {
        SplitSummary {
            train: SegmentSummary::new(0, self.train),
            validation: SegmentSummary::new(self.validation_range().start, self.validation),
            test: SegmentSummary::new(self.test_range().start, self.test),
        }
    }
}

/// Serializable description of a three-way split.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitSummary {
    /// Train segment.
    pub train: SegmentSummary,
    /// Validation segment.
    pub validation: SegmentSummary,
    /// Test segment.
    pub test: SegmentSummary,
}

/// One anchored walk-forward window.
///
/// `train` always starts at the first bar; `test` immediately follows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WalkForwardSplit<'a, T = Candle> {
    /// Window number, starting at 0.
    pub index: usize,
    /// Expanding train segment.
    pub train: &'a [T],
    /// Out-of-sample segment.
    pub test: &'a [T],
}

impl<T> WalkForwardSplit<'_, T> {
    /// Index range of the train segment.
    #[must_use]
    pub const fn train_range(&self) -> Range<usize> {
        0..self.train.len()
    }

    /// Index range of the test segment.
    #[must_use]
    pub const fn test_range(&self) -> Range<usize> {
        self.train.len()..self.train.len() + self.test.len()
    }
}

/// Time-series aware splitter.
#[derive(Debug, Clone, PartialEq)]
pub struct DataSplitter {
    min_segment_len: usize,
    initial_train_frac: f64,
}

impl Default for DataSplitter {
    fn default() -> Self {
        Self {
            min_segment_len: 1,
            initial_train_frac: 0.3,
        }
    }
}

impl DataSplitter {
    /// Splitter requiring at least one bar per segment and a 30% training seed.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the minimum bars per segment (clamped to at least 1).
    #[must_use]
    pub fn with_min_segment_len(mut self, bars: usize) -> Self {
        self.min_segment_len = bars.max(1);
        self
    }

    /// Set the fraction of the series reserved as the first rolling train window.
    #[must_use]
    pub const fn with_initial_train_frac(mut self, frac: f64) -> Self {
        self.initial_train_frac = frac;
        self
    }

    /// Minimum bars per segment.
    #[must_use]
    pub const fn min_segment_len(&self) -> usize {
        self.min_segment_len
    }

    /// Split `series` into train, validation and test.
    ///
    /// # Errors
    ///
    /// - [`OptimizerError::Configuration`] for invalid fractions or an empty test segment.
    /// - [`OptimizerError::InsufficientData`] for an empty series or a segment
    ///   shorter than the minimum segment length.
    pub fn split<'a, T>(
        &self,
        series: &'a [T],
        train_frac: f64,
        val_frac: f64,
    ) -> Result<DataSplit<'a, T>, OptimizerError> {
        validate_three_way(train_frac, val_frac)?;

        let n = series.len();
        if n == 0 {
            return Err(OptimizerError::insufficient_data(
                "price series",
                self.min_segment_len * 3,
                0,
            ));
        }

        let train_end = floor_index(n, train_frac);
        let val_end = floor_index(n, train_frac + val_frac).max(train_end);
        if val_end >= n {
            return Err(OptimizerError::configuration(format!(
                "fractions {train_frac}/{val_frac} leave no test bars in a {n}-bar series"
            )));
        }

        let split = DataSplit {
            train: &series[..train_end],
            validation: &series[train_end..val_end],
            test: &series[val_end..],
        };

        for (context, len) in [
            ("train segment", split.train.len()),
            ("validation segment", split.validation.len()),
            ("test segment", split.test.len()),
        ] {
            if len < self.min_segment_len {
                return Err(OptimizerError::insufficient_data(
                    context,
                    self.min_segment_len,
                    len,
                ));
            }
        }

        debug!(
            train = split.train.len(),
            validation = split.validation.len(),
            test = split.test.len(),
            "Split series"
        );

        Ok(split)
    }

    /// Anchored, expanding-window splits.
    ///
    /// Window `i` trains on `[0, seed + i*test_len)` and tests on the next
    /// `test_len` bars, where `seed = floor(n * initial_train_frac)` and
    /// `test_len = floor(n * test_size_frac)`.
    ///
    /// # Errors
    ///
    /// - [`OptimizerError::Configuration`] if `n_splits` is zero, a fraction
    ///   is out of range, or `initial_train_frac + n_splits * test_size_frac > 1`.
    /// - [`OptimizerError::InsufficientData`] if the seed or test window is
    ///   shorter than the minimum segment length, or the windows overrun the series.
    pub fn walk_forward_splits<'a, T>(
        &self,
        series: &'a [T],
        n_splits: usize,
        test_size_frac: f64,
    ) -> Result<Vec<WalkForwardSplit<'a, T>>, OptimizerError> {
        if n_splits == 0 {
            return Err(OptimizerError::configuration("n_splits must be at least 1"));
        }
        validate_fraction("test_size_frac", test_size_frac)?;
        validate_fraction("initial_train_frac", self.initial_train_frac)?;

        let required_frac = self.initial_train_frac + n_splits as f64 * test_size_frac;
        if required_frac > 1.0 + FRACTION_EPSILON {
            return Err(OptimizerError::configuration(format!(
                "initial_train_frac {} + {n_splits} x test_size_frac {test_size_frac} exceeds the series ({required_frac:.3})",
                self.initial_train_frac
            )));
        }

        let n = series.len();
        let test_len = floor_index(n, test_size_frac);
        let seed = floor_index(n, self.initial_train_frac);

        if test_len < self.min_segment_len {
            return Err(OptimizerError::insufficient_data(
                "rolling test window",
                self.min_segment_len,
                test_len,
            ));
        }
        if seed < self.min_segment_len {
            return Err(OptimizerError::insufficient_data(
                "initial training window",
                self.min_segment_len,
                seed,
            ));
        }
        let required = seed + n_splits * test_len;
        if required > n {
            return Err(OptimizerError::insufficient_data(
                format!("{n_splits} walk-forward windows"),
                required,
                n,
            ));
        }

        let splits: Vec<_> = (0..n_splits)
            .map(|i| {
                let train_end = seed + i * test_len;
                WalkForwardSplit {
                    index: i,
                    train: &series[..train_end],
                    test: &series[train_end..train_end + test_len],
                }
            })
            .collect();

        debug!(
            windows = splits.len(),
            seed,
            test_len,
            "Created walk-forward splits"
        );

        Ok(splits)
    }
}
