//! Types for rolling (anchored) walk-forward optimization.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::backtest::PerformanceSummary;
use crate::domain::{ParameterSet, SegmentSummary};
use crate::error::{OptimizerError, Phase};
use crate::optimization::candidate::CandidateFailure;

/// Configuration for rolling optimization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RollingConfig {
    /// Number of train/test windows.
    pub n_splits: usize,
    /// Fraction of the series in each test window.
    pub test_size_frac: f64,
    /// Fraction of the series in the first train window.
    pub initial_train_frac: f64,
    /// When set, the tail of each train window (this fraction of it) is held
    /// out for selection; otherwise selection uses the train metric.
    pub nested_validation_frac: Option<f64>,
    /// Minimum bars in every segment.
    pub min_segment_len: usize,
}

impl Default for RollingConfig {
    fn default() -> Self {
        Self {
            n_splits: 5,
            test_size_frac: 0.1,
            initial_train_frac: 0.3,
            nested_validation_frac: None,
            min_segment_len: 10,
        }
    }
}

impl RollingConfig {
    /// Check ranges that do not depend on the series length.
    ///
    /// # Errors
    ///
    /// Returns [`OptimizerError::Configuration`] for a zero split count, a
    /// fraction outside `(0, 1)`, or windows that do not fit in the series.
    pub fn validate(&self) -> Result<(), OptimizerError> {
        if self.n_splits == 0 {
            return Err(OptimizerError::configuration("n_splits must be at least 1"));
        }
        let fractions = [
            ("test_size_frac", Some(self.test_size_frac)),
            ("initial_train_frac", Some(self.initial_train_frac)),
            ("nested_validation_frac", self.nested_validation_frac),
        ];
        for (name, value) in fractions {
            if let Some(v) = value
                && (!v.is_finite() || v <= 0.0 || v >= 1.0)
            {
                return Err(OptimizerError::configuration(format!(
                    "{name} must be in (0, 1), got {v}"
                )));
            }
        }
        let required = self.initial_train_frac + self.n_splits as f64 * self.test_size_frac;
        if required > 1.0 + 1e-9 {
            return Err(OptimizerError::configuration(format!(
                "initial_train_frac + n_splits x test_size_frac = {required:.3} exceeds 1"
            )));
        }
        Ok(())
    }
}

/// Outcome of one successful window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowResult {
    /// Window number, starting at 0.
    pub index: usize,
    /// Train segment (including any nested validation tail).
    pub train: SegmentSummary,
    /// Test segment.
    pub test: SegmentSummary,
    /// Parameters selected in this window.
    pub best_params: ParameterSet,
    /// Selected set's search score.
    pub train_metric: Decimal,
    /// Selected set's nested validation score, when nested validation is on.
    pub validation_metric: Option<Decimal>,
    /// Selected set's test score.
    pub test_metric: Decimal,
    /// Backtest statistics of the test evaluation.
    pub test_performance: PerformanceSummary,
    /// Number of candidates that survived search.
    pub survivors: usize,
    /// Candidates excluded in this window.
    pub failures: Vec<CandidateFailure>,
}

/// A window that produced no result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowFailure {
    /// Window number.
    pub index: usize,
    /// Train segment.
    pub train: SegmentSummary,
    /// Test segment.
    pub test: SegmentSummary,
    /// Phase that failed, when attributable.
    pub phase: Option<Phase>,
    /// Failure message.
    pub reason: String,
}

/// Aggregated test metrics over successful windows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregatedMetrics {
    /// Windows attempted.
    pub total_windows: usize,
    /// Windows that produced a test metric.
    pub successful_windows: usize,
    /// Mean test metric.
    pub mean: Decimal,
    /// Sample standard deviation of the test metric (needs two windows).
    pub std_dev: Option<Decimal>,
    /// Lowest test metric.
    pub min: Decimal,
    /// Highest test metric.
    pub max: Decimal,
    /// Windows with a positive test metric.
    pub positive_windows: usize,
    /// `positive_windows / total_windows`.
    pub consistency: Decimal,
}

impl Default for AggregatedMetrics {
    fn default() -> Self {
        Self {
            total_windows: 0,
            successful_windows: 0,
            mean: Decimal::ZERO,
            std_dev: None,
            min: Decimal::ZERO,
            max: Decimal::ZERO,
            positive_windows: 0,
            consistency: Decimal::ZERO,
        }
    }
}

/// Dispersion of one parameter across windows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterDispersion {
    /// Parameter name.
    pub name: String,
    /// Number of distinct values chosen.
    pub distinct_values: usize,
    /// Mean of numeric values.
    pub mean: Option<Decimal>,
    /// Sample variance of numeric values.
    pub variance: Option<Decimal>,
    /// Standard deviation over absolute mean.
    pub coefficient_of_variation: Option<Decimal>,
}

/// Parameter stability analysis across windows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterStability {
    /// Per-parameter dispersion, by name.
    pub parameters: Vec<ParameterDispersion>,
    /// Parameters whose coefficient of variation exceeds 0.5.
    pub unstable_parameters: Vec<String>,
    /// Fraction of parameters that are stable (1 = all stable).
    pub stability_score: Decimal,
    /// Warning if parameters are unstable.
    pub warning: Option<String>,
}

impl Default for ParameterStability {
    fn default() -> Self {
        Self {
            parameters: Vec::new(),
            unstable_parameters: Vec::new(),
            stability_score: Decimal::ONE,
            warning: None,
        }
    }
}

/// Outcome of a rolling optimization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollingOptimizationResult {
    /// Strategy name.
    pub strategy: String,
    /// Optimized metric.
    pub metric: String,
    /// Successful windows, in time order.
    pub windows: Vec<WindowResult>,
    /// Failed windows, in time order.
    pub failed_windows: Vec<WindowFailure>,
    /// Test metric aggregate.
    pub aggregate: AggregatedMetrics,
    /// Stability of the selected parameters.
    pub parameter_stability: ParameterStability,
    /// Most frequently selected parameter set (earliest wins ties).
    pub consensus_params: ParameterSet,
}
