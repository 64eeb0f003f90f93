//! Types for three-way walk-forward optimization.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::backtest::PerformanceSummary;
use crate::domain::ParameterSet;
use crate::optimization::candidate::{CandidateFailure, RankedCandidate};
use crate::optimization::search::SearchConfig;
use crate::optimization::splitter::{SplitConfig, SplitSummary};

/// Configuration for a three-way walk-forward optimization.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WalkForwardConfig {
    /// Segment fractions and minimum length.
    pub split: SplitConfig,
    /// Candidate evaluation settings.
    pub search: SearchConfig,
}

/// Generalization verdict from the validation-to-test degradation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeneralizationStatus {
    /// Degradation below 10%.
    Good,
    /// Degradation below 25%.
    Moderate,
    /// Degradation of 25% or more.
    Overfit,
    /// Degradation undefined (zero validation metric).
    Unknown,
}

impl GeneralizationStatus {
    /// Classify a relative degradation.
    #[must_use]
    pub fn from_degradation(degradation: Option<Decimal>) -> Self {
        match degradation {
            Some(d) if d < Decimal::new(10, 2) => Self::Good,
            Some(d) if d < Decimal::new(25, 2) => Self::Moderate,
            Some(_) => Self::Overfit,
            None => Self::Unknown,
        }
    }

    /// Human-readable label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Good => "Good generalization",
            Self::Moderate => "Moderate overfitting",
            Self::Overfit => "Significant overfitting",
            Self::Unknown => "Undetermined",
        }
    }
}

/// Relative metric degradation between consecutive segments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverfittingCheck {
    /// `|train - validation| / |train|`.
    pub train_to_validation: Option<Decimal>,
    /// `|validation - test| / |validation|`.
    pub validation_to_test: Option<Decimal>,
    /// Verdict based on `validation_to_test`.
    pub status: GeneralizationStatus,
}

impl OverfittingCheck {
    /// Compare the selected candidate's three metrics.
    #[must_use]
    pub fn new(train: Decimal, validation: Decimal, test: Decimal) -> Self {
        let validation_to_test = relative_degradation(validation, test);
        Self {
            train_to_validation: relative_degradation(train, validation),
            validation_to_test,
            status: GeneralizationStatus::from_degradation(validation_to_test),
        }
    }
}

/// `|from - to| / |from|`, or `None` when `from` is zero.
#[must_use]
pub fn relative_degradation(from: Decimal, to: Decimal) -> Option<Decimal> {
    if from.is_zero() {
        return None;
    }
    (from - to).abs().checked_div(from.abs())
}

/// Outcome of one three-way walk-forward optimization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptimizationResult {
    /// Strategy name.
    pub strategy: String,
    /// Optimized metric.
    pub metric: String,
    /// Selected parameter set.
    pub best_params: ParameterSet,
    /// Selected set's train score.
    pub train_metric: Decimal,
    /// Selected set's validation score.
    pub validation_metric: Decimal,
    /// Selected set's single test score.
    pub test_metric: Decimal,
    /// Backtest statistics of the test evaluation.
    pub test_performance: PerformanceSummary,
    /// Search survivors ranked by train metric.
    pub ranking: Vec<RankedCandidate>,
    /// Candidates excluded during search or selection.
    pub failures: Vec<CandidateFailure>,
    /// Number of grid candidates.
    pub candidates_total: usize,
    /// Segment geometry.
    pub split: SplitSummary,
    /// Degradation across segments.
    pub overfitting: OverfittingCheck,
}

impl OptimizationResult {
    /// The `n` best rows of the train ranking.
    #[must_use]
    pub fn top(&self, n: usize) -> &[RankedCandidate] {
        &self.ranking[..n.min(self.ranking.len())]
    }
}
