//! Error types for the walk-forward optimizer.
//!
//! Two layers of failure exist:
//!
//! | Kind | Type | Fatal |
//! |------|------|-------|
//! | Invalid split fractions, empty grid parameter, bad rolling geometry | [`OptimizerError::Configuration`] | yes |
//! | Series too short for the requested geometry or warm-up | [`OptimizerError::InsufficientData`] | yes |
//! | One parameter set fails during search/select | [`EvaluationError`] (recorded, candidate excluded) | no |
//! | No candidate survives a phase | [`OptimizerError::NoViableCandidate`] | yes |
//! | Selected parameters fail on the test segment | [`OptimizerError::ReportFailed`] | yes |
//! | Every rolling window fails | [`OptimizerError::AllWindowsFailed`] | yes |
//! | Caller cancelled a running optimization | [`OptimizerError::Cancelled`] | yes |
//!
//! Nothing is retried: the optimizer is a deterministic offline computation.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Phase of a single optimizer invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Dividing the series into segments.
    Split,
    /// Grid search on the train segment.
    Search,
    /// Re-evaluation of survivors on the validation segment.
    Select,
    /// Single evaluation of the selected parameters on the test segment.
    Report,
}

impl Phase {
    /// Lowercase phase name used in logs, metrics labels and messages.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Split => "split",
            Self::Search => "search",
            Self::Select => "select",
            Self::Report => "report",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fatal optimizer errors. No partial result accompanies any of them.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OptimizerError {
    /// Caller mistake: invalid fractions, empty grid parameter, bad split counts.
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// Series too short for the requested split geometry or strategy warm-up.
    #[error("Insufficient data for {context}: need at least {required} bars, have {available}")]
    InsufficientData {
        /// What was being sized (e.g. "train segment").
        context: String,
        /// Minimum number of bars required.
        required: usize,
        /// Number of bars available.
        available: usize,
    },

    /// Every candidate failed by the end of the given phase.
    #[error(
        "No viable parameter combination in {phase} phase: {failed} of {total} candidates failed \
         ({search_failed} in search, {select_failed} in select)"
    )]
    NoViableCandidate {
        /// Phase in which the last candidate was lost.
        phase: Phase,
        /// Candidates failed across all phases so far.
        failed: usize,
        /// Grid size.
        total: usize,
        /// Failures during search.
        search_failed: usize,
        /// Failures during selection.
        select_failed: usize,
    },

    /// The selected parameter set could not be evaluated on the test segment.
    #[error("Report phase failed for selected parameters ({params}): {reason}")]
    ReportFailed {
        /// Rendered parameter set.
        params: String,
        /// Evaluation failure message.
        reason: String,
    },

    /// Every rolling window failed.
    #[error("All {total} rolling windows failed; last error: {last_error}")]
    AllWindowsFailed {
        /// Number of windows attempted.
        total: usize,
        /// Message of the last window failure.
        last_error: String,
    },

    /// The run was cancelled before it completed.
    #[error("Optimization cancelled during {phase} phase after {completed} of {total} evaluations")]
    Cancelled {
        /// Phase that was running when cancellation was observed.
        phase: Phase,
        /// Evaluations completed in that phase.
        completed: usize,
        /// Evaluations scheduled in that phase.
        total: usize,
    },
}

impl OptimizerError {
    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Create an insufficient data error.
    pub fn insufficient_data(
        context: impl Into<String>,
        required: usize,
        available: usize,
    ) -> Self {
        Self::InsufficientData {
            context: context.into(),
            required,
            available,
        }
    }

    /// Phase the error is attributed to, if any.
    #[must_use]
    pub const fn phase(&self) -> Option<Phase> {
        match self {
            Self::Configuration(_) => None,
            Self::InsufficientData { .. } => Some(Phase::Split),
            Self::NoViableCandidate { phase, .. } | Self::Cancelled { phase, .. } => Some(*phase),
            Self::ReportFailed { .. } => Some(Phase::Report),
            Self::AllWindowsFailed { .. } => None,
        }
    }

    /// Stable label for metrics.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "configuration",
            Self::InsufficientData { .. } => "insufficient_data",
            Self::NoViableCandidate { .. } => "no_viable_candidate",
            Self::ReportFailed { .. } => "report_failed",
            Self::AllWindowsFailed { .. } => "all_windows_failed",
            Self::Cancelled { .. } => "cancelled",
        }
    }
}

/// Failure of a single candidate evaluation. Never fatal on its own.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EvaluationError {
    /// The segment is shorter than the strategy's indicator warm-up.
    #[error("Insufficient history: strategy needs {required} bars, segment has {available}")]
    InsufficientHistory {
        /// Bars required.
        required: usize,
        /// Bars in the segment.
        available: usize,
    },

    /// A parameter is missing, has the wrong type, or is out of range.
    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter {
        /// Parameter name.
        name: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Numeric instability (zero price, depleted equity, overflow).
    #[error("Numeric failure: {0}")]
    Numeric(String),

    /// The configured metric could not be computed for this result.
    #[error("Metric '{0}' is not available for this result")]
    MetricUnavailable(String),

    /// The strategy produced a signal sequence of the wrong length.
    #[error("Signal length {signals} does not match series length {bars}")]
    SignalLengthMismatch {
        /// Number of signals produced.
        signals: usize,
        /// Number of bars in the segment.
        bars: usize,
    },

    /// The evaluation panicked; the panic was contained.
    #[error("Evaluation panicked: {0}")]
    Panicked(String),
}

impl EvaluationError {
    /// Create an invalid parameter error.
    pub fn invalid_parameter(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }
}
