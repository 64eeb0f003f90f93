//! Per-candidate records shared by the optimizers.

use std::cmp::Ordering;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::ParameterSet;
use crate::error::Phase;

/// A parameter set that failed evaluation and was excluded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateFailure {
    /// Phase in which it failed.
    pub phase: Phase,
    /// Position in grid enumeration order.
    pub grid_index: usize,
    /// The failing parameter set.
    pub params: ParameterSet,
    /// Failure message.
    pub reason: String,
}

/// One row of the train ranking table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedCandidate {
    /// 1-based rank by train metric.
    pub rank: usize,
    /// Position in grid enumeration order.
    pub grid_index: usize,
    /// Parameter set.
    pub params: ParameterSet,
    /// Score on the train segment.
    pub train_metric: Decimal,
    /// Score on the validation segment, if it was evaluated successfully.
    pub validation_metric: Option<Decimal>,
}

/// A candidate still in the running.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Survivor {
    pub grid_index: usize,
    pub params: ParameterSet,
    pub train_metric: Decimal,
    pub validation_metric: Option<Decimal>,
}

impl Survivor {
    /// Train ranking: metric descending, then grid order.
    pub fn by_train(a: &Self, b: &Self) -> Ordering {
        b.train_metric
            .cmp(&a.train_metric)
            .then(a.grid_index.cmp(&b.grid_index))
    }

    /// Selection order: validation descending, then train descending, then grid order.
    pub fn by_selection(a: &Self, b: &Self) -> Ordering {
        b.validation_metric
            .cmp(&a.validation_metric)
            .then_with(|| Self::by_train(a, b))
    }

    pub fn into_ranked(self, rank: usize) -> RankedCandidate {
        RankedCandidate {
            rank,
            grid_index: self.grid_index,
            params: self.params,
            train_metric: self.train_metric,
            validation_metric: self.validation_metric,
        }
    }
}
