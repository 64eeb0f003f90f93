//! Search, select and report steps shared by both optimizers.

use rust_decimal::Decimal;
use tracing::{info, warn};

use super::candidate::{CandidateFailure, RankedCandidate, Survivor};
use super::evaluation::{Evaluation, Evaluator};
use super::grid::ParameterGrid;
use super::search::{EvalContext, Job, SearchExecutor};
use crate::domain::{Candle, ParameterSet};
use crate::error::{OptimizerError, Phase};

/// Evaluate every grid candidate on `train`; survivors sorted by train metric.
pub(crate) fn search<E: Evaluator + ?Sized>(
    executor: &SearchExecutor,
    ctx: &EvalContext<'_, E>,
    grid: &ParameterGrid,
    train: &[Candle],
    failures: &mut Vec<CandidateFailure>,
) -> Result<Vec<Survivor>, OptimizerError> {
    let candidates: Vec<ParameterSet> = grid.expand().collect();
    let jobs: Vec<Job<'_>> = candidates
        .iter()
        .enumerate()
        .map(|(grid_index, params)| Job { grid_index, params })
        .collect();

    let results = executor.run(ctx, Phase::Search, &jobs, train)?;

    let total = results.len();
    let mut survivors = Vec::with_capacity(total);
    for job in results {
        let params = &candidates[job.grid_index];
        match job.result {
            Ok(evaluation) => survivors.push(Survivor {
                grid_index: job.grid_index,
                params: params.clone(),
                train_metric: evaluation.metric,
                validation_metric: None,
            }),
            Err(e) => failures.push(CandidateFailure {
                phase: Phase::Search,
                grid_index: job.grid_index,
                params: params.clone(),
                reason: e.to_string(),
            }),
        }
    }

    let failed = total - survivors.len();
    if survivors.is_empty() {
        warn!(failed, total, "No candidate survived search");
        return Err(OptimizerError::NoViableCandidate {
            phase: Phase::Search,
            failed,
            total,
            search_failed: failed,
            select_failed: 0,
        });
    }

    survivors.sort_by(Survivor::by_train);
    info!(
        candidates = total,
        failed,
        best_train_metric = %survivors[0].train_metric,
        "Search complete"
    );
    Ok(survivors)
}

/// Outcome of the select phase.
#[derive(Debug)]
pub(crate) struct Selection {
    /// All search survivors in train-ranking order, with validation metrics.
    pub survivors: Vec<Survivor>,
    /// The selected candidate.
    pub selected: Survivor,
    /// Its validation metric.
    pub validation_metric: Decimal,
}

/// Re-evaluate survivors on `validation` and pick the best.
///
/// `failures` holds the search failures of the same grid on entry, so the
/// grid size is survivors plus those failures.
pub(crate) fn select<E: Evaluator + ?Sized>(
    executor: &SearchExecutor,
    ctx: &EvalContext<'_, E>,
    mut survivors: Vec<Survivor>,
    validation: &[Candle],
    failures: &mut Vec<CandidateFailure>,
) -> Result<Selection, OptimizerError> {
    let jobs: Vec<Job<'_>> = survivors
        .iter()
        .map(|s| Job {
            grid_index: s.grid_index,
            params: &s.params,
        })
        .collect();

    let results = executor.run(ctx, Phase::Select, &jobs, validation)?;

    let search_failed = failures.iter().filter(|f| f.phase == Phase::Search).count();
    let entered = survivors.len();
    let mut failed = 0;
    for (survivor, job) in survivors.iter_mut().zip(results) {
        match job.result {
            Ok(evaluation) => survivor.validation_metric = Some(evaluation.metric),
            Err(e) => {
                failed += 1;
                failures.push(CandidateFailure {
                    phase: Phase::Select,
                    grid_index: survivor.grid_index,
                    params: survivor.params.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }

    let best = survivors
        .iter()
        .filter(|s| s.validation_metric.is_some())
        .min_by(|a, b| Survivor::by_selection(a, b))
        .cloned();

    let Some((selected, validation_metric)) =
        best.and_then(|s| s.validation_metric.map(|v| (s, v)))
    else {
        let total = search_failed + entered;
        warn!(search_failed, select_failed = failed, total, "No candidate survived selection");
        return Err(OptimizerError::NoViableCandidate {
            phase: Phase::Select,
            failed: search_failed + failed,
            total,
            search_failed,
            select_failed: failed,
        });
    };

    info!(
        candidates = entered,
        failed,
        selected = %selected.params,
        validation_metric = %validation_metric,
        "Selection complete"
    );
    Ok(Selection {
        survivors,
        selected,
        validation_metric,
    })
}

/// Evaluate the selected parameters once on `test`.
pub(crate) fn report<E: Evaluator + ?Sized>(
    executor: &SearchExecutor,
    ctx: &EvalContext<'_, E>,
    selected: &Survivor,
    test: &[Candle],
) -> Result<Evaluation, OptimizerError> {
    let job = Job {
        grid_index: selected.grid_index,
        params: &selected.params,
    };
    let mut results = executor.run(ctx, Phase::Report, &[job], test)?;

    let Some(outcome) = results.pop() else {
        return Err(OptimizerError::ReportFailed {
            params: selected.params.to_string(),
            reason: "no evaluation result".to_string(),
        });
    };

    outcome.result.map_err(|e| OptimizerError::ReportFailed {
        params: selected.params.to_string(),
        reason: e.to_string(),
    })
}

/// Ranking table in train order.
pub(crate) fn ranking(survivors: Vec<Survivor>) -> Vec<RankedCandidate> {
    survivors
        .into_iter()
        .enumerate()
        .map(|(i, s)| s.into_ranked(i + 1))
        .collect()
}
