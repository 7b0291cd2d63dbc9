//! Service layer for hyperparameter search: fan trials out, join, pick the
//! best candidate.

use rayon::prelude::*;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::common::error::{LifecycleError, LifecycleResult};

use super::domain::{CandidateResult, MetricRecord, MetricStore, SearchSpace, TrialRunner, TrialSpec};

/// Return the candidate with the strictly greatest metric.
///
/// Candidates are scanned in input order and a later candidate only wins by
/// beating the current best, so ties resolve to the earliest one.
pub fn select_best<A, I>(candidates: I) -> LifecycleResult<CandidateResult<A>>
where
    I: IntoIterator<Item = CandidateResult<A>>,
{
    let mut best: Option<CandidateResult<A>> = None;
    let mut best_metric = f64::NEG_INFINITY;
    let mut scanned = 0usize;

    for candidate in candidates {
        scanned += 1;
        if candidate.metric().is_nan() {
            return Err(LifecycleError::InvalidMetric {
                candidate_id: candidate.candidate_id().to_string(),
            });
        }
        debug!(
            candidate = candidate.candidate_id(),
            metric = candidate.metric(),
            best_metric,
            "scanning candidate"
        );
        if best.is_none() || candidate.metric() > best_metric {
            best_metric = candidate.metric();
            best = Some(candidate);
        }
    }

    let best = best.ok_or(LifecycleError::EmptyCandidateSet)?;
    info!(
        candidate = best.candidate_id(),
        metric = best.metric(),
        scanned,
        "selected best candidate"
    );
    Ok(best)
}

/// Run every trial of `space` in parallel, record each outcome in `store`,
/// then select the best once all trials have finished.
///
/// A failing trial fails the search, but only after the join; the error of
/// the earliest failing trial in declaration order is returned.
pub fn run_search<R>(
    runner: &R,
    store: &dyn MetricStore,
    space: &SearchSpace,
) -> LifecycleResult<CandidateResult<R::Artifact>>
where
    R: TrialRunner,
{
    let specs = space.trial_specs();
    info!(trials = specs.len(), "starting hyperparameter search");

    let outcomes: Vec<LifecycleResult<CandidateResult<R::Artifact>>> = specs
        .par_iter()
        .map(|spec| run_trial(runner, store, spec))
        .collect();

    let candidates = outcomes
        .into_iter()
        .collect::<LifecycleResult<Vec<_>>>()?;
    select_best(candidates)
}

fn run_trial<R>(
    runner: &R,
    store: &dyn MetricStore,
    spec: &TrialSpec,
) -> LifecycleResult<CandidateResult<R::Artifact>>
where
    R: TrialRunner,
{
    let outcome = runner.run(spec).map_err(|e| {
        warn!(candidate = %spec.candidate_id, error = %e, "trial failed");
        match e {
            LifecycleError::Trial { .. } => e,
            other => LifecycleError::Trial {
                candidate_id: spec.candidate_id.clone(),
                reason: other.to_string(),
            },
        }
    })?;

    let mut metadata = outcome.params;
    metadata.insert("estimator".to_string(), Value::from(spec.family.to_string()));
    store.record(MetricRecord::new(
        spec.candidate_id.clone(),
        outcome.metric,
        metadata,
    ))?;
    debug!(candidate = %spec.candidate_id, metric = outcome.metric, "trial recorded");

    Ok(CandidateResult::new(
        spec.candidate_id.clone(),
        outcome.metric,
        outcome.artifact,
    ))
}
