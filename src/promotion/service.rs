//! Performance comparator and promotion controller.

use tracing::info;

use crate::common::error::{LifecycleError, LifecycleResult};
use crate::data::domain::LabeledDataset;
use crate::data::service::fingerprint;
use crate::evaluation::service::accuracy;
use crate::registry::domain::{ModelRegistry, ModelVersion, RegisteredModel, Stage};

use super::domain::{Comparison, PerformanceSample, PromotionDecision, PromotionOutcome, StageOccupancy};

fn lookup_incumbent(
    registry: &dyn ModelRegistry,
    name: &str,
    stage: &Stage,
) -> LifecycleResult<Option<RegisteredModel>> {
    registry.find_by_stage(name, stage).map_err(|e| match e {
        LifecycleError::IncumbentLookup { .. } => e,
        other => LifecycleError::IncumbentLookup {
            name: name.to_string(),
            stage: stage.to_string(),
            reason: other.to_string(),
        },
    })
}

/// Score `latest` and the version holding `target` on the same holdout rows.
///
/// With no incumbent the comparison is [`Comparison::first_deployment`] and
/// no scoring happens.
pub fn compare(
    registry: &dyn ModelRegistry,
    latest: &ModelVersion,
    target: &Stage,
    holdout: &LabeledDataset,
) -> LifecycleResult<Comparison> {
    let Some(current) = lookup_incumbent(registry, &latest.name, target)? else {
        info!(
            model = %latest.name,
            stage = %target,
            latest = latest.number,
            "no incumbent, latest version wins by default"
        );
        return Ok(Comparison::first_deployment(latest.number));
    };

    let latest_model = registry.get(&latest.name, latest.number)?;
    let rows = fingerprint(holdout);
    let latest_score = accuracy(latest_model.artifact.as_ref(), holdout)?;
    let current_score = accuracy(current.artifact.as_ref(), holdout)?;

    info!(
        model = %latest.name,
        stage = %target,
        latest = latest.number,
        latest_score,
        current = current.version.number,
        current_score,
        holdout = %rows,
        "compared latest against incumbent"
    );
    Ok(Comparison::scored(
        PerformanceSample::new(latest.number, latest_score),
        PerformanceSample::new(current.version.number, current_score),
        rows,
    ))
}

/// Pure transition function of the promotion state machine. Ties favour the
/// latest version.
pub fn decide(occupancy: StageOccupancy, comparison: &Comparison) -> PromotionDecision {
    let latest = comparison.latest.version;
    match occupancy {
        StageOccupancy::Unoccupied => PromotionDecision::Promote {
            from: occupancy,
            to: latest,
        },
        StageOccupancy::Occupied(current) if current == latest => {
            PromotionDecision::AlreadyPromoted { version: latest }
        }
        StageOccupancy::Occupied(current) => {
            let (latest_score, current_score) = comparison.scores();
            if latest_score >= current_score {
                PromotionDecision::Promote {
                    from: occupancy,
                    to: latest,
                }
            } else {
                PromotionDecision::Retain { incumbent: current }
            }
        }
    }
}

/// Apply the comparison to the registry.
///
/// Re-reads the stage holder first. If the latest version already holds the
/// stage this is a no-op. If the holder is not the version the comparison
/// scored against, fails with [`LifecycleError::StageAssignmentConflict`].
/// The write itself is a single compare-and-swap; failures are returned,
/// never retried.
pub fn promote(
    registry: &dyn ModelRegistry,
    model_name: &str,
    target: &Stage,
    comparison: &Comparison,
) -> LifecycleResult<PromotionOutcome> {
    let occupancy = StageOccupancy::from(
        lookup_incumbent(registry, model_name, target)?.map(|m| m.version.number),
    );
    let latest = comparison.latest.version;

    if occupancy.holder() != Some(latest) && occupancy.holder() != comparison.incumbent_version() {
        return Err(LifecycleError::StageAssignmentConflict {
            name: model_name.to_string(),
            stage: target.to_string(),
            expected: comparison.incumbent_version(),
            found: occupancy.holder(),
        });
    }

    let (latest_score, current_score) = comparison.scores();
    let decision = decide(occupancy, comparison);
    info!(
        model = model_name,
        stage = %target,
        latest_score,
        current_score,
        ?decision,
        "promotion decided"
    );

    match decision {
        PromotionDecision::Promote { from, to } => {
            let assignment = registry.assign_stage(model_name, to, target, from.holder())?;
            info!(
                model = model_name,
                stage = %target,
                version = to,
                previous = ?assignment.previous,
                "promoted latest version"
            );
            Ok(PromotionOutcome::Promoted(assignment))
        }
        PromotionDecision::Retain { incumbent } => {
            info!(
                model = model_name,
                stage = %target,
                incumbent,
                "incumbent outperforms latest, keeping current"
            );
            Ok(PromotionOutcome::Retained { incumbent })
        }
        PromotionDecision::AlreadyPromoted { version } => {
            Ok(PromotionOutcome::AlreadyPromoted { version })
        }
    }
}

/// [`compare`] followed by [`promote`].
pub fn compare_and_promote(
    registry: &dyn ModelRegistry,
    latest: &ModelVersion,
    target: &Stage,
    holdout: &LabeledDataset,
) -> LifecycleResult<PromotionOutcome> {
    let comparison = compare(registry, latest, target, holdout)?;
    promote(registry, &latest.name, target, &comparison)
}
