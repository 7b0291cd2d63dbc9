use model_lifecycle::data::DatasetStats;
use model_lifecycle::promotion::{decide, Comparison, PerformanceSample, PromotionDecision, StageOccupancy};
use model_lifecycle::{check_drift, select_best, CandidateResult, DriftMode, DriftReport, LifecycleError};
use proptest::prelude::*;

fn candidates(metrics: &[f64]) -> Vec<CandidateResult<usize>> {
    metrics
        .iter()
        .enumerate()
        .map(|(idx, m)| CandidateResult::new(format!("trial-{idx}"), *m, idx))
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(512))]

    #[test]
    fn select_best_returns_earliest_maximum(metrics in prop::collection::vec(0u8..20, 1..40)) {
        // Small integer-valued metrics force plenty of ties.
        let metrics: Vec<f64> = metrics.into_iter().map(|m| f64::from(m) / 20.0).collect();
        let max = metrics.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let expected = metrics.iter().position(|m| *m == max).unwrap();

        let best = select_best(candidates(&metrics)).unwrap();
        prop_assert_eq!(*best.artifact(), expected);
        prop_assert_eq!(best.metric(), max);
    }

    #[test]
    fn identical_missing_counts_never_trip(missing in 0u64..1_000_000, tolerance in 0.0f64..5.0) {
        let stats = DatasetStats::with_missing(missing);
        let report = DriftReport::new(stats.clone(), stats);
        prop_assert!(check_drift(&report, tolerance, DriftMode::ReferenceVsComparison).is_ok());
    }

    #[test]
    fn legacy_mode_never_trips(reference in 0u64..10_000, comparison in 0u64..10_000) {
        let report = DriftReport::new(
            DatasetStats::with_missing(reference),
            DatasetStats::with_missing(comparison),
        );
        prop_assert!(check_drift(&report, 0.0, DriftMode::ReferenceVsReference).is_ok());
    }

    #[test]
    fn drift_verdict_matches_relative_change(
        reference in 1u64..10_000,
        comparison in 0u64..20_000,
        tolerance in 0.0f64..2.0,
    ) {
        let report = DriftReport::new(
            DatasetStats::with_missing(reference),
            DatasetStats::with_missing(comparison),
        );
        let change = reference.abs_diff(comparison) as f64 / reference as f64;
        match check_drift(&report, tolerance, DriftMode::ReferenceVsComparison) {
            Ok(check) => prop_assert!(check.relative_change.unwrap() <= tolerance),
            Err(LifecycleError::DriftExceeded { relative_change, .. }) => {
                prop_assert!(change > tolerance);
                prop_assert_eq!(relative_change, change);
            }
            Err(other) => prop_assert!(false, "unexpected error {}", other),
        }
    }

    #[test]
    fn occupied_stage_promotes_iff_latest_not_worse(latest in 0.0f64..=1.0, current in 0.0f64..=1.0) {
        let cmp = Comparison::scored(
            PerformanceSample::new(2, latest),
            PerformanceSample::new(1, current),
            "rows",
        );
        let decision = decide(StageOccupancy::Occupied(1), &cmp);
        if latest >= current {
            prop_assert_eq!(decision, PromotionDecision::Promote { from: StageOccupancy::Occupied(1), to: 2 });
        } else {
            prop_assert_eq!(decision, PromotionDecision::Retain { incumbent: 1 });
        }
    }
}

#[test]
fn select_best_of_nothing_fails() {
    assert!(matches!(
        select_best(candidates(&[])),
        Err(LifecycleError::EmptyCandidateSet)
    ));
}
