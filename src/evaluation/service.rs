//! Evaluation services: classification accuracy, the inference-time drift
//! gate and the post-training quality gates.

use tracing::{info, warn};

use crate::common::error::{LifecycleError, LifecycleResult};
use crate::data::domain::LabeledDataset;
use crate::training::domain::Classifier;

use super::domain::{DriftCheck, DriftMode, DriftReport, QualityReport, QualityThresholds};

/// Fraction of rows whose predicted label equals the target label.
pub fn accuracy(model: &dyn Classifier, dataset: &LabeledDataset) -> LifecycleResult<f64> {
    if dataset.is_empty() {
        return Err(LifecycleError::EmptyDataset);
    }
    let predictions = model.predict_batch(dataset.features());
    if predictions.len() != dataset.len() {
        return Err(LifecycleError::DimensionMismatch(format!(
            "{} predictions for {} rows",
            predictions.len(),
            dataset.len()
        )));
    }
    let hits = predictions
        .iter()
        .zip(dataset.labels())
        .filter(|(predicted, actual)| predicted == actual)
        .count();
    Ok(hits as f64 / dataset.len() as f64)
}

/// Fail closed when missing-value counts drift by more than `tolerance`
/// relative to the reference.
///
/// The relative change is `|ref - cmp| / ref`. A reference with no missing
/// values always passes.
pub fn check_drift(
    report: &DriftReport,
    tolerance: f64,
    mode: DriftMode,
) -> LifecycleResult<DriftCheck> {
    if !(tolerance >= 0.0) {
        return Err(LifecycleError::invalid_config(format!(
            "drift tolerance must be >= 0, got {tolerance}"
        )));
    }

    let reference_missing = report.reference.number_of_missing_values;
    let compared_missing = match mode {
        DriftMode::ReferenceVsComparison => report.comparison.number_of_missing_values,
        DriftMode::ReferenceVsReference => reference_missing,
    };

    let relative_change = (reference_missing > 0)
        .then(|| reference_missing.abs_diff(compared_missing) as f64 / reference_missing as f64);

    if let Some(change) = relative_change {
        if change > tolerance {
            warn!(
                reference_missing,
                compared_missing,
                relative_change = change,
                tolerance,
                "missing-value drift over tolerance, halting inference"
            );
            return Err(LifecycleError::DriftExceeded {
                relative_change: change,
                tolerance,
            });
        }
    }

    info!(
        reference_missing,
        compared_missing,
        relative_change = relative_change.unwrap_or(0.0),
        tolerance,
        ?mode,
        "drift gate passed"
    );
    Ok(DriftCheck {
        reference_missing,
        compared_missing,
        relative_change,
        tolerance,
    })
}

/// Score a trained model on its train and test sets and compare against
/// the configured floors.
pub fn evaluate_quality_gates(
    model: &dyn Classifier,
    train: &LabeledDataset,
    test: &LabeledDataset,
    thresholds: &QualityThresholds,
) -> LifecycleResult<QualityReport> {
    let train_accuracy = accuracy(model, train)?;
    let test_accuracy = accuracy(model, test)?;
    info!(train_accuracy, test_accuracy, "model evaluated");

    let mut violations = Vec::new();
    if train_accuracy < thresholds.min_train_accuracy {
        violations.push(format!(
            "Train Accuracy {:.2}% is below {:.2}%",
            train_accuracy * 100.0,
            thresholds.min_train_accuracy * 100.0
        ));
    }
    if test_accuracy < thresholds.min_test_accuracy {
        violations.push(format!(
            "Test Accuracy {:.2}% is below {:.2}%",
            test_accuracy * 100.0,
            thresholds.min_test_accuracy * 100.0
        ));
    }

    if thresholds.fail_on_violation && !violations.is_empty() {
        return Err(LifecycleError::QualityGateFailed {
            messages: violations,
        });
    }
    for message in &violations {
        warn!("{message}");
    }

    Ok(QualityReport {
        train_accuracy,
        test_accuracy,
        violations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::domain::{DatasetStats, Label};

    struct Threshold(f64);

    impl Classifier for Threshold {
        fn predict(&self, features: &[f64]) -> Label {
            Label::from(features[0] > self.0)
        }
    }

    fn report(reference: u64, comparison: u64) -> DriftReport {
        DriftReport::new(
            DatasetStats::with_missing(reference),
            DatasetStats::with_missing(comparison),
        )
    }

    fn dataset(points: &[(f64, Label)]) -> LabeledDataset {
        LabeledDataset::new(
            points.iter().map(|(x, _)| vec![*x]).collect(),
            points.iter().map(|(_, y)| *y).collect(),
        )
        .unwrap()
    }

    #[test]
    fn twenty_percent_drift_trips_ten_percent_tolerance() {
        let err = check_drift(&report(100, 120), 0.1, DriftMode::default()).unwrap_err();
        assert!(matches!(err, LifecycleError::DriftExceeded { .. }));
    }

    #[test]
    fn twenty_percent_drift_passes_thirty_percent_tolerance() {
        let check = check_drift(&report(100, 120), 0.3, DriftMode::default()).unwrap();
        assert!((check.relative_change.unwrap() - 0.2).abs() < 1e-12);
    }

    #[test]
    fn drop_in_missing_values_counts_as_drift_too() {
        assert!(check_drift(&report(100, 50), 0.1, DriftMode::default()).is_err());
    }

    #[test]
    fn change_exactly_at_tolerance_passes() {
        assert!(check_drift(&report(100, 110), 0.1, DriftMode::default()).is_ok());
    }

    #[test]
    fn clean_reference_always_passes() {
        let check = check_drift(&report(0, 500), 0.0, DriftMode::default()).unwrap();
        assert_eq!(check.relative_change, None);
    }

    #[test]
    fn legacy_mode_never_trips() {
        let check = check_drift(&report(100, 1_000), 0.0, DriftMode::ReferenceVsReference).unwrap();
        assert_eq!(check.relative_change, Some(0.0));
        assert_eq!(check.compared_missing, 100);
    }

    #[test]
    fn negative_tolerance_is_invalid() {
        assert!(matches!(
            check_drift(&report(1, 1), -0.1, DriftMode::default()),
            Err(LifecycleError::InvalidConfig(_))
        ));
    }

    #[test]
    fn accuracy_is_fraction_of_exact_matches() {
        let data = dataset(&[(0.2, 0), (0.8, 1), (0.9, 0), (0.1, 1)]);
        assert_eq!(accuracy(&Threshold(0.5), &data).unwrap(), 0.5);
    }

    #[test]
    fn accuracy_on_empty_dataset_is_an_error() {
        let empty = LabeledDataset::new(vec![], vec![]).unwrap();
        assert!(matches!(
            accuracy(&Threshold(0.5), &empty),
            Err(LifecycleError::EmptyDataset)
        ));
    }

    #[test]
    fn quality_gates_report_without_failing_by_default() {
        let train = dataset(&[(0.9, 1), (0.1, 0)]);
        let test = dataset(&[(0.9, 0), (0.1, 0)]);
        let thresholds = QualityThresholds {
            min_train_accuracy: 0.9,
            min_test_accuracy: 0.9,
            fail_on_violation: false,
        };
        let report = evaluate_quality_gates(&Threshold(0.5), &train, &test, &thresholds).unwrap();
        assert_eq!(report.train_accuracy, 1.0);
        assert_eq!(report.test_accuracy, 0.5);
        assert_eq!(report.violations, vec!["Test Accuracy 50.00% is below 90.00%"]);
        assert!(!report.passed());
    }

    #[test]
    fn quality_gates_fail_when_enforced() {
        let train = dataset(&[(0.9, 0)]);
        let thresholds = QualityThresholds {
            min_train_accuracy: 0.5,
            min_test_accuracy: 0.0,
            fail_on_violation: true,
        };
        let err = evaluate_quality_gates(&Threshold(0.5), &train, &train, &thresholds).unwrap_err();
        assert!(
            matches!(err, LifecycleError::QualityGateFailed { ref messages } if messages.len() == 1)
        );
    }
}
