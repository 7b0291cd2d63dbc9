//! Domain primitives for the drift gate and training quality gates.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::common::error::{LifecycleError, LifecycleResult};
use crate::data::domain::{DatasetStats, LabeledDataset};
use crate::data::service::missing_value_stats;

/// Relative missing-value drift tolerated before inference is halted.
pub const DEFAULT_NA_DRIFT_TOLERANCE: f64 = 0.10;

/// Missing-value statistics of the reference (training) data and of the
/// data about to be scored.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DriftReport {
    pub reference: DatasetStats,
    #[serde(alias = "current")]
    pub comparison: DatasetStats,
}

#[derive(Deserialize)]
struct ReporterOutput {
    metrics: Vec<ReporterMetric>,
}

#[derive(Deserialize)]
struct ReporterMetric {
    result: DriftReport,
}

impl DriftReport {
    pub fn new(reference: DatasetStats, comparison: DatasetStats) -> Self {
        Self {
            reference,
            comparison,
        }
    }

    /// Parse a data-quality reporter document; the first metric's `result`
    /// must carry `reference` and `comparison` sections.
    pub fn from_json(raw: &str) -> LifecycleResult<Self> {
        let output: ReporterOutput = serde_json::from_str(raw)?;
        output
            .metrics
            .into_iter()
            .next()
            .map(|metric| metric.result)
            .ok_or_else(|| {
                LifecycleError::ReportParse(serde::de::Error::custom("report has no metrics"))
            })
    }

    /// Build the report locally from two snapshots.
    pub fn from_datasets(reference: &LabeledDataset, comparison: &LabeledDataset) -> Self {
        Self::new(missing_value_stats(reference), missing_value_stats(comparison))
    }
}

/// Which figure the reference missing-value count is compared against.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriftMode {
    /// Reference snapshot against the comparison snapshot.
    #[default]
    ReferenceVsComparison,
    /// Legacy behaviour: reference against itself. Always reports zero
    /// drift; only kept so old pipelines can be reproduced.
    ReferenceVsReference,
}

impl FromStr for DriftMode {
    type Err = LifecycleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "reference_vs_comparison" => Ok(DriftMode::ReferenceVsComparison),
            "reference_vs_reference" => Ok(DriftMode::ReferenceVsReference),
            other => Err(LifecycleError::invalid_config(format!(
                "unknown drift mode `{other}`"
            ))),
        }
    }
}

/// Verdict of a drift check that passed.
#[derive(Clone, Debug, PartialEq)]
pub struct DriftCheck {
    pub reference_missing: u64,
    pub compared_missing: u64,
    /// `None` when the reference has no missing values (nothing to divide by).
    pub relative_change: Option<f64>,
    pub tolerance: f64,
}

/// Accuracy floors checked after training.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct QualityThresholds {
    pub min_train_accuracy: f64,
    pub min_test_accuracy: f64,
    /// Fail instead of just logging when a floor is missed.
    pub fail_on_violation: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct QualityReport {
    pub train_accuracy: f64,
    pub test_accuracy: f64,
    pub violations: Vec<String>,
}

impl QualityReport {
    pub fn passed(&self) -> bool {
        self.violations.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_reporter_document() {
        let report = DriftReport::from_json(
            r#"{"metrics": [{"metric": "DatasetSummaryMetric", "result": {
                "reference": {"number_of_missing_values": 100, "number_of_rows": 900},
                "comparison": {"number_of_missing_values": 120}
            }}]}"#,
        )
        .unwrap();
        assert_eq!(report.reference.number_of_missing_values, 100);
        assert_eq!(report.comparison.number_of_missing_values, 120);
    }

    #[test]
    fn accepts_current_as_comparison_alias() {
        let report = DriftReport::from_json(
            r#"{"metrics": [{"result": {
                "reference": {"number_of_missing_values": 1},
                "current": {"number_of_missing_values": 2}
            }}]}"#,
        )
        .unwrap();
        assert_eq!(report.comparison.number_of_missing_values, 2);
    }

    #[test]
    fn empty_metrics_is_a_parse_error() {
        let err = DriftReport::from_json(r#"{"metrics": []}"#).unwrap_err();
        assert!(matches!(err, LifecycleError::ReportParse(_)));
    }

    #[test]
    fn missing_count_is_a_parse_error() {
        let err = DriftReport::from_json(
            r#"{"metrics": [{"result": {"reference": {}, "comparison": {}}}]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, LifecycleError::ReportParse(_)));
    }

    #[test]
    fn report_from_datasets_counts_feature_nans() {
        let reference =
            LabeledDataset::new(vec![vec![f64::NAN, 1.0], vec![1.0, 1.0]], vec![0, 1]).unwrap();
        let comparison = LabeledDataset::new(vec![vec![f64::NAN, f64::NAN]], vec![0]).unwrap();
        let report = DriftReport::from_datasets(&reference, &comparison);
        assert_eq!(report.reference.number_of_missing_values, 1);
        assert_eq!(report.comparison.number_of_missing_values, 2);
    }

    #[test]
    fn drift_mode_parses_from_config_strings() {
        assert_eq!(
            "reference_vs_reference".parse::<DriftMode>().unwrap(),
            DriftMode::ReferenceVsReference
        );
        assert!("both".parse::<DriftMode>().is_err());
    }
}
