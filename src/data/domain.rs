//! Core dataset definitions: labeled rows and the statistics drift is
//! measured on.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::common::error::{LifecycleError, LifecycleResult};

/// Class label predicted by a classifier.
pub type Label = i64;

/// Feature rows plus their target labels. Missing feature values are NaN.
#[derive(Clone, Debug, PartialEq)]
pub struct LabeledDataset {
    features: Vec<Vec<f64>>,
    labels: Vec<Label>,
}

impl LabeledDataset {
    /// Build a dataset, checking that rows and labels line up and that every
    /// row has the same width.
    pub fn new(features: Vec<Vec<f64>>, labels: Vec<Label>) -> LifecycleResult<Self> {
        if features.len() != labels.len() {
            return Err(LifecycleError::DimensionMismatch(format!(
                "{} feature rows but {} labels",
                features.len(),
                labels.len()
            )));
        }
        if let Some(width) = features.first().map(Vec::len) {
            if let Some(idx) = features.iter().position(|row| row.len() != width) {
                return Err(LifecycleError::DimensionMismatch(format!(
                    "row {idx} has {} columns, expected {width}",
                    features[idx].len()
                )));
            }
        }
        Ok(Self { features, labels })
    }

    pub fn features(&self) -> &[Vec<f64>] {
        &self.features
    }

    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Iterate `(features, label)` pairs in row order.
    pub fn rows(&self) -> impl Iterator<Item = (&[f64], Label)> + '_ {
        self.features
            .iter()
            .map(Vec::as_slice)
            .zip(self.labels.iter().copied())
    }
}

/// Per-dataset quality statistics as produced by a data-quality reporter.
///
/// Only the missing-value count is interpreted; anything else the reporter
/// emits is kept verbatim in `extra`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DatasetStats {
    pub number_of_missing_values: u64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DatasetStats {
    pub fn with_missing(number_of_missing_values: u64) -> Self {
        Self {
            number_of_missing_values,
            extra: Map::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mismatched_labels_are_rejected() {
        let err = LabeledDataset::new(vec![vec![1.0]], vec![]).unwrap_err();
        assert!(matches!(err, LifecycleError::DimensionMismatch(_)));
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let err = LabeledDataset::new(vec![vec![1.0, 2.0], vec![3.0]], vec![0, 1]).unwrap_err();
        assert!(err.to_string().contains("row 1"));
    }

    #[test]
    fn rows_pair_features_with_labels() {
        let ds = LabeledDataset::new(vec![vec![1.0], vec![2.0]], vec![7, 9]).unwrap();
        let pairs: Vec<_> = ds.rows().collect();
        assert_eq!(pairs, vec![(&[1.0][..], 7), (&[2.0][..], 9)]);
    }

    #[test]
    fn stats_keep_unknown_reporter_fields() {
        let stats: DatasetStats =
            serde_json::from_str(r#"{"number_of_missing_values": 3, "number_of_rows": 10}"#)
                .unwrap();
        assert_eq!(stats.number_of_missing_values, 3);
        assert_eq!(stats.extra.get("number_of_rows"), Some(&Value::from(10)));
    }
}
