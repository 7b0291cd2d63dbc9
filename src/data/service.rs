//! Dataset-level computations shared by the drift gate and the comparator.

use crate::common::ids::SimpleHash;

use super::domain::{DatasetStats, LabeledDataset};

/// Count missing (NaN) feature cells. The target column is not inspected.
pub fn missing_value_stats(dataset: &LabeledDataset) -> DatasetStats {
    let missing = dataset
        .features()
        .iter()
        .flatten()
        .filter(|v| v.is_nan())
        .count() as u64;
    DatasetStats::with_missing(missing)
}

/// Byte-level fingerprint of rows and labels, in row order.
///
/// Two scoring passes are comparable only if they saw the same fingerprint.
pub fn fingerprint(dataset: &LabeledDataset) -> String {
    let mut hasher = SimpleHash::new();
    hasher.update(&(dataset.len() as u64).to_le_bytes());
    for (row, label) in dataset.rows() {
        hasher.update(&(row.len() as u64).to_le_bytes());
        for value in row {
            hasher.update(&value.to_bits().to_le_bytes());
        }
        hasher.update(&label.to_le_bytes());
    }
    hasher.finish_hex()
}
