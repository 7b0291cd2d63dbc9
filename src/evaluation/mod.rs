//! Evaluation: accuracy scoring, the missing-value drift gate and the
//! post-training accuracy gates.

pub mod domain;
pub mod service;

pub use domain::{DriftCheck, DriftMode, DriftReport, QualityReport, QualityThresholds};
pub use service::{accuracy, check_drift, evaluate_quality_gates};
