//! Training domain: hyperparameter search and best-candidate selection.
//!
//! Fitting estimators is delegated to a [`domain::TrialRunner`]; this module
//! owns only fan-out, bookkeeping and the selection policy.

pub mod domain;
pub mod repo_fs;
pub mod repo_mem;
pub mod service;

pub use domain::{
    CandidateResult, Classifier, EstimatorFamily, MetricRecord, MetricStore, SearchSpace,
    TrialOutcome, TrialRunner, TrialSpec,
};
pub use service::{run_search, select_best};
