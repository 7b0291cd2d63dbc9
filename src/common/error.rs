//! Error handling primitives shared across the core.
//!
//! Every failure the core can raise is a [`LifecycleError`] variant. Hosts
//! that need to route failures without matching on messages use
//! [`LifecycleError::code`], whose values are stable.

use thiserror::Error;

/// Stable error codes handed to the host pipeline's failure hook.
#[repr(u32)]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ErrorCode {
    /// Success code used as a sentinel.
    Ok = 0,
    /// No hyperparameter trials to select from.
    EmptyCandidateSet = 1,
    /// The data-quality gate tripped.
    DriftExceeded = 2,
    /// Looking up the stage holder failed for a reason other than absence.
    IncumbentLookup = 3,
    /// Another writer moved the stage between read and write.
    StageAssignmentConflict = 4,
    /// Requested model version was not registered.
    ModelMissing = 5,
    /// Input failed validation.
    InvalidInput = 6,
    /// Training produced a model below the configured accuracy floor.
    QualityGate = 7,
    /// Catch-all for IO and registry plumbing failures.
    Internal = 8,
}

/// Canonical error type for the core.
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// `select_best` was handed no candidates.
    #[error("no candidates to select from")]
    EmptyCandidateSet,

    /// A candidate reported a metric that cannot be ordered.
    #[error("candidate `{candidate_id}` reported a non-comparable metric")]
    InvalidMetric { candidate_id: String },

    /// Missing-value drift between reference and comparison data is over tolerance.
    #[error(
        "number of missing values drifted by {relative_change:.4} (tolerance {tolerance:.4})"
    )]
    DriftExceeded { relative_change: f64, tolerance: f64 },

    /// The registry could not answer who holds a stage.
    #[error("stage lookup for `{name}`@{stage} failed: {reason}")]
    IncumbentLookup {
        name: String,
        stage: String,
        reason: String,
    },

    /// The stage holder observed at write time differs from the one expected.
    #[error("stage `{stage}` of `{name}` is held by {found:?}, expected {expected:?}")]
    StageAssignmentConflict {
        name: String,
        stage: String,
        expected: Option<u32>,
        found: Option<u32>,
    },

    /// No such version in the registry.
    #[error("model `{name}` has no version {version}")]
    VersionNotFound { name: String, version: u32 },

    /// The drift report was not the expected JSON shape.
    #[error("malformed drift report: {0}")]
    ReportParse(#[from] serde_json::Error),

    /// A configuration value is missing or invalid.
    #[error("configuration error: {0}")]
    InvalidConfig(String),

    /// The estimator is outside the supported families.
    #[error("unsupported estimator `{package}.{class}`")]
    UnsupportedEstimator { package: String, class: String },

    /// Trained model missed the accuracy floors and gates are enforced.
    #[error("model performance did not meet the minimum criteria: {}", .messages.join("; "))]
    QualityGateFailed { messages: Vec<String> },

    /// Scoring needs at least one row.
    #[error("dataset has no rows")]
    EmptyDataset,

    /// Rows, labels or predictions do not line up.
    #[error("dimension mismatch: {0}")]
    DimensionMismatch(String),

    /// A hyperparameter trial failed to produce a candidate.
    #[error("trial `{candidate_id}` failed: {reason}")]
    Trial { candidate_id: String, reason: String },

    /// Registry plumbing failure (poisoned lock, backend outage).
    #[error("registry error: {0}")]
    Registry(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result alias used throughout the crate.
pub type LifecycleResult<T> = Result<T, LifecycleError>;

impl LifecycleError {
    /// Stable code for the host's failure hook.
    pub fn code(&self) -> ErrorCode {
        match self {
            LifecycleError::EmptyCandidateSet => ErrorCode::EmptyCandidateSet,
            LifecycleError::DriftExceeded { .. } => ErrorCode::DriftExceeded,
            LifecycleError::IncumbentLookup { .. } => ErrorCode::IncumbentLookup,
            LifecycleError::StageAssignmentConflict { .. } => ErrorCode::StageAssignmentConflict,
            LifecycleError::VersionNotFound { .. } => ErrorCode::ModelMissing,
            LifecycleError::InvalidMetric { .. }
            | LifecycleError::ReportParse(_)
            | LifecycleError::InvalidConfig(_)
            | LifecycleError::UnsupportedEstimator { .. }
            | LifecycleError::EmptyDataset
            | LifecycleError::DimensionMismatch(_) => ErrorCode::InvalidInput,
            LifecycleError::QualityGateFailed { .. } => ErrorCode::QualityGate,
            LifecycleError::Trial { .. } | LifecycleError::Registry(_) | LifecycleError::Io(_) => {
                ErrorCode::Internal
            }
        }
    }

    /// Validation helper.
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        LifecycleError::InvalidConfig(msg.into())
    }

    /// Lock poisoning inside a registry or store.
    pub(crate) fn poisoned(what: &str) -> Self {
        LifecycleError::Registry(format!("{what} lock poisoned"))
    }
}
