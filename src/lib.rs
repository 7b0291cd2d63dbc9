//! Model-lifecycle decision core.
//!
//! Picks the best hyperparameter candidate, gates inference on
//! missing-value drift, compares a freshly trained version with the one
//! serving a stage, and moves the stage label when the new version is at
//! least as good. Data loading, fitting and serving are left to the host;
//! the registry and metric store are passed in as trait objects.
//!
//! ```text
//! trials ─▶ select_best ─▶ (host trains) ─▶ compare ─▶ promote
//! drift report ─▶ check_drift ─▶ (host runs inference)
//! ```

pub mod common;
pub mod data;
pub mod evaluation;
pub mod promotion;
pub mod registry;
pub mod training;

pub use common::{AppCfg, ErrorCode, LifecycleError, LifecycleResult};
pub use evaluation::{check_drift, DriftMode, DriftReport};
pub use promotion::{compare, promote, Comparison, PromotionOutcome};
pub use registry::{InMemoryRegistry, ModelRegistry, ModelVersion, Stage};
pub use training::{run_search, select_best, CandidateResult, Classifier};
