//! Model registry domain: versions, stage labels, compare-and-swap stage writes.

pub mod domain;
pub mod repo_mem;

pub use domain::{ModelRegistry, ModelVersion, RegisteredModel, Stage, StageAssignment};
pub use repo_mem::InMemoryRegistry;
