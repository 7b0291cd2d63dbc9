//! Model versions, stage labels and the registry contract.
//!
//! A stage label is a deployment slot: at most one version of a model holds
//! it at a time. Assigning a stage moves it; the previous holder keeps its
//! version record but loses the label.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::common::error::{LifecycleError, LifecycleResult};
use crate::training::domain::Classifier;

/// Normalised (trimmed, lowercase) stage label.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Stage(String);

impl Stage {
    pub fn new(label: &str) -> LifecycleResult<Self> {
        let label = label.trim().to_ascii_lowercase();
        if label.is_empty() {
            return Err(LifecycleError::invalid_config("stage label is empty"));
        }
        Ok(Self(label))
    }

    pub fn production() -> Self {
        Self("production".to_string())
    }

    pub fn staging() -> Self {
        Self("staging".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Stage {
    type Error = LifecycleError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Stage::new(&value)
    }
}

impl From<Stage> for String {
    fn from(value: Stage) -> Self {
        value.0
    }
}

/// Registry record for one version of a named model.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ModelVersion {
    pub name: String,
    pub number: u32,
    pub stage: Option<Stage>,
}

impl ModelVersion {
    pub fn new(name: impl Into<String>, number: u32) -> Self {
        Self {
            name: name.into(),
            number,
            stage: None,
        }
    }

    pub fn holds(&self, stage: &Stage) -> bool {
        self.stage.as_ref() == Some(stage)
    }
}

/// A version together with its loadable artifact.
#[derive(Clone)]
pub struct RegisteredModel {
    pub version: ModelVersion,
    pub artifact: Arc<dyn Classifier>,
}

impl fmt::Debug for RegisteredModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisteredModel")
            .field("version", &self.version)
            .finish_non_exhaustive()
    }
}

/// Receipt of a successful stage write.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StageAssignment {
    pub name: String,
    pub stage: Stage,
    pub version: u32,
    /// Holder before the write; `None` when the stage was unoccupied.
    pub previous: Option<u32>,
    pub assigned_ms: u64,
}

/// Repository contract for model versions and their stage labels.
pub trait ModelRegistry: Send + Sync {
    /// The version currently holding `stage`. `Ok(None)` means nobody does;
    /// any other failure is [`LifecycleError::IncumbentLookup`].
    fn find_by_stage(&self, name: &str, stage: &Stage) -> LifecycleResult<Option<RegisteredModel>>;

    fn get(&self, name: &str, number: u32) -> LifecycleResult<RegisteredModel>;

    /// Atomically move `stage` to version `number`, provided the current
    /// holder is `expected_holder`. Otherwise fails with
    /// [`LifecycleError::StageAssignmentConflict`] and changes nothing.
    fn assign_stage(
        &self,
        name: &str,
        number: u32,
        stage: &Stage,
        expected_holder: Option<u32>,
    ) -> LifecycleResult<StageAssignment>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_labels_are_normalised() {
        assert_eq!(Stage::new("  Production ").unwrap(), Stage::production());
        assert!(Stage::new("   ").is_err());
    }

    #[test]
    fn stage_round_trips_through_serde_as_plain_string() {
        let v: ModelVersion =
            serde_json::from_str(r#"{"name":"m","number":3,"stage":"Staging"}"#).unwrap();
        assert!(v.holds(&Stage::staging()));
        assert!(serde_json::from_str::<Stage>(r#""""#).is_err());
    }
}
