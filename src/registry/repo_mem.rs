//! In-memory model registry. All reads and stage writes go through one
//! mutex, so a compare-and-swap on a stage label is atomic.
//!
//! TODO: Add a file-backed registry so stage holders survive a pipeline restart.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::common::error::{LifecycleError, LifecycleResult};
use crate::common::time;
use crate::training::domain::Classifier;

use super::domain::{ModelRegistry, ModelVersion, RegisteredModel, Stage, StageAssignment};

#[derive(Default)]
pub struct InMemoryRegistry {
    models: Mutex<HashMap<String, Vec<RegisteredModel>>>,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new version of `name`. Version numbers start at 1 and
    /// increase by one per registration.
    pub fn register(
        &self,
        name: &str,
        artifact: Arc<dyn Classifier>,
    ) -> LifecycleResult<ModelVersion> {
        let mut models = self
            .models
            .lock()
            .map_err(|_| LifecycleError::poisoned("registry"))?;
        let versions = models.entry(name.to_string()).or_default();
        let version = ModelVersion::new(name, next_version_number(versions.len())?);
        versions.push(RegisteredModel {
            version: version.clone(),
            artifact,
        });
        debug!(model = name, version = version.number, "registered model version");
        Ok(version)
    }

    /// All versions of `name`, oldest first.
    pub fn versions(&self, name: &str) -> LifecycleResult<Vec<ModelVersion>> {
        let models = self
            .models
            .lock()
            .map_err(|_| LifecycleError::poisoned("registry"))?;
        Ok(models
            .get(name)
            .map(|vs| vs.iter().map(|m| m.version.clone()).collect())
            .unwrap_or_default())
    }
}

fn next_version_number(registered: usize) -> LifecycleResult<u32> {
    u32::try_from(registered)
        .ok()
        .and_then(|n| n.checked_add(1))
        .ok_or_else(|| LifecycleError::Registry(format!("version space exhausted at {registered}")))
}

impl ModelRegistry for InMemoryRegistry {
    fn find_by_stage(&self, name: &str, stage: &Stage) -> LifecycleResult<Option<RegisteredModel>> {
        let models = self
            .models
            .lock()
            .map_err(|_| LifecycleError::IncumbentLookup {
                name: name.to_string(),
                stage: stage.to_string(),
                reason: "registry lock poisoned".to_string(),
            })?;
        Ok(models
            .get(name)
            .and_then(|vs| vs.iter().find(|m| m.version.holds(stage)))
            .cloned())
    }

    fn get(&self, name: &str, number: u32) -> LifecycleResult<RegisteredModel> {
        let models = self
            .models
            .lock()
            .map_err(|_| LifecycleError::poisoned("registry"))?;
        models
            .get(name)
            .and_then(|vs| vs.iter().find(|m| m.version.number == number))
            .cloned()
            .ok_or_else(|| LifecycleError::VersionNotFound {
                name: name.to_string(),
                version: number,
            })
    }

    fn assign_stage(
        &self,
        name: &str,
        number: u32,
        stage: &Stage,
        expected_holder: Option<u32>,
    ) -> LifecycleResult<StageAssignment> {
        let mut models = self
            .models
            .lock()
            .map_err(|_| LifecycleError::poisoned("registry"))?;
        let not_found = || LifecycleError::VersionNotFound {
            name: name.to_string(),
            version: number,
        };
        let versions = models.get_mut(name).ok_or_else(not_found)?;
        if !versions.iter().any(|m| m.version.number == number) {
            return Err(not_found());
        }

        let holder = versions
            .iter()
            .find(|m| m.version.holds(stage))
            .map(|m| m.version.number);
        if holder != expected_holder {
            return Err(LifecycleError::StageAssignmentConflict {
                name: name.to_string(),
                stage: stage.to_string(),
                expected: expected_holder,
                found: holder,
            });
        }

        for model in versions.iter_mut() {
            if model.version.number == number {
                model.version.stage = Some(stage.clone());
            } else if model.version.holds(stage) {
                model.version.stage = None;
            }
        }

        Ok(StageAssignment {
            name: name.to_string(),
            stage: stage.clone(),
            version: number,
            previous: holder,
            assigned_ms: time::now_ms(),
        })
    }
}
