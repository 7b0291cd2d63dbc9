//! Runtime configuration loaded from environment or a JSON document.
//!
//! Environment variables use the `LIFECYCLE_` prefix and override the
//! defaults field by field. Values that are present but unparseable are
//! rejected rather than defaulted.
//!
//! TODO: Layer a JSON file under the environment so `load` and `from_json_str` compose.

use std::env;
use std::str::FromStr;

use serde::Deserialize;

use crate::common::error::{LifecycleError, LifecycleResult};
use crate::evaluation::domain::{DriftMode, QualityThresholds, DEFAULT_NA_DRIFT_TOLERANCE};
use crate::registry::domain::Stage;

/// Output format for [`crate::common::log::init_tracing`].
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = LifecycleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(LifecycleError::invalid_config(format!(
                "unknown log format `{other}`"
            ))),
        }
    }
}

/// Snapshot of configuration values consumed by the core.
#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppCfg {
    pub data_root: String,
    pub model_name: String,
    pub target_env: String,
    pub na_drift_tolerance: f64,
    pub drift_mode: DriftMode,
    pub min_train_accuracy: f64,
    pub min_test_accuracy: f64,
    pub fail_on_accuracy_quality_gates: bool,
    pub log_format: LogFormat,
}

impl Default for AppCfg {
    fn default() -> Self {
        Self {
            data_root: "./data".to_string(),
            model_name: "e2e_use_case".to_string(),
            target_env: "staging".to_string(),
            na_drift_tolerance: DEFAULT_NA_DRIFT_TOLERANCE,
            drift_mode: DriftMode::default(),
            min_train_accuracy: 0.0,
            min_test_accuracy: 0.0,
            fail_on_accuracy_quality_gates: false,
            log_format: LogFormat::default(),
        }
    }
}

impl AppCfg {
    /// Create a configuration snapshot from the process environment.
    pub fn load() -> LifecycleResult<Self> {
        Self::load_with(|key| env::var(key).ok())
    }

    /// Same as [`AppCfg::load`] with an injected variable lookup.
    pub fn load_with<F>(lookup: F) -> LifecycleResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        fn parsed<T, F>(lookup: &F, key: &str, slot: &mut T) -> LifecycleResult<()>
        where
            T: FromStr,
            T::Err: std::fmt::Display,
            F: Fn(&str) -> Option<String>,
        {
            if let Some(raw) = lookup(key) {
                *slot = raw.trim().parse().map_err(|e: T::Err| {
                    LifecycleError::invalid_config(format!("{key}={raw:?}: {e}"))
                })?;
            }
            Ok(())
        }

        let mut cfg = Self::default();
        if let Some(v) = lookup("LIFECYCLE_DATA_ROOT") {
            cfg.data_root = v;
        }
        if let Some(v) = lookup("LIFECYCLE_MODEL_NAME") {
            cfg.model_name = v;
        }
        if let Some(v) = lookup("LIFECYCLE_TARGET_ENV") {
            cfg.target_env = v;
        }
        parsed(&lookup, "LIFECYCLE_NA_DRIFT_TOLERANCE", &mut cfg.na_drift_tolerance)?;
        parsed(&lookup, "LIFECYCLE_DRIFT_MODE", &mut cfg.drift_mode)?;
        parsed(&lookup, "LIFECYCLE_MIN_TRAIN_ACCURACY", &mut cfg.min_train_accuracy)?;
        parsed(&lookup, "LIFECYCLE_MIN_TEST_ACCURACY", &mut cfg.min_test_accuracy)?;
        parsed(
            &lookup,
            "LIFECYCLE_FAIL_ON_ACCURACY_GATES",
            &mut cfg.fail_on_accuracy_quality_gates,
        )?;
        parsed(&lookup, "LIFECYCLE_LOG_FORMAT", &mut cfg.log_format)?;

        cfg.validate()?;
        Ok(cfg)
    }

    /// Parse and validate a JSON configuration document.
    pub fn from_json_str(raw: &str) -> LifecycleResult<Self> {
        let cfg: AppCfg = serde_json::from_str(raw)
            .map_err(|e| LifecycleError::invalid_config(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Check semantic constraints that serde cannot express.
    pub fn validate(&self) -> LifecycleResult<()> {
        if self.model_name.trim().is_empty() {
            return Err(LifecycleError::invalid_config("model_name is empty"));
        }
        Stage::new(&self.target_env)?;
        if !(self.na_drift_tolerance >= 0.0) {
            return Err(LifecycleError::invalid_config(format!(
                "na_drift_tolerance must be >= 0, got {}",
                self.na_drift_tolerance
            )));
        }
        for (key, value) in [
            ("min_train_accuracy", self.min_train_accuracy),
            ("min_test_accuracy", self.min_test_accuracy),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(LifecycleError::invalid_config(format!(
                    "{key} must be within [0, 1], got {value}"
                )));
            }
        }
        Ok(())
    }

    /// Stage label promotions target.
    pub fn target_stage(&self) -> LifecycleResult<Stage> {
        Stage::new(&self.target_env)
    }

    pub fn quality_thresholds(&self) -> QualityThresholds {
        QualityThresholds {
            min_train_accuracy: self.min_train_accuracy,
            min_test_accuracy: self.min_test_accuracy,
            fail_on_violation: self.fail_on_accuracy_quality_gates,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_without_env() {
        let cfg = AppCfg::load_with(lookup(&[])).unwrap();
        assert_eq!(cfg.target_env, "staging");
        assert_eq!(cfg.na_drift_tolerance, 0.1);
        assert_eq!(cfg.drift_mode, DriftMode::ReferenceVsComparison);
        assert_eq!(cfg.log_format, LogFormat::Pretty);
    }

    #[test]
    fn env_overrides_defaults() {
        let cfg = AppCfg::load_with(lookup(&[
            ("LIFECYCLE_TARGET_ENV", "Production"),
            ("LIFECYCLE_NA_DRIFT_TOLERANCE", "0.25"),
            ("LIFECYCLE_DRIFT_MODE", "reference_vs_reference"),
            ("LIFECYCLE_FAIL_ON_ACCURACY_GATES", "true"),
            ("LIFECYCLE_LOG_FORMAT", "json"),
        ]))
        .unwrap();
        assert_eq!(cfg.target_stage().unwrap(), Stage::production());
        assert_eq!(cfg.na_drift_tolerance, 0.25);
        assert_eq!(cfg.drift_mode, DriftMode::ReferenceVsReference);
        assert!(cfg.quality_thresholds().fail_on_violation);
        assert_eq!(cfg.log_format, LogFormat::Json);
    }

    #[test]
    fn garbage_env_value_is_rejected() {
        let err = AppCfg::load_with(lookup(&[("LIFECYCLE_NA_DRIFT_TOLERANCE", "lots")]))
            .unwrap_err();
        assert!(matches!(err, LifecycleError::InvalidConfig(_)));
    }

    #[test]
    fn negative_tolerance_is_rejected() {
        let err = AppCfg::from_json_str(r#"{"na_drift_tolerance": -0.5}"#).unwrap_err();
        assert!(err.to_string().contains("na_drift_tolerance"));
    }

    #[test]
    fn json_document_fills_missing_fields_with_defaults() {
        let cfg = AppCfg::from_json_str(r#"{"min_test_accuracy": 0.7}"#).unwrap();
        assert_eq!(cfg.min_test_accuracy, 0.7);
        assert_eq!(cfg.model_name, "e2e_use_case");
    }

    #[test]
    fn accuracy_outside_unit_interval_is_rejected() {
        assert!(AppCfg::from_json_str(r#"{"min_train_accuracy": 1.5}"#).is_err());
    }
}
