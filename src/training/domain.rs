//! Domain types for hyperparameter search and candidate bookkeeping.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::common::error::{LifecycleError, LifecycleResult};
use crate::common::time;
use crate::data::domain::Label;

/// A trained model that can label feature rows.
pub trait Classifier: Send + Sync {
    fn predict(&self, features: &[f64]) -> Label;

    fn predict_batch(&self, rows: &[Vec<f64>]) -> Vec<Label> {
        rows.iter().map(|row| self.predict(row)).collect()
    }
}

/// Output of one hyperparameter-search trial. Immutable once built.
#[derive(Clone, Debug)]
pub struct CandidateResult<A> {
    candidate_id: String,
    metric: f64,
    artifact: A,
}

impl<A> CandidateResult<A> {
    pub fn new(candidate_id: impl Into<String>, metric: f64, artifact: A) -> Self {
        Self {
            candidate_id: candidate_id.into(),
            metric,
            artifact,
        }
    }

    pub fn candidate_id(&self) -> &str {
        &self.candidate_id
    }

    pub fn metric(&self) -> f64 {
        self.metric
    }

    pub fn artifact(&self) -> &A {
        &self.artifact
    }

    pub fn into_artifact(self) -> A {
        self.artifact
    }
}

/// Supported estimator families. A closed set: configuration naming
/// anything else is rejected instead of resolved at runtime.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EstimatorFamily {
    RandomForest,
    ExtraTrees,
    GradientBoosting,
    HistGradientBoosting,
    AdaBoost,
    DecisionTree,
    ExtraTree,
}

impl EstimatorFamily {
    const ENSEMBLE: &'static str = "sklearn.ensemble";
    const TREE: &'static str = "sklearn.tree";

    /// Map a `(package, class)` pair from the search-space config.
    pub fn from_config(package: &str, class: &str) -> LifecycleResult<Self> {
        let family = match (package, class) {
            (Self::ENSEMBLE, "RandomForestClassifier") => EstimatorFamily::RandomForest,
            (Self::ENSEMBLE, "ExtraTreesClassifier") => EstimatorFamily::ExtraTrees,
            (Self::ENSEMBLE, "GradientBoostingClassifier") => EstimatorFamily::GradientBoosting,
            (Self::ENSEMBLE, "HistGradientBoostingClassifier") => {
                EstimatorFamily::HistGradientBoosting
            }
            (Self::ENSEMBLE, "AdaBoostClassifier") => EstimatorFamily::AdaBoost,
            (Self::TREE, "DecisionTreeClassifier") => EstimatorFamily::DecisionTree,
            (Self::TREE, "ExtraTreeClassifier") => EstimatorFamily::ExtraTree,
            _ => {
                return Err(LifecycleError::UnsupportedEstimator {
                    package: package.to_string(),
                    class: class.to_string(),
                })
            }
        };
        Ok(family)
    }

    pub fn package(&self) -> &'static str {
        match self {
            EstimatorFamily::DecisionTree | EstimatorFamily::ExtraTree => Self::TREE,
            _ => Self::ENSEMBLE,
        }
    }

    pub fn class_name(&self) -> &'static str {
        match self {
            EstimatorFamily::RandomForest => "RandomForestClassifier",
            EstimatorFamily::ExtraTrees => "ExtraTreesClassifier",
            EstimatorFamily::GradientBoosting => "GradientBoostingClassifier",
            EstimatorFamily::HistGradientBoosting => "HistGradientBoostingClassifier",
            EstimatorFamily::AdaBoost => "AdaBoostClassifier",
            EstimatorFamily::DecisionTree => "DecisionTreeClassifier",
            EstimatorFamily::ExtraTree => "ExtraTreeClassifier",
        }
    }
}

impl fmt::Display for EstimatorFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.package(), self.class_name())
    }
}

/// Candidate values per hyperparameter, in declaration order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParamGrid {
    params: Vec<(String, Vec<Value>)>,
}

impl ParamGrid {
    /// Expand a raw `search_grid` object. Each entry is a list of values,
    /// a `{"range": {"start", "end", "step"?}}` object, or a single value.
    pub fn from_raw(raw: &Map<String, Value>) -> LifecycleResult<Self> {
        let mut params = Vec::with_capacity(raw.len());
        for (name, spec) in raw {
            let values = match spec {
                Value::Array(values) => values.clone(),
                Value::Object(obj) if obj.contains_key("range") => {
                    let range: IntRange = serde_json::from_value(obj["range"].clone())
                        .map_err(|e| {
                            LifecycleError::invalid_config(format!("search_grid.{name}: {e}"))
                        })?;
                    range.expand(name)?
                }
                other => vec![other.clone()],
            };
            if values.is_empty() {
                return Err(LifecycleError::invalid_config(format!(
                    "search_grid.{name} has no candidate values"
                )));
            }
            params.push((name.clone(), values));
        }
        Ok(Self { params })
    }

    pub fn get(&self, name: &str) -> Option<&[Value]> {
        self.params
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Value])> {
        self.params.iter().map(|(n, v)| (n.as_str(), v.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Size of the full cartesian grid.
    pub fn combinations(&self) -> usize {
        self.params.iter().map(|(_, v)| v.len()).product()
    }
}

/// Upper bound on the values a single `range` entry may expand to.
pub const MAX_RANGE_VALUES: usize = 10_000;

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct IntRange {
    start: i64,
    end: i64,
    #[serde(default = "IntRange::default_step")]
    step: i64,
}

impl IntRange {
    fn default_step() -> i64 {
        1
    }

    fn expand(&self, name: &str) -> LifecycleResult<Vec<Value>> {
        if self.step <= 0 {
            return Err(LifecycleError::invalid_config(format!(
                "search_grid.{name}: range step must be positive, got {}",
                self.step
            )));
        }
        let span = (i128::from(self.end) - i128::from(self.start)).max(0);
        let count = (span + i128::from(self.step) - 1) / i128::from(self.step);
        if count > MAX_RANGE_VALUES as i128 {
            return Err(LifecycleError::invalid_config(format!(
                "search_grid.{name}: range yields {count} values, limit is {MAX_RANGE_VALUES}"
            )));
        }
        let step = usize::try_from(self.step).map_err(|_| {
            LifecycleError::invalid_config(format!("search_grid.{name}: range step too large"))
        })?;
        Ok((self.start..self.end).step_by(step).map(Value::from).collect())
    }
}

/// One entry of the search space.
#[derive(Clone, Debug, PartialEq)]
pub struct SearchConfig {
    pub name: String,
    pub family: EstimatorFamily,
    pub grid: ParamGrid,
}

#[derive(Deserialize)]
struct RawSearchConfig {
    model_package: String,
    model_class: String,
    #[serde(default)]
    search_grid: Map<String, Value>,
}

/// Ordered set of estimator configurations to search.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SearchSpace {
    configs: Vec<SearchConfig>,
}

impl SearchSpace {
    /// Prefix of every trial's candidate id.
    pub const CANDIDATE_PREFIX: &'static str = "hp_tuning_search_";

    pub fn new(configs: Vec<SearchConfig>) -> Self {
        Self { configs }
    }

    /// Parse `{"<name>": {"model_package", "model_class", "search_grid"}}`,
    /// keeping document order.
    pub fn from_json(raw: &str) -> LifecycleResult<Self> {
        let doc: Map<String, Value> = serde_json::from_str(raw)
            .map_err(|e| LifecycleError::invalid_config(format!("model_search_space: {e}")))?;
        let mut configs = Vec::with_capacity(doc.len());
        for (name, entry) in doc {
            let raw: RawSearchConfig = serde_json::from_value(entry)
                .map_err(|e| LifecycleError::invalid_config(format!("{name}: {e}")))?;
            configs.push(SearchConfig {
                family: EstimatorFamily::from_config(&raw.model_package, &raw.model_class)?,
                grid: ParamGrid::from_raw(&raw.search_grid)?,
                name,
            });
        }
        Ok(Self { configs })
    }

    pub fn configs(&self) -> &[SearchConfig] {
        &self.configs
    }

    /// One trial per configuration, in order.
    pub fn trial_specs(&self) -> Vec<TrialSpec> {
        self.configs
            .iter()
            .map(|cfg| TrialSpec {
                candidate_id: format!("{}{}", Self::CANDIDATE_PREFIX, cfg.name),
                family: cfg.family,
                grid: cfg.grid.clone(),
            })
            .collect()
    }
}

/// What a trial runner is asked to search.
#[derive(Clone, Debug, PartialEq)]
pub struct TrialSpec {
    pub candidate_id: String,
    pub family: EstimatorFamily,
    pub grid: ParamGrid,
}

/// What a trial runner hands back.
#[derive(Clone, Debug)]
pub struct TrialOutcome<A> {
    pub metric: f64,
    pub artifact: A,
    /// Hyperparameters the search settled on.
    pub params: Map<String, Value>,
}

/// Runs one independent search trial. Implementations must not read other
/// trials' results; trials execute concurrently.
pub trait TrialRunner: Send + Sync {
    type Artifact: Send;

    fn run(&self, spec: &TrialSpec) -> LifecycleResult<TrialOutcome<Self::Artifact>>;
}

/// One metric observation for a candidate.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MetricRecord {
    pub candidate_id: String,
    pub metric: f64,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    pub recorded_ms: u64,
}

impl MetricRecord {
    pub fn new(candidate_id: impl Into<String>, metric: f64, metadata: Map<String, Value>) -> Self {
        Self {
            candidate_id: candidate_id.into(),
            metric,
            metadata,
            recorded_ms: time::now_ms(),
        }
    }
}

/// Repository contract for candidate metrics. Shared by concurrent trials.
pub trait MetricStore: Send + Sync {
    fn record(&self, record: MetricRecord) -> LifecycleResult<()>;
    /// Most recent record for the candidate, if any.
    fn get(&self, candidate_id: &str) -> LifecycleResult<Option<MetricRecord>>;
    /// All records in insertion order.
    fn list(&self) -> LifecycleResult<Vec<MetricRecord>>;
}
