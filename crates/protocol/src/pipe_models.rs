//! Declarative models for pipes, triggers, runners and services.
//!
//! These structures describe *what* should run. They are deserialized from
//! `.conduit/runners/*.yaml` and `.conduit/services/*.yaml` and turned into
//! live instances by the factory in `conduit-core`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use ts_rs::TS;

/// Parameter mapping as written in configuration.
///
/// Values may still contain unrendered template expressions.
pub type Params = BTreeMap<String, Value>;

/// The `if` guard of a step.
///
/// Either a literal boolean or a template string that is rendered against
/// the execution context right before the step is built.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
#[serde(untagged)]
pub enum Condition {
    /// A literal `true` / `false`.
    Literal(bool),

    /// A template expression, e.g. `"{{ params.enabled }}"`.
    Template(String),
}

impl Default for Condition {
    fn default() -> Self {
        Condition::Literal(true)
    }
}

fn is_default_condition(condition: &Condition) -> bool {
    *condition == Condition::Literal(true)
}

/// Configuration of a single step in a pipeline tree.
///
/// # Example
///
/// ```yaml
/// id: triage
/// use: composite
/// steps:
///   - id: fetch
///     use: log
///     params:
///       message: "fetching tickets for {{ params.project }}"
///   - id: report
///     use: log
///     depends_on: [fetch]
///     if: "{{ pipe_results.fetch.succeeded }}"
///     params:
///       message: "{{ pipe_results.fetch.message }}"
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
pub struct PipeConfig {
    /// Identifier, unique across the whole execution tree.
    pub id: String,

    /// Registry key of the implementation.
    #[serde(rename = "use")]
    pub uses: String,

    /// Constructor parameters, rendered before construction.
    #[serde(default)]
    #[ts(type = "Record<string, unknown>")]
    pub params: Params,

    /// Constructor parameter name to service id.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub injects: BTreeMap<String, String>,

    /// Step ids that must have succeeded before this step runs.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,

    /// Guard evaluated before running; defaults to `true`.
    #[serde(rename = "if", default, skip_serializing_if = "is_default_condition")]
    pub condition: Condition,

    /// Ordered child steps (composite pipes only).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[ts(type = "Array<PipeConfig>")]
    pub steps: Vec<PipeConfig>,
}

impl PipeConfig {
    /// Create a bare config with no params, dependencies or children.
    pub fn new(id: impl Into<String>, uses: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            uses: uses.into(),
            params: Params::new(),
            injects: BTreeMap::new(),
            depends_on: Vec::new(),
            condition: Condition::default(),
            steps: Vec::new(),
        }
    }

    /// Set a single parameter.
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Add a service injection.
    pub fn with_inject(mut self, name: impl Into<String>, service_id: impl Into<String>) -> Self {
        self.injects.insert(name.into(), service_id.into());
        self
    }

    /// Add a dependency on another step id.
    pub fn depends_on(mut self, id: impl Into<String>) -> Self {
        self.depends_on.push(id.into());
        self
    }

    /// Replace the `if` guard.
    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.condition = condition;
        self
    }

    /// Append a child step.
    pub fn with_step(mut self, step: PipeConfig) -> Self {
        self.steps.push(step);
        self
    }

    /// Depth-first iterator over this config and all nested steps.
    pub fn walk(&self) -> Vec<&PipeConfig> {
        let mut out = vec![self];
        for step in &self.steps {
            out.extend(step.walk());
        }
        out
    }

    /// Returns the first id that appears more than once in the tree.
    ///
    /// Nested results are flattened into one context, so uniqueness is
    /// required across the whole tree rather than among siblings.
    pub fn find_duplicate_id(&self) -> Option<&str> {
        let mut seen = HashSet::new();
        self.walk()
            .into_iter()
            .map(|config| config.id.as_str())
            .find(|id| !seen.insert(*id))
    }
}

/// A trigger referenced by one or more runners.
///
/// Triggers are shared by `id`: every runner that lists the same id is
/// attached to a single live instance.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
pub struct TriggerDefinition {
    pub id: String,

    #[serde(rename = "use", default = "default_trigger_type")]
    pub uses: String,

    #[serde(default)]
    #[ts(type = "Record<string, unknown>")]
    pub params: Params,
}

fn default_trigger_type() -> String {
    "interval".to_string()
}

impl TriggerDefinition {
    pub fn new(id: impl Into<String>, uses: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            uses: uses.into(),
            params: Params::new(),
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }
}

/// A scheduled pipeline: which triggers fire it and what it runs.
///
/// # Example
///
/// ```yaml
/// on:
///   - id: every-minute
///     use: interval
///     params:
///       minutes: 1
/// run:
///   id: sync
///   use: composite
///   steps: []
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
pub struct RunnerDefinition {
    /// Runner identifier; falls back to `run.id` when omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Triggers this runner observes.
    #[serde(default)]
    pub on: Vec<TriggerDefinition>,

    /// The pipe executed on every firing.
    pub run: PipeConfig,
}

impl RunnerDefinition {
    pub fn new(run: PipeConfig) -> Self {
        Self {
            id: None,
            on: Vec::new(),
            run,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn on(mut self, trigger: TriggerDefinition) -> Self {
        self.on.push(trigger);
        self
    }

    /// The effective runner id.
    pub fn runner_id(&self) -> &str {
        self.id.as_deref().unwrap_or(&self.run.id)
    }
}

/// An independently configured, injectable service.
///
/// Services are looked up by `id` when a pipe lists them under `injects`
/// and are constructed the same way a pipe is.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
pub struct ServiceDefinition {
    pub id: String,

    #[serde(rename = "use")]
    pub uses: String,

    #[serde(default)]
    #[ts(type = "Record<string, unknown>")]
    pub params: Params,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub injects: BTreeMap<String, String>,
}

impl ServiceDefinition {
    pub fn new(id: impl Into<String>, uses: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            uses: uses.into(),
            params: Params::new(),
            injects: BTreeMap::new(),
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn with_inject(mut self, name: impl Into<String>, service_id: impl Into<String>) -> Self {
        self.injects.insert(name.into(), service_id.into());
        self
    }
}
