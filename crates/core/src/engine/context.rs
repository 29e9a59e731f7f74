//! Immutable execution context.
//!
//! A `PipeContext` is the accumulating record of one execution: the results
//! of every step that has run so far, the ambient parameters visible to
//! templates and, inside a composite, a link to the enclosing context.
//!
//! Contexts are values. Every update returns a new context and leaves the
//! receiver untouched, so any clone that was handed out stays a valid
//! snapshot. The results map is shared behind an `Arc` and only copied when
//! a new entry is written.

use conduit_protocol::result_models::PipeResult;
use indexmap::IndexMap;
use serde_json::{json, Map, Value};
use std::sync::Arc;

/// Results keyed by step id, in completion order.
pub type PipeResults = IndexMap<String, PipeResult>;

#[derive(Debug, Clone, Default)]
pub struct PipeContext {
    pipe_results: Arc<PipeResults>,
    params: Map<String, Value>,
    parent: Option<Arc<PipeContext>>,
}

impl PipeContext {
    /// A fresh, empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// A fresh context seeded with ambient parameters.
    pub fn with_params(params: Map<String, Value>) -> Self {
        Self {
            params,
            ..Self::default()
        }
    }

    pub fn pipe_results(&self) -> &PipeResults {
        &self.pipe_results
    }

    pub fn params(&self) -> &Map<String, Value> {
        &self.params
    }

    pub fn parent(&self) -> Option<&PipeContext> {
        self.parent.as_deref()
    }

    /// Result recorded for `step_id`, if any.
    pub fn result(&self, step_id: &str) -> Option<&PipeResult> {
        self.pipe_results.get(step_id)
    }

    /// True when `step_id` ran and succeeded.
    pub fn has_succeeded(&self, step_id: &str) -> bool {
        self.result(step_id)
            .is_some_and(|result| result.succeeded && !result.was_skipped)
    }

    /// A new context with `result` recorded under `step_id`.
    pub fn with_pipe_result(&self, step_id: impl Into<String>, result: PipeResult) -> Self {
        let mut pipe_results = (*self.pipe_results).clone();
        pipe_results.insert(step_id.into(), result);
        Self {
            pipe_results: Arc::new(pipe_results),
            params: self.params.clone(),
            parent: self.parent.clone(),
        }
    }

    /// A child scope for a composite: same results, the composite's own
    /// params, and this context as parent.
    pub fn with_parent(&self, params: Map<String, Value>) -> Self {
        Self {
            pipe_results: Arc::clone(&self.pipe_results),
            params,
            parent: Some(Arc::new(self.clone())),
        }
    }

    /// Keep this context's params and parent but take the results of `other`.
    ///
    /// Used when leaving a composite scope so everything recorded inside it
    /// stays visible to the caller.
    pub fn with_results_of(&self, other: &PipeContext) -> Self {
        Self {
            pipe_results: Arc::clone(&other.pipe_results),
            params: self.params.clone(),
            parent: self.parent.clone(),
        }
    }

    /// The JSON scope handed to the template renderer.
    ///
    /// ```text
    /// {
    ///   "pipe_results": { "<id>": { "succeeded", "was_skipped", "message", "data" } },
    ///   "params": { ... },
    ///   "parent": { "params": { ... }, "parent": ... } | null
    /// }
    /// ```
    pub fn template_scope(&self) -> Value {
        let pipe_results: Map<String, Value> = self
            .pipe_results
            .iter()
            .map(|(id, result)| (id.clone(), result_to_value(result)))
            .collect();

        json!({
            "pipe_results": pipe_results,
            "params": self.params,
            "parent": self.parent.as_deref().map(PipeContext::ambient_scope),
        })
    }

    fn ambient_scope(&self) -> Value {
        json!({
            "params": self.params,
            "parent": self.parent.as_deref().map(PipeContext::ambient_scope),
        })
    }
}

fn result_to_value(result: &PipeResult) -> Value {
    json!({
        "succeeded": result.succeeded,
        "was_skipped": result.was_skipped,
        "message": result.message,
        "data": result.data,
    })
}
