//! The step abstraction.
//!
//! Implementations provide [`Pipe::run`]. The engine never calls it
//! directly: a live step is wrapped in a [`PipeInstance`], which owns the
//! step's id, its dependencies and its rendered condition, and performs the
//! should-run check before delegating.

use super::context::PipeContext;
use super::error::PipeError;
use async_trait::async_trait;
use conduit_protocol::result_models::PipeResult;
use tracing::{debug, info_span, Instrument};

/// A unit of work.
#[async_trait]
pub trait Pipe: Send + Sync {
    /// Perform the work against `context`.
    ///
    /// Called only when the step's condition and dependencies allow it, so
    /// implementations must not repeat that check. Errors are returned as is
    /// and converted by the enclosing composite or runner.
    async fn run(&self, context: &PipeContext) -> Result<PipeResult, PipeError>;

    /// Run and also return the context the step leaves behind.
    ///
    /// Leaf pipes never record anything themselves, so the default returns
    /// the input context untouched. Pipes that execute nested steps override
    /// this to hand back the results of those steps.
    async fn run_in_context(
        &self,
        context: PipeContext,
    ) -> Result<(PipeContext, PipeResult), PipeError> {
        let result = self.run(&context).await?;
        Ok((context, result))
    }
}

/// A freshly built step, ready to be processed once.
///
/// A step that was already known to skip when it was built carries no pipe
/// at all: its params were never rendered and nothing was constructed.
pub struct PipeInstance {
    id: String,
    depends_on: Vec<String>,
    condition: bool,
    pipe: Option<Box<dyn Pipe>>,
}

impl std::fmt::Debug for PipeInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipeInstance")
            .field("id", &self.id)
            .field("depends_on", &self.depends_on)
            .field("condition", &self.condition)
            .field("built", &self.pipe.is_some())
            .finish_non_exhaustive()
    }
}

impl PipeInstance {
    pub fn new(
        id: impl Into<String>,
        depends_on: Vec<String>,
        condition: bool,
        pipe: Box<dyn Pipe>,
    ) -> Self {
        Self {
            id: id.into(),
            depends_on,
            condition,
            pipe: Some(pipe),
        }
    }

    /// A step that always skips and never runs anything.
    pub fn skipping(id: impl Into<String>, depends_on: Vec<String>, condition: bool) -> Self {
        Self {
            id: id.into(),
            depends_on,
            condition,
            pipe: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn depends_on(&self) -> &[String] {
        &self.depends_on
    }

    /// Reason the step must be skipped, or `None` if it may run.
    fn skip_reason(&self, context: &PipeContext) -> Option<String> {
        if !self.condition {
            return Some("condition not met".to_string());
        }
        if let Some(reason) = unmet_dependencies(&self.depends_on, context) {
            return Some(reason);
        }
        match self.pipe {
            Some(_) => None,
            None => Some("not built".to_string()),
        }
    }

    /// Whether the condition holds and every dependency has succeeded.
    pub fn should_run(&self, context: &PipeContext) -> bool {
        self.skip_reason(context).is_none()
    }

    /// Run the step if allowed, otherwise return a skipped result.
    ///
    /// Skipping has no side effects. Errors from the step are propagated.
    pub async fn process(&self, context: &PipeContext) -> Result<PipeResult, PipeError> {
        if let Some(reason) = self.skip_reason(context) {
            debug!(step = %self.id, %reason, "Skipping step");
            return Ok(PipeResult::skipped().with_message(reason));
        }

        let Some(pipe) = &self.pipe else {
            return Ok(PipeResult::skipped().with_message("not built"));
        };

        pipe.run(context)
            .instrument(info_span!("step", step = %self.id))
            .await
    }

    /// Like [`process`](Self::process), but threads the context through.
    ///
    /// A skipped step returns `context` unchanged. Otherwise the returned
    /// context holds everything the step recorded plus its own result under
    /// its id.
    pub async fn execute(
        &self,
        context: PipeContext,
    ) -> Result<(PipeContext, PipeResult), PipeError> {
        if let Some(reason) = self.skip_reason(&context) {
            debug!(step = %self.id, %reason, "Skipping step");
            return Ok((context, PipeResult::skipped().with_message(reason)));
        }

        let Some(pipe) = &self.pipe else {
            return Ok((context, PipeResult::skipped().with_message("not built")));
        };

        let (context, result) = pipe
            .run_in_context(context)
            .instrument(info_span!("step", step = %self.id))
            .await?;

        debug!(step = %self.id, state = %result.state(), "Step finished");
        let context = context.with_pipe_result(self.id.clone(), result.clone());
        Ok((context, result))
    }
}

/// Describes the dependencies in `depends_on` that have not succeeded in
/// `context`, or `None` when all of them have.
pub(crate) fn unmet_dependencies(depends_on: &[String], context: &PipeContext) -> Option<String> {
    let unmet: Vec<&str> = depends_on
        .iter()
        .filter(|id| !context.has_succeeded(id))
        .map(String::as_str)
        .collect();

    if unmet.is_empty() {
        None
    } else {
        Some(format!("unmet dependencies: {}", unmet.join(", ")))
    }
}
