//! Sequential execution of nested steps (`use: composite`).

use super::context::PipeContext;
use super::error::PipeError;
use super::pipe::Pipe;
use crate::factory::{Dependencies, RenderableFactory, Renderable};
use async_trait::async_trait;
use conduit_protocol::pipe_models::PipeConfig;
use conduit_protocol::result_models::PipeResult;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::warn;
use validator::{Validate, ValidationErrors};

/// Free-form params of a composite.
///
/// They are not interpreted by the composite itself. Children see them as
/// `params` in their templates, and the caller's params as `parent.params`.
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct CompositeParams(pub Map<String, Value>);

impl Validate for CompositeParams {
    fn validate(&self) -> Result<(), ValidationErrors> {
        Ok(())
    }
}

/// Runs child steps in declaration order.
///
/// Each child is built against the context threaded through the previous
/// children, so later steps can reference earlier results. The children's
/// results are flattened into the caller's context; the composite's own
/// result is the union of every child that was not skipped.
pub struct CompositePipe {
    id: String,
    params: Map<String, Value>,
    steps: Vec<PipeConfig>,
    factory: RenderableFactory,
}

impl CompositePipe {
    pub fn steps(&self) -> &[PipeConfig] {
        &self.steps
    }
}

impl Renderable for CompositePipe {
    type Params = CompositeParams;

    fn build(params: CompositeParams, deps: Dependencies) -> anyhow::Result<Self> {
        Ok(Self {
            id: deps.step_id().to_string(),
            params: params.0,
            steps: deps.steps().to_vec(),
            factory: deps.factory().clone(),
        })
    }
}

#[async_trait]
impl Pipe for CompositePipe {
    async fn run(&self, context: &PipeContext) -> Result<PipeResult, PipeError> {
        let (_, result) = self.run_in_context(context.clone()).await?;
        Ok(result)
    }

    /// Configuration errors from any child propagate. Any other error ends
    /// the composite with a failed result while keeping the results of the
    /// children that already ran.
    async fn run_in_context(
        &self,
        context: PipeContext,
    ) -> Result<(PipeContext, PipeResult), PipeError> {
        let mut threaded = context.with_parent(self.params.clone());
        let mut results = Vec::with_capacity(self.steps.len());

        for step in &self.steps {
            let outcome = match self.factory.build_pipe(step, &threaded) {
                Ok(child) => child.execute(threaded.clone()).await,
                Err(error) => Err(error),
            };

            match outcome {
                Ok((next, result)) => {
                    threaded = next;
                    if !result.was_skipped {
                        results.push(result);
                    }
                }
                Err(error) if error.is_fatal() => return Err(error),
                Err(error) => {
                    warn!(composite = %self.id, step = %step.id, %error, "Step failed");
                    let failure = PipeResult::failure(format!(
                        "composite '{}' stopped at step '{}': {}",
                        self.id, step.id, error
                    ));
                    return Ok((context.with_results_of(&threaded), failure));
                }
            }
        }

        Ok((context.with_results_of(&threaded), PipeResult::union(results)))
    }
}
