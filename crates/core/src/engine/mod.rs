//! Pipe execution engine.
//!
//! A pipeline is a tree of [`PipeConfig`]s. The engine builds each node
//! through the [`RenderableFactory`] right before it runs, checks its
//! condition and dependencies, runs it and threads an immutable
//! [`PipeContext`] from one step to the next.

mod composite;
mod context;
mod error;
mod pipe;

pub use composite::{CompositeParams, CompositePipe};
pub use context::{PipeContext, PipeResults};
pub use error::PipeError;
pub use pipe::{Pipe, PipeInstance};

pub(crate) use pipe::unmet_dependencies;

use crate::factory::{ConfigurationError, RenderableFactory};
use conduit_protocol::pipe_models::PipeConfig;
use conduit_protocol::result_models::PipeResult;
use tracing::{error, info};

/// Build and execute one pipeline tree against `context`.
///
/// This is the catch boundary for step failures: a render or step error
/// raised by the root step becomes a failed result recorded under the root
/// id. Configuration errors are returned.
///
/// # Arguments
///
/// * `factory` - Factory used for the root and every nested step
/// * `config` - Root of the tree
/// * `context` - Starting context, usually fresh
///
/// # Returns
///
/// The final context and the root step's result.
///
/// # Errors
///
/// Returns a [`ConfigurationError`] for duplicate ids anywhere in the tree,
/// or for any broken declaration met while building a step.
pub async fn run_pipeline(
    factory: &RenderableFactory,
    config: &PipeConfig,
    context: PipeContext,
) -> Result<(PipeContext, PipeResult), ConfigurationError> {
    if let Some(step_id) = config.find_duplicate_id() {
        return Err(ConfigurationError::DuplicateId {
            step_id: step_id.to_string(),
        });
    }

    let outcome = match factory.build_pipe(config, &context) {
        Ok(instance) => instance.execute(context.clone()).await,
        Err(error) => Err(error),
    };

    match outcome {
        Ok((context, result)) => {
            info!(step = %config.id, state = %result.state(), "Pipeline finished");
            Ok((context, result))
        }
        Err(PipeError::Configuration(error)) => Err(error),
        Err(error) => {
            error!(step = %config.id, %error, "Pipeline failed");
            let result = PipeResult::failure(format!("step '{}' failed: {}", config.id, error));
            Ok((context.with_pipe_result(config.id.clone(), result.clone()), result))
        }
    }
}
