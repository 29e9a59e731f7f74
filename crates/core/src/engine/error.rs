//! Errors produced while executing a pipe.

use crate::factory::ConfigurationError;
use crate::template::RenderError;
use thiserror::Error;

/// Error raised while building or running a step.
///
/// Only [`PipeError::Configuration`] is fatal. The other variants are step
/// failures: the nearest composite or runner turns them into a failed
/// [`PipeResult`](conduit_protocol::PipeResult).
#[derive(Error, Debug)]
pub enum PipeError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Step(#[from] anyhow::Error),
}

impl PipeError {
    /// Whether this error must propagate instead of becoming a failed result.
    pub fn is_fatal(&self) -> bool {
        matches!(self, PipeError::Configuration(_))
    }
}
