//! Definition-time errors raised while turning configuration into instances.

use std::fmt;
use thiserror::Error;

/// The three kinds of things a registry can construct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderableKind {
    Pipe,
    Trigger,
    Service,
}

impl fmt::Display for RenderableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RenderableKind::Pipe => "pipe",
            RenderableKind::Trigger => "trigger",
            RenderableKind::Service => "service",
        };
        f.write_str(label)
    }
}

/// A broken declaration.
///
/// These are fatal: they are never converted into a failed result and never
/// retried. Every variant names the step (or trigger/service) it came from.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("Step '{step_id}': no {kind} type registered under '{uses}'")]
    UnknownType {
        step_id: String,
        kind: RenderableKind,
        uses: String,
    },

    #[error("Step '{step_id}': '{uses}' is a {found}, expected a {expected}")]
    KindMismatch {
        step_id: String,
        uses: String,
        expected: RenderableKind,
        found: RenderableKind,
    },

    #[error("Step '{step_id}': injected service '{service_id}' (parameter '{parameter}') is not defined")]
    MissingService {
        step_id: String,
        parameter: String,
        service_id: String,
    },

    #[error("Step '{step_id}': invalid params: {reason}")]
    InvalidParams {
        step_id: String,
        /// Every offending field, sorted. Empty when the params could not be
        /// decoded at all.
        fields: Vec<String>,
        reason: String,
    },

    #[error("Step id '{step_id}' is used more than once in the same execution tree")]
    DuplicateId { step_id: String },

    #[error("Step '{step_id}': cyclic service injection {}", chain.join(" -> "))]
    CyclicInjection { step_id: String, chain: Vec<String> },
}

impl ConfigurationError {
    /// The id of the step, trigger or service the error was raised for.
    pub fn step_id(&self) -> &str {
        match self {
            ConfigurationError::UnknownType { step_id, .. }
            | ConfigurationError::KindMismatch { step_id, .. }
            | ConfigurationError::MissingService { step_id, .. }
            | ConfigurationError::InvalidParams { step_id, .. }
            | ConfigurationError::DuplicateId { step_id }
            | ConfigurationError::CyclicInjection { step_id, .. } => step_id,
        }
    }
}
