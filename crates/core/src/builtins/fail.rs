//! `use: fail` always fails, either as a result or as a raised error.

use crate::engine::{Pipe, PipeContext, PipeError};
use crate::factory::{Dependencies, Renderable};
use async_trait::async_trait;
use conduit_protocol::result_models::PipeResult;
use schemars::JsonSchema;
use serde::Deserialize;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate, JsonSchema)]
pub struct FailParams {
    #[serde(default = "default_message")]
    pub message: String,

    /// Raise a step error instead of returning a failed result.
    #[serde(default)]
    pub raise: bool,
}

fn default_message() -> String {
    "failed on purpose".to_string()
}

pub struct FailPipe {
    params: FailParams,
}

impl Renderable for FailPipe {
    type Params = FailParams;

    fn build(params: FailParams, _deps: Dependencies) -> anyhow::Result<Self> {
        Ok(Self { params })
    }
}

#[async_trait]
impl Pipe for FailPipe {
    async fn run(&self, _context: &PipeContext) -> Result<PipeResult, PipeError> {
        if self.params.raise {
            return Err(anyhow::anyhow!("{}", self.params.message).into());
        }
        Ok(PipeResult::failure(self.params.message.clone()))
    }
}
