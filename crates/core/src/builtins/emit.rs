//! `use: emit` returns a result built straight from its params.
//!
//! Handy for wiring: it turns rendered values into `data` that later steps
//! can reference. An optional `values` injection is merged underneath the
//! declared data.

use super::values::StaticValues;
use crate::engine::{Pipe, PipeContext, PipeError};
use crate::factory::{Dependencies, Renderable};
use async_trait::async_trait;
use conduit_protocol::result_models::PipeResult;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{Map, Value};
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate, JsonSchema)]
pub struct EmitParams {
    #[serde(default)]
    pub message: String,

    #[serde(default)]
    pub data: Map<String, Value>,

    /// Emit a failed result instead of a successful one.
    #[serde(default)]
    pub failed: bool,
}

pub struct EmitPipe {
    message: String,
    data: Map<String, Value>,
    failed: bool,
}

impl Renderable for EmitPipe {
    type Params = EmitParams;

    fn build(params: EmitParams, deps: Dependencies) -> anyhow::Result<Self> {
        let mut data = match deps.inject_optional::<StaticValues>("values")? {
            Some(values) => values.values().clone(),
            None => Map::new(),
        };
        data.extend(params.data);

        Ok(Self {
            message: params.message,
            data,
            failed: params.failed,
        })
    }
}

#[async_trait]
impl Pipe for EmitPipe {
    async fn run(&self, _context: &PipeContext) -> Result<PipeResult, PipeError> {
        let base = if self.failed {
            PipeResult::failure(self.message.clone())
        } else {
            PipeResult::success().with_message(self.message.clone())
        };

        Ok(base.with_data(Value::Object(self.data.clone())))
    }
}
