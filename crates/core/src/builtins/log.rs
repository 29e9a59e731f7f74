//! `use: log` writes a rendered message to the tracing output.

use crate::engine::{Pipe, PipeContext, PipeError};
use crate::factory::{Dependencies, Renderable};
use async_trait::async_trait;
use conduit_protocol::result_models::PipeResult;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, warn};
use validator::Validate;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Warn,
}

#[derive(Debug, Clone, Deserialize, Validate, JsonSchema)]
pub struct LogParams {
    #[validate(length(min = 1))]
    pub message: String,

    #[serde(default)]
    pub level: LogLevel,
}

pub struct LogPipe {
    id: String,
    message: String,
    level: LogLevel,
}

impl Renderable for LogPipe {
    type Params = LogParams;

    fn build(params: LogParams, deps: Dependencies) -> anyhow::Result<Self> {
        Ok(Self {
            id: deps.step_id().to_string(),
            message: params.message,
            level: params.level,
        })
    }
}

#[async_trait]
impl Pipe for LogPipe {
    async fn run(&self, _context: &PipeContext) -> Result<PipeResult, PipeError> {
        match self.level {
            LogLevel::Debug => debug!(step = %self.id, "{}", self.message),
            LogLevel::Info => info!(step = %self.id, "{}", self.message),
            LogLevel::Warn => warn!(step = %self.id, "{}", self.message),
        }

        Ok(PipeResult::success()
            .with_message(self.message.clone())
            .with_data(json!({ "message": self.message })))
    }
}
