//! Run notifications emitted by the orchestrator.
//!
//! Every scheduled execution produces a `RunStarted` event followed by
//! either `RunCompleted` (the pipeline produced a result, which may itself
//! be a failure) or `RunFailed` (the pipeline could not be built or raised
//! past every step boundary).
//!
//! Uses tagged enum serialization for TypeScript compatibility:
//! ```json
//! {
//!   "type": "runCompleted",
//!   "payload": {
//!     "runner_id": "sync",
//!     "run_id": "uuid-here",
//!     "result": { "succeeded": true, "was_skipped": false, "message": "", "data": {} },
//!     "finished_at": "2026-01-01T00:00:00Z"
//!   }
//! }
//! ```
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::result_models::PipeResult;

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum Event {
    /// A trigger fired and a runner began building its pipeline.
    RunStarted {
        runner_id: String,
        #[ts(type = "string")]
        run_id: Uuid,
        trigger_id: String,
    },

    /// The pipeline ran to completion and produced a result.
    RunCompleted {
        runner_id: String,
        #[ts(type = "string")]
        run_id: Uuid,
        result: PipeResult,
        #[ts(type = "string")]
        finished_at: DateTime<Utc>,
    },

    /// The run was aborted by an error.
    ///
    /// `fatal` is set for configuration errors, which also disable the runner.
    RunFailed {
        runner_id: String,
        #[ts(type = "string")]
        run_id: Uuid,
        error: String,
        fatal: bool,
    },
}

impl Event {
    /// The runner that produced this event.
    pub fn runner_id(&self) -> &str {
        match self {
            Event::RunStarted { runner_id, .. }
            | Event::RunCompleted { runner_id, .. }
            | Event::RunFailed { runner_id, .. } => runner_id,
        }
    }
}
