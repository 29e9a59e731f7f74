//! The observer that executes one scheduled pipeline per firing.

use crate::engine::{run_pipeline, PipeContext};
use crate::factory::{ConfigurationError, RenderableFactory};
use crate::triggers::TriggerObserver;
use chrono::Utc;
use conduit_protocol::ipc::Event;
use conduit_protocol::pipe_models::RunnerDefinition;
use conduit_protocol::result_models::PipeResult;
use serde_json::{Map, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

/// Runs a [`RunnerDefinition`]'s target whenever an attached trigger fires.
///
/// Every firing builds the target from scratch against a fresh context, so
/// nothing carries over between runs. Runs are spawned on a shared
/// [`TaskTracker`] and never report errors back to the trigger.
pub struct PipeRunner {
    definition: RunnerDefinition,
    factory: RenderableFactory,
    params: Map<String, Value>,
    tracker: TaskTracker,
    events_tx: Option<mpsc::Sender<Event>>,
    disabled: AtomicBool,
}

impl std::fmt::Debug for PipeRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipeRunner")
            .field("id", &self.id())
            .field("disabled", &self.is_disabled())
            .finish_non_exhaustive()
    }
}

impl PipeRunner {
    /// Create a runner.
    ///
    /// # Arguments
    ///
    /// * `definition` - What to run and which triggers fire it
    /// * `factory` - Factory used to build the target on every run
    /// * `tracker` - Task group the spawned runs are tracked in
    pub fn new(definition: RunnerDefinition, factory: RenderableFactory, tracker: TaskTracker) -> Self {
        Self {
            definition,
            factory,
            params: Map::new(),
            tracker,
            events_tx: None,
            disabled: AtomicBool::new(false),
        }
    }

    /// Ambient params seeded into every fresh run context.
    pub fn with_params(mut self, params: Map<String, Value>) -> Self {
        self.params = params;
        self
    }

    /// Channel that receives run notifications.
    pub fn with_events(mut self, events_tx: mpsc::Sender<Event>) -> Self {
        self.events_tx = Some(events_tx);
        self
    }

    pub fn id(&self) -> &str {
        self.definition.runner_id()
    }

    pub fn definition(&self) -> &RunnerDefinition {
        &self.definition
    }

    /// True once a configuration error was hit during a scheduled run.
    pub fn is_disabled(&self) -> bool {
        self.disabled.load(Ordering::SeqCst)
    }

    /// Execute the target once against a fresh context.
    ///
    /// Step failures come back as a failed result; only configuration
    /// errors are returned as `Err`.
    pub async fn run(&self) -> Result<(PipeContext, PipeResult), ConfigurationError> {
        let context = PipeContext::with_params(self.params.clone());
        run_pipeline(&self.factory, &self.definition.run, context).await
    }

    async fn dispatch(self: Arc<Self>, trigger_id: String) {
        let run_id = Uuid::new_v4();
        info!(%run_id, trigger = %trigger_id, "Run started");
        self.send(Event::RunStarted {
            runner_id: self.id().to_string(),
            run_id,
            trigger_id,
        })
        .await;

        match self.run().await {
            Ok((_, result)) => {
                if result.has_failed() {
                    warn!(%run_id, message = %result.message, "Run finished with a failed result");
                } else {
                    info!(%run_id, state = %result.state(), "Run finished");
                }
                self.send(Event::RunCompleted {
                    runner_id: self.id().to_string(),
                    run_id,
                    result,
                    finished_at: Utc::now(),
                })
                .await;
            }
            Err(config_error) => {
                if !self.disabled.swap(true, Ordering::SeqCst) {
                    error!(%run_id, error = %config_error, "Broken runner configuration, disabling runner");
                }
                self.send(Event::RunFailed {
                    runner_id: self.id().to_string(),
                    run_id,
                    error: config_error.to_string(),
                    fatal: true,
                })
                .await;
            }
        }
    }

    async fn send(&self, event: Event) {
        if let Some(events_tx) = &self.events_tx {
            if events_tx.send(event).await.is_err() {
                debug!(runner = %self.id(), "Event receiver dropped, run event discarded");
            }
        }
    }
}

impl TriggerObserver for PipeRunner {
    fn on_trigger_fired(self: Arc<Self>, trigger_id: &str) {
        if self.is_disabled() {
            debug!(runner = %self.id(), trigger = %trigger_id, "Ignoring firing for disabled runner");
            return;
        }

        let span = info_span!("run", runner = %self.id());
        let tracker = self.tracker.clone();
        tracker.spawn(self.dispatch(trigger_id.to_string()).instrument(span));
    }
}
