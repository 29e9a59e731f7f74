//! Trigger-driven scheduling of pipelines.
//!
//! The [`Orchestrator`] wires one [`PipeRunner`] per [`RunnerDefinition`] to
//! its triggers. Triggers are shared by id: every runner that lists the same
//! trigger id observes a single live instance. The trigger registry belongs
//! to one orchestrator and lives only between `start` and `stop`.

mod runner;

pub use runner::PipeRunner;

use crate::engine::{PipeContext, PipeError};
use crate::factory::RenderableFactory;
use crate::triggers::{Trigger, TriggerObserver};
use conduit_protocol::ipc::Event;
use conduit_protocol::pipe_models::{RunnerDefinition, TriggerDefinition};
use indexmap::IndexMap;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::task::TaskTracker;
use tracing::{info, warn};

/// Owns the runners, the trigger registry and the task group of in-flight
/// runs.
pub struct Orchestrator {
    factory: RenderableFactory,
    definitions: Vec<RunnerDefinition>,
    params: Map<String, Value>,
    events_tx: Option<mpsc::Sender<Event>>,
    tracker: TaskTracker,
    triggers: IndexMap<String, Arc<dyn Trigger>>,
    runners: Vec<Arc<PipeRunner>>,
}

impl Orchestrator {
    /// Create an orchestrator. Nothing is built until [`start`](Self::start).
    ///
    /// # Arguments
    ///
    /// * `factory` - Shared factory for triggers and every run
    /// * `definitions` - The runners to schedule
    pub fn new(factory: RenderableFactory, definitions: Vec<RunnerDefinition>) -> Self {
        Self {
            factory,
            definitions,
            params: Map::new(),
            events_tx: None,
            tracker: TaskTracker::new(),
            triggers: IndexMap::new(),
            runners: Vec::new(),
        }
    }

    /// Ambient params seeded into every run context.
    pub fn with_params(mut self, params: Map<String, Value>) -> Self {
        self.params = params;
        self
    }

    /// Channel that receives run notifications from every runner.
    pub fn with_events(mut self, events_tx: mpsc::Sender<Event>) -> Self {
        self.events_tx = Some(events_tx);
        self
    }

    /// Validate the definitions, build runners and triggers, then start
    /// every distinct trigger exactly once.
    ///
    /// Calling `start` again first stops the current wiring.
    ///
    /// # Errors
    ///
    /// Nothing is started when an error is returned:
    /// - a [`ConfigurationError`](crate::factory::ConfigurationError) for
    ///   duplicate step ids, unknown `use` keys or unresolvable services
    /// - any error raised while building a trigger
    pub fn start(&mut self) -> Result<(), PipeError> {
        if !self.runners.is_empty() {
            self.stop();
        }

        self.validate()?;
        self.tracker.reopen();

        let context = PipeContext::with_params(self.params.clone());
        let mut triggers: IndexMap<String, (TriggerDefinition, Arc<dyn Trigger>)> = IndexMap::new();
        let mut runners = Vec::with_capacity(self.definitions.len());

        for definition in &self.definitions {
            let runner = Arc::new(self.build_runner(definition.clone()));

            for trigger_definition in &definition.on {
                let trigger = match triggers.get(&trigger_definition.id) {
                    Some((first, trigger)) => {
                        if first != trigger_definition {
                            warn!(
                                trigger = %trigger_definition.id,
                                runner = %runner.id(),
                                "Trigger redefined with different settings, keeping the first definition"
                            );
                        }
                        Arc::clone(trigger)
                    }
                    None => {
                        let trigger = self.factory.build_trigger(trigger_definition, &context)?;
                        triggers.insert(
                            trigger_definition.id.clone(),
                            (trigger_definition.clone(), Arc::clone(&trigger)),
                        );
                        trigger
                    }
                };

                let observer: Arc<dyn TriggerObserver> = runner.clone();
                trigger.attach(observer);
            }

            if definition.on.is_empty() {
                warn!(runner = %runner.id(), "Runner has no triggers and will never run");
            }
            runners.push(runner);
        }

        self.triggers = triggers
            .into_iter()
            .map(|(id, (_, trigger))| (id, trigger))
            .collect();
        self.runners = runners;

        for trigger in self.triggers.values() {
            trigger.start();
        }

        info!(
            runners = self.runners.len(),
            triggers = self.triggers.len(),
            "Orchestrator started"
        );
        Ok(())
    }

    /// Stop every trigger and drop the registry and runners.
    ///
    /// Runs that were already dispatched keep going.
    pub fn stop(&mut self) {
        for trigger in self.triggers.values() {
            trigger.stop();
        }
        self.triggers.clear();
        self.runners.clear();
        info!("Orchestrator stopped");
    }

    /// Stop, then wait up to `timeout` for in-flight runs to finish.
    ///
    /// # Returns
    ///
    /// `true` if every run finished in time.
    pub async fn shutdown(&mut self, timeout: Duration) -> bool {
        self.stop();
        self.tracker.close();

        let in_flight = self.tracker.len();
        if in_flight > 0 {
            info!(in_flight, "Waiting for in-flight runs");
        }

        let drained = tokio::time::timeout(timeout, self.tracker.wait()).await.is_ok();
        if !drained {
            warn!(remaining = self.tracker.len(), "Shutdown timed out with runs still in flight");
        }
        drained
    }

    /// Static validation of every definition, without building anything.
    pub fn validate(&self) -> Result<(), PipeError> {
        self.factory.validate_services()?;

        let mut seen: HashMap<&str, usize> = HashMap::new();
        for definition in &self.definitions {
            let count = seen.entry(definition.runner_id()).or_default();
            *count += 1;
            if *count == 2 {
                warn!(runner = %definition.runner_id(), "Several runners share this id");
            }

            self.factory.validate(&definition.run)?;
            for trigger in &definition.on {
                self.factory.validate_trigger(trigger)?;
            }
        }
        Ok(())
    }

    fn build_runner(&self, definition: RunnerDefinition) -> PipeRunner {
        let runner = PipeRunner::new(definition, self.factory.clone(), self.tracker.clone())
            .with_params(self.params.clone());

        match &self.events_tx {
            Some(events_tx) => runner.with_events(events_tx.clone()),
            None => runner,
        }
    }

    /// The live trigger registered under `id`.
    pub fn trigger(&self, id: &str) -> Option<Arc<dyn Trigger>> {
        self.triggers.get(id).cloned()
    }

    pub fn trigger_ids(&self) -> Vec<&str> {
        self.triggers.keys().map(String::as_str).collect()
    }

    pub fn runners(&self) -> &[Arc<PipeRunner>] {
        &self.runners
    }

    pub fn runner_count(&self) -> usize {
        self.runners.len()
    }

    /// Number of runs currently in flight.
    pub fn in_flight(&self) -> usize {
        self.tracker.len()
    }

    pub fn factory(&self) -> &RenderableFactory {
        &self.factory
    }
}

impl Drop for Orchestrator {
    fn drop(&mut self) {
        for trigger in self.triggers.values() {
            trigger.stop();
        }
    }
}
