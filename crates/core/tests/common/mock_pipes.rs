//! Mock pipes and services that record what happened to them.

use async_trait::async_trait;
use conduit_core::engine::{Pipe, PipeContext, PipeError};
use conduit_core::factory::{RenderableFactory, Registry};
use conduit_protocol::{PipeResult, ServiceDefinition};
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use validator::Validate;

/// Counters shared between a test and the mocks it registered.
#[derive(Clone, Default)]
pub struct Probe {
    runs: Arc<AtomicUsize>,
    constructed: Arc<AtomicUsize>,
    order: Arc<Mutex<Vec<String>>>,
}

#[allow(dead_code)]
impl Probe {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `count` pipe runs.
    pub fn runs(&self) -> usize {
        self.runs.load(Ordering::SeqCst)
    }

    /// Number of mock constructors that ran (pipes and services).
    pub fn constructed(&self) -> usize {
        self.constructed.load(Ordering::SeqCst)
    }

    /// Ids of the `count` steps in the order they ran.
    pub fn order(&self) -> Vec<String> {
        self.order.lock().unwrap().clone()
    }
}

#[derive(Debug, Deserialize, Validate, JsonSchema)]
pub struct CountParams {
    #[serde(default = "default_true")]
    pub succeed: bool,

    #[serde(default)]
    #[validate(range(max = 100))]
    pub weight: u32,
}

fn default_true() -> bool {
    true
}

/// `use: count` records its run and succeeds (or fails when `succeed: false`).
pub struct CountPipe {
    id: String,
    succeed: bool,
    weight: u32,
    probe: Probe,
}

#[async_trait]
impl Pipe for CountPipe {
    async fn run(&self, _context: &PipeContext) -> Result<PipeResult, PipeError> {
        let total = self.probe.runs.fetch_add(1, Ordering::SeqCst) + 1;
        self.probe.order.lock().unwrap().push(self.id.clone());

        let result = if self.succeed {
            PipeResult::success()
        } else {
            PipeResult::failure(format!("{} gave up", self.id))
        };
        Ok(result.with_data(json!({ "total": total, "weight": self.weight })))
    }
}

#[derive(Debug, Deserialize, Validate, JsonSchema)]
pub struct SleepParams {
    pub millis: u64,
}

/// `use: sleep` waits, then succeeds.
pub struct SleepPipe {
    duration: Duration,
    probe: Probe,
}

#[async_trait]
impl Pipe for SleepPipe {
    async fn run(&self, _context: &PipeContext) -> Result<PipeResult, PipeError> {
        tokio::time::sleep(self.duration).await;
        self.probe.runs.fetch_add(1, Ordering::SeqCst);
        Ok(PipeResult::success().with_message("slept"))
    }
}

#[derive(Debug, Deserialize, Validate, JsonSchema)]
pub struct TicketClientParams {
    #[validate(length(min = 1))]
    pub base_url: String,
}

/// Service standing in for a ticket system client.
#[derive(Debug)]
pub struct TicketClient {
    pub base_url: String,
}

#[derive(Debug, Default, Deserialize, Validate, JsonSchema)]
pub struct NoParams {}

/// `use: ticket-count` reads from the service injected as `ticket_system`.
pub struct TicketCountPipe {
    client: Arc<TicketClient>,
}

#[async_trait]
impl Pipe for TicketCountPipe {
    async fn run(&self, _context: &PipeContext) -> Result<PipeResult, PipeError> {
        Ok(PipeResult::success().with_data(json!({ "base_url": self.client.base_url })))
    }
}

/// The builtin registry plus `count`, `sleep`, `ticket-count` pipes and the
/// `ticket-client` service, all reporting to `probe`.
pub fn registry_with_probe(probe: &Probe) -> Registry {
    let mut registry = Registry::with_builtins();

    let count_probe = probe.clone();
    registry.register_pipe_with("count", move |params: CountParams, deps| {
        count_probe.constructed.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(CountPipe {
            id: deps.step_id().to_string(),
            succeed: params.succeed,
            weight: params.weight,
            probe: count_probe.clone(),
        }) as Box<dyn Pipe>)
    });

    let sleep_probe = probe.clone();
    registry.register_pipe_with("sleep", move |params: SleepParams, _deps| {
        Ok(Box::new(SleepPipe {
            duration: Duration::from_millis(params.millis),
            probe: sleep_probe.clone(),
        }) as Box<dyn Pipe>)
    });

    let client_probe = probe.clone();
    registry.register_service_with("ticket-client", move |params: TicketClientParams, _deps| {
        client_probe.constructed.fetch_add(1, Ordering::SeqCst);
        Ok(TicketClient {
            base_url: params.base_url,
        })
    });

    let ticket_probe = probe.clone();
    registry.register_pipe_with("ticket-count", move |_: NoParams, deps| {
        ticket_probe.constructed.fetch_add(1, Ordering::SeqCst);
        let client = deps.inject::<TicketClient>("ticket_system")?;
        Ok(Box::new(TicketCountPipe { client }) as Box<dyn Pipe>)
    });

    registry
}

/// A factory over [`registry_with_probe`] with the given services.
pub fn factory_with_probe<I>(probe: &Probe, services: I) -> RenderableFactory
where
    I: IntoIterator<Item = ServiceDefinition>,
{
    RenderableFactory::new(registry_with_probe(probe)).with_services(services)
}
