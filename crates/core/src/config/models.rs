//! The aggregated project configuration.

use crate::factory::{Registry, RenderableFactory};
use crate::orchestrator::Orchestrator;
use conduit_protocol::config_models::GlobalConfig;
use conduit_protocol::pipe_models::{RunnerDefinition, ServiceDefinition};
use serde_json::{Map, Value};

/// Everything loaded from `.conduit/`.
///
/// # Example
///
/// ```rust,no_run
/// use conduit_core::config::loader::load_config;
/// use conduit_core::factory::Registry;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new(".")).await?;
/// let mut orchestrator = config.into_orchestrator(Registry::with_builtins());
/// orchestrator.start()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppConfig {
    /// Global settings from `config.toml`.
    pub global: GlobalConfig,

    /// Services from `services/*.yaml`, in file name order.
    pub services: Vec<ServiceDefinition>,

    /// Runners from `runners/*.yaml`, in file name order.
    pub runners: Vec<RunnerDefinition>,
}

impl AppConfig {
    /// The global params as a JSON map, ready to seed a context.
    pub fn ambient_params(&self) -> Map<String, Value> {
        self.global
            .params
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }

    /// A factory over `registry` that knows this project's services.
    pub fn factory(&self, registry: Registry) -> RenderableFactory {
        RenderableFactory::new(registry).with_services(self.services.clone())
    }

    /// An orchestrator for this project's runners. Not started yet.
    pub fn into_orchestrator(self, registry: Registry) -> Orchestrator {
        let factory = self.factory(registry);
        let params = self.ambient_params();
        Orchestrator::new(factory, self.runners).with_params(params)
    }
}
