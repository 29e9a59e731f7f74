//! Turning declarative configuration into live instances.
//!
//! The [`RenderableFactory`] takes one [`PipeConfig`], [`TriggerDefinition`]
//! or [`ServiceDefinition`] together with the current [`PipeContext`] and
//! returns a ready instance:
//!
//! 1. resolve `use` in the [`Registry`]
//! 2. render `params` against the context
//! 3. decode and validate the rendered params
//! 4. resolve `injects` among the defined services, building each one
//! 5. call the registered constructor
//!
//! Nothing is cached. Every call builds a fresh instance from freshly
//! rendered params.

mod error;
mod registry;

pub use error::{ConfigurationError, RenderableKind};
pub use registry::{Registry, Renderable, SharedService};

use crate::engine::{unmet_dependencies, PipeContext, PipeError, PipeInstance};
use crate::template::{is_truthy, render_tree, HandlebarsRenderer, TemplateRenderer};
use crate::triggers::Trigger;
use anyhow::anyhow;
use conduit_protocol::pipe_models::{Condition, Params, PipeConfig, ServiceDefinition, TriggerDefinition};
use indexmap::IndexMap;
use registry::{Entry, ParamsError};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::debug;

/// Everything a constructor receives besides its typed params.
#[derive(Clone)]
pub struct Dependencies {
    step_id: String,
    params: Map<String, Value>,
    services: HashMap<String, SharedService>,
    steps: Vec<PipeConfig>,
    factory: RenderableFactory,
}

impl std::fmt::Debug for Dependencies {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dependencies")
            .field("step_id", &self.step_id)
            .field("services", &self.services.keys().collect::<Vec<_>>())
            .field("steps", &self.steps.len())
            .finish_non_exhaustive()
    }
}

impl Dependencies {
    /// Id of the step, trigger or service being built.
    pub fn step_id(&self) -> &str {
        &self.step_id
    }

    /// The rendered params as a raw JSON map.
    pub fn rendered_params(&self) -> &Map<String, Value> {
        &self.params
    }

    /// Child step configs (composite pipes only).
    pub fn steps(&self) -> &[PipeConfig] {
        &self.steps
    }

    /// The factory that is building this instance.
    pub fn factory(&self) -> &RenderableFactory {
        &self.factory
    }

    pub fn renderer(&self) -> Arc<dyn TemplateRenderer> {
        Arc::clone(&self.factory.renderer)
    }

    /// The service injected under constructor parameter `name`.
    ///
    /// # Errors
    ///
    /// Fails when nothing was injected under `name` or when the injected
    /// service is not a `T`.
    pub fn inject<T>(&self, name: &str) -> anyhow::Result<Arc<T>>
    where
        T: Send + Sync + 'static,
    {
        self.inject_optional(name)?
            .ok_or_else(|| anyhow!("step '{}' has no service injected as '{}'", self.step_id, name))
    }

    /// Like [`inject`](Self::inject), but `Ok(None)` when nothing was
    /// injected under `name`.
    pub fn inject_optional<T>(&self, name: &str) -> anyhow::Result<Option<Arc<T>>>
    where
        T: Send + Sync + 'static,
    {
        let Some(service) = self.services.get(name) else {
            return Ok(None);
        };

        Arc::clone(service).downcast::<T>().map(Some).map_err(|_| {
            anyhow!(
                "service injected as '{}' into step '{}' is not a {}",
                name,
                self.step_id,
                std::any::type_name::<T>()
            )
        })
    }
}

/// Builds pipes, triggers and services from configuration.
///
/// Cheap to clone: the registry, service definitions and renderer are
/// shared behind `Arc`s.
#[derive(Clone)]
pub struct RenderableFactory {
    registry: Arc<Registry>,
    services: Arc<IndexMap<String, ServiceDefinition>>,
    renderer: Arc<dyn TemplateRenderer>,
}

impl std::fmt::Debug for RenderableFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderableFactory")
            .field("registry", &self.registry)
            .field("services", &self.services.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl RenderableFactory {
    /// A factory over `registry` with no services and the handlebars renderer.
    pub fn new(registry: Registry) -> Self {
        Self {
            registry: Arc::new(registry),
            services: Arc::new(IndexMap::new()),
            renderer: Arc::new(HandlebarsRenderer::new()),
        }
    }

    /// Replace the service definitions available to `injects`.
    ///
    /// A later definition with the same id replaces an earlier one.
    pub fn with_services<I>(mut self, services: I) -> Self
    where
        I: IntoIterator<Item = ServiceDefinition>,
    {
        let services = services
            .into_iter()
            .map(|service| (service.id.clone(), service))
            .collect();
        self.services = Arc::new(services);
        self
    }

    pub fn with_renderer(mut self, renderer: Arc<dyn TemplateRenderer>) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn service_definition(&self, id: &str) -> Option<&ServiceDefinition> {
        self.services.get(id)
    }

    /// Build a live step from `config`.
    ///
    /// Dependencies and the `if` condition are checked against `context`
    /// first. A step that must skip comes back as a
    /// [`PipeInstance::skipping`] instance: its params are never rendered,
    /// validated or passed to a constructor.
    ///
    /// # Errors
    ///
    /// - [`PipeError::Configuration`] for an unknown `use`, invalid params,
    ///   a missing or cyclic service
    /// - [`PipeError::Render`] when a template cannot be rendered
    /// - [`PipeError::Step`] when the constructor itself fails
    pub fn build_pipe(&self, config: &PipeConfig, context: &PipeContext) -> Result<PipeInstance, PipeError> {
        let entry = self.lookup(
            &config.id,
            &config.uses,
            RenderableKind::Pipe,
            Registry::pipe,
        )?;

        if let Some(reason) = unmet_dependencies(&config.depends_on, context) {
            debug!(step = %config.id, %reason, "Not building skipped step");
            return Ok(PipeInstance::skipping(config.id.clone(), config.depends_on.clone(), true));
        }

        let scope = context.template_scope();
        let condition = self.render_condition(&config.condition, &scope)?;
        if !condition {
            debug!(step = %config.id, "Not building step, condition not met");
            return Ok(PipeInstance::skipping(config.id.clone(), config.depends_on.clone(), false));
        }

        let (params, raw) = self.render_params(&config.id, entry, &config.params, &scope)?;
        let services = self.resolve_injects(&config.id, &config.injects, context, &mut Vec::new())?;

        let deps = self.dependencies(&config.id, raw, services, config.steps.clone());
        let pipe = entry.construct(params, deps)?;

        debug!(step = %config.id, uses = %config.uses, "Built pipe");
        Ok(PipeInstance::new(
            config.id.clone(),
            config.depends_on.clone(),
            condition,
            pipe,
        ))
    }

    /// Build a trigger from its definition.
    pub fn build_trigger(
        &self,
        definition: &TriggerDefinition,
        context: &PipeContext,
    ) -> Result<Arc<dyn Trigger>, PipeError> {
        let entry = self.lookup(
            &definition.id,
            &definition.uses,
            RenderableKind::Trigger,
            Registry::trigger,
        )?;

        let scope = context.template_scope();
        let (params, raw) = self.render_params(&definition.id, entry, &definition.params, &scope)?;
        let deps = self.dependencies(&definition.id, raw, HashMap::new(), Vec::new());

        debug!(trigger = %definition.id, uses = %definition.uses, "Built trigger");
        Ok(entry.construct(params, deps)?)
    }

    /// Build the service defined under `service_id`, with its own injects.
    pub fn build_service(&self, service_id: &str, context: &PipeContext) -> Result<SharedService, PipeError> {
        let definition = self.services.get(service_id).ok_or_else(|| {
            ConfigurationError::MissingService {
                step_id: service_id.to_string(),
                parameter: service_id.to_string(),
                service_id: service_id.to_string(),
            }
        })?;
        self.build_service_in_chain(definition, context, &mut Vec::new())
    }

    fn build_service_in_chain(
        &self,
        definition: &ServiceDefinition,
        context: &PipeContext,
        chain: &mut Vec<String>,
    ) -> Result<SharedService, PipeError> {
        let entry = self.lookup(
            &definition.id,
            &definition.uses,
            RenderableKind::Service,
            Registry::service,
        )?;

        chain.push(definition.id.clone());
        let scope = context.template_scope();
        let (params, raw) = self.render_params(&definition.id, entry, &definition.params, &scope)?;
        let services = self.resolve_injects(&definition.id, &definition.injects, context, chain)?;
        chain.pop();

        let deps = self.dependencies(&definition.id, raw, services, Vec::new());
        debug!(service = %definition.id, uses = %definition.uses, "Built service");
        Ok(entry.construct(params, deps)?)
    }

    /// Static checks that need no context: duplicate ids, known `use` keys
    /// and resolvable, acyclic service references across the whole tree.
    pub fn validate(&self, config: &PipeConfig) -> Result<(), ConfigurationError> {
        if let Some(step_id) = config.find_duplicate_id() {
            return Err(ConfigurationError::DuplicateId {
                step_id: step_id.to_string(),
            });
        }

        for step in config.walk() {
            self.lookup(&step.id, &step.uses, RenderableKind::Pipe, Registry::pipe)?;
            self.check_injects(&step.id, &step.injects, &mut Vec::new())?;
        }
        Ok(())
    }

    /// Static check for a trigger definition.
    pub fn validate_trigger(&self, definition: &TriggerDefinition) -> Result<(), ConfigurationError> {
        self.lookup(
            &definition.id,
            &definition.uses,
            RenderableKind::Trigger,
            Registry::trigger,
        )
        .map(|_| ())
    }

    /// Static check for every registered service definition.
    pub fn validate_services(&self) -> Result<(), ConfigurationError> {
        for definition in self.services.values() {
            self.lookup(
                &definition.id,
                &definition.uses,
                RenderableKind::Service,
                Registry::service,
            )?;
            self.check_injects(
                &definition.id,
                &definition.injects,
                &mut vec![definition.id.clone()],
            )?;
        }
        Ok(())
    }

    fn check_injects(
        &self,
        step_id: &str,
        injects: &BTreeMap<String, String>,
        chain: &mut Vec<String>,
    ) -> Result<(), ConfigurationError> {
        for (parameter, service_id) in injects {
            let definition = self.find_service(step_id, parameter, service_id, chain)?;
            self.lookup(
                &definition.id,
                &definition.uses,
                RenderableKind::Service,
                Registry::service,
            )?;

            chain.push(service_id.clone());
            self.check_injects(step_id, &definition.injects, chain)?;
            chain.pop();
        }
        Ok(())
    }

    fn lookup<'a, O>(
        &'a self,
        step_id: &str,
        uses: &str,
        expected: RenderableKind,
        get: fn(&'a Registry, &str) -> Option<&'a Entry<O>>,
    ) -> Result<&'a Entry<O>, ConfigurationError> {
        if let Some(entry) = get(&self.registry, uses) {
            return Ok(entry);
        }

        Err(match self.registry.kind_of(uses) {
            Some(found) => ConfigurationError::KindMismatch {
                step_id: step_id.to_string(),
                uses: uses.to_string(),
                expected,
                found,
            },
            None => ConfigurationError::UnknownType {
                step_id: step_id.to_string(),
                kind: expected,
                uses: uses.to_string(),
            },
        })
    }

    fn render_condition(&self, condition: &Condition, scope: &Value) -> Result<bool, PipeError> {
        match condition {
            Condition::Literal(flag) => Ok(*flag),
            Condition::Template(template) => {
                let rendered = render_tree(
                    self.renderer.as_ref(),
                    &Value::String(template.clone()),
                    scope,
                )?;
                Ok(is_truthy(&rendered))
            }
        }
    }

    /// Render, decode and validate params. Returns the decoded value and the
    /// rendered JSON map.
    fn render_params<O>(
        &self,
        step_id: &str,
        entry: &Entry<O>,
        params: &Params,
        scope: &Value,
    ) -> Result<(registry::DecodedParams, Map<String, Value>), PipeError> {
        let source = Value::Object(params.clone().into_iter().collect());
        let rendered = match render_tree(self.renderer.as_ref(), &source, scope)? {
            Value::Object(map) => map,
            _ => Map::new(),
        };

        let decoded = entry
            .decode(Value::Object(rendered.clone()))
            .map_err(|ParamsError { fields, reason }| ConfigurationError::InvalidParams {
                step_id: step_id.to_string(),
                fields,
                reason,
            })?;

        Ok((decoded, rendered))
    }

    /// Build every service listed in `injects`.
    ///
    /// All ids are looked up before any service is constructed, so a missing
    /// service is reported before any constructor runs.
    fn resolve_injects(
        &self,
        step_id: &str,
        injects: &BTreeMap<String, String>,
        context: &PipeContext,
        chain: &mut Vec<String>,
    ) -> Result<HashMap<String, SharedService>, PipeError> {
        let definitions = injects
            .iter()
            .map(|(parameter, service_id)| {
                self.find_service(step_id, parameter, service_id, chain)
                    .map(|definition| (parameter, definition))
            })
            .collect::<Result<Vec<_>, _>>()?;

        definitions
            .into_iter()
            .map(|(parameter, definition)| {
                let service = self.build_service_in_chain(definition, context, chain)?;
                Ok((parameter.clone(), service))
            })
            .collect()
    }

    fn find_service(
        &self,
        step_id: &str,
        parameter: &str,
        service_id: &str,
        chain: &[String],
    ) -> Result<&ServiceDefinition, ConfigurationError> {
        if chain.iter().any(|id| id == service_id) {
            let mut cycle = chain.to_vec();
            cycle.push(service_id.to_string());
            return Err(ConfigurationError::CyclicInjection {
                step_id: step_id.to_string(),
                chain: cycle,
            });
        }

        self.services
            .get(service_id)
            .ok_or_else(|| ConfigurationError::MissingService {
                step_id: step_id.to_string(),
                parameter: parameter.to_string(),
                service_id: service_id.to_string(),
            })
    }

    fn dependencies(
        &self,
        step_id: &str,
        params: Map<String, Value>,
        services: HashMap<String, SharedService>,
        steps: Vec<PipeConfig>,
    ) -> Dependencies {
        Dependencies {
            step_id: step_id.to_string(),
            params,
            services,
            steps,
            factory: self.clone(),
        }
    }
}
