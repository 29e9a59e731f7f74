//! String-keyed constructor registry.
//!
//! Every constructible type is registered explicitly under a stable key
//! (the value of `use` in configuration). An entry knows how to decode and
//! validate its params, how to build an instance, and what its params
//! schema looks like.

use super::error::RenderableKind;
use super::Dependencies;
use crate::engine::Pipe;
use crate::triggers::Trigger;
use indexmap::IndexMap;
use schemars::schema::RootSchema;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::any::Any;
use std::sync::Arc;
use validator::{Validate, ValidationErrors};

/// Construction contract for anything the factory can build.
///
/// `Params` is the declared, statically known params type. It is decoded
/// from the rendered params with `serde` and checked with `validator`
/// before [`build`](Renderable::build) is called.
pub trait Renderable: Sized + Send + Sync + 'static {
    type Params: DeserializeOwned + Validate + JsonSchema + Send + 'static;

    fn build(params: Self::Params, deps: Dependencies) -> anyhow::Result<Self>;
}

/// A service handed to constructors through [`Dependencies::inject`].
pub type SharedService = Arc<dyn Any + Send + Sync>;

/// Decoded, validated params waiting for their constructor.
pub(crate) type DecodedParams = Box<dyn Any + Send>;

/// Why a params value was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ParamsError {
    pub fields: Vec<String>,
    pub reason: String,
}

type Constructor<O> = Arc<dyn Fn(DecodedParams, Dependencies) -> anyhow::Result<O> + Send + Sync>;

pub(crate) struct Entry<O> {
    decode: fn(Value) -> Result<DecodedParams, ParamsError>,
    schema: fn() -> RootSchema,
    construct: Constructor<O>,
}

impl<O> Clone for Entry<O> {
    fn clone(&self) -> Self {
        Self {
            decode: self.decode,
            schema: self.schema,
            construct: Arc::clone(&self.construct),
        }
    }
}

impl<O> Entry<O> {
    fn new<P, F>(constructor: F) -> Self
    where
        P: DeserializeOwned + Validate + JsonSchema + Send + 'static,
        F: Fn(P, Dependencies) -> anyhow::Result<O> + Send + Sync + 'static,
    {
        let construct: Constructor<O> = Arc::new(move |decoded: DecodedParams, deps| {
            let params = decoded
                .downcast::<P>()
                .map_err(|_| anyhow::anyhow!("params decoded to an unexpected type"))?;
            constructor(*params, deps)
        });

        Self {
            decode: decode_params::<P>,
            schema: params_schema::<P>,
            construct,
        }
    }

    pub(crate) fn decode(&self, params: Value) -> Result<DecodedParams, ParamsError> {
        (self.decode)(params)
    }

    pub(crate) fn construct(&self, params: DecodedParams, deps: Dependencies) -> anyhow::Result<O> {
        (self.construct)(params, deps)
    }

    pub(crate) fn schema(&self) -> RootSchema {
        (self.schema)()
    }
}

fn decode_params<P>(value: Value) -> Result<DecodedParams, ParamsError>
where
    P: DeserializeOwned + Validate + Send + 'static,
{
    let params: P = serde_json::from_value(value).map_err(|e| ParamsError {
        fields: Vec::new(),
        reason: e.to_string(),
    })?;

    params.validate().map_err(describe_validation_errors)?;
    Ok(Box::new(params))
}

fn params_schema<P: JsonSchema>() -> RootSchema {
    schemars::schema_for!(P)
}

fn describe_validation_errors(errors: ValidationErrors) -> ParamsError {
    let mut details: Vec<(String, String)> = errors
        .field_errors()
        .into_iter()
        .map(|(field, problems)| {
            let codes: Vec<String> = problems
                .iter()
                .map(|problem| match &problem.message {
                    Some(message) => message.to_string(),
                    None => problem.code.to_string(),
                })
                .collect();
            (field.to_string(), codes.join(", "))
        })
        .collect();
    details.sort();

    ParamsError {
        fields: details.iter().map(|(field, _)| field.clone()).collect(),
        reason: details
            .iter()
            .map(|(field, codes)| format!("{field}: {codes}"))
            .collect::<Vec<_>>()
            .join("; "),
    }
}

/// Registered constructors, one map per kind.
///
/// Keys are unique across kinds so that a misplaced `use` can be reported
/// as a kind mismatch rather than an unknown type.
#[derive(Clone, Default)]
pub struct Registry {
    pipes: IndexMap<String, Entry<Box<dyn Pipe>>>,
    triggers: IndexMap<String, Entry<Arc<dyn Trigger>>>,
    services: IndexMap<String, Entry<SharedService>>,
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("pipes", &self.pipes.keys().collect::<Vec<_>>())
            .field("triggers", &self.triggers.keys().collect::<Vec<_>>())
            .field("services", &self.services.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Registry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the built-in pipes and triggers.
    ///
    /// | key         | kind    |
    /// |-------------|---------|
    /// | `composite` | pipe    |
    /// | `log`       | pipe    |
    /// | `emit`      | pipe    |
    /// | `fail`      | pipe    |
    /// | `interval`  | trigger |
    /// | `values`    | service |
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        crate::builtins::register(&mut registry);
        registry
    }

    /// Register a pipe type.
    pub fn register_pipe<T>(&mut self, key: impl Into<String>) -> &mut Self
    where
        T: Pipe + Renderable,
    {
        self.register_pipe_with(key, |params: T::Params, deps| {
            Ok(Box::new(T::build(params, deps)?) as Box<dyn Pipe>)
        })
    }

    /// Register a pipe built by a closure.
    ///
    /// # Examples
    ///
    /// ```ignore
    /// registry.register_pipe_with("noop", |_: EmptyParams, _deps| {
    ///     Ok(Box::new(Noop) as Box<dyn Pipe>)
    /// });
    /// ```
    pub fn register_pipe_with<P, F>(&mut self, key: impl Into<String>, constructor: F) -> &mut Self
    where
        P: DeserializeOwned + Validate + JsonSchema + Send + 'static,
        F: Fn(P, Dependencies) -> anyhow::Result<Box<dyn Pipe>> + Send + Sync + 'static,
    {
        let key = key.into();
        self.remove(&key);
        self.pipes.insert(key, Entry::new(constructor));
        self
    }

    /// Register a trigger type.
    pub fn register_trigger<T>(&mut self, key: impl Into<String>) -> &mut Self
    where
        T: Trigger + Renderable,
    {
        self.register_trigger_with(key, |params: T::Params, deps| {
            Ok(Arc::new(T::build(params, deps)?) as Arc<dyn Trigger>)
        })
    }

    pub fn register_trigger_with<P, F>(&mut self, key: impl Into<String>, constructor: F) -> &mut Self
    where
        P: DeserializeOwned + Validate + JsonSchema + Send + 'static,
        F: Fn(P, Dependencies) -> anyhow::Result<Arc<dyn Trigger>> + Send + Sync + 'static,
    {
        let key = key.into();
        self.remove(&key);
        self.triggers.insert(key, Entry::new(constructor));
        self
    }

    /// Register a service type. Injected instances are retrieved with
    /// [`Dependencies::inject::<T>`](super::Dependencies::inject).
    pub fn register_service<T>(&mut self, key: impl Into<String>) -> &mut Self
    where
        T: Renderable,
    {
        self.register_service_with(key, |params: T::Params, deps| T::build(params, deps))
    }

    pub fn register_service_with<P, S, F>(&mut self, key: impl Into<String>, constructor: F) -> &mut Self
    where
        P: DeserializeOwned + Validate + JsonSchema + Send + 'static,
        S: Send + Sync + 'static,
        F: Fn(P, Dependencies) -> anyhow::Result<S> + Send + Sync + 'static,
    {
        let key = key.into();
        self.remove(&key);
        self.services.insert(
            key,
            Entry::new(move |params: P, deps| Ok(Arc::new(constructor(params, deps)?) as SharedService)),
        );
        self
    }

    fn remove(&mut self, key: &str) {
        self.pipes.shift_remove(key);
        self.triggers.shift_remove(key);
        self.services.shift_remove(key);
    }

    /// Kind registered under `key`, if any.
    pub fn kind_of(&self, key: &str) -> Option<RenderableKind> {
        if self.pipes.contains_key(key) {
            Some(RenderableKind::Pipe)
        } else if self.triggers.contains_key(key) {
            Some(RenderableKind::Trigger)
        } else if self.services.contains_key(key) {
            Some(RenderableKind::Service)
        } else {
            None
        }
    }

    /// Registered keys of one kind, in registration order.
    pub fn keys(&self, kind: RenderableKind) -> Vec<&str> {
        match kind {
            RenderableKind::Pipe => self.pipes.keys().map(String::as_str).collect(),
            RenderableKind::Trigger => self.triggers.keys().map(String::as_str).collect(),
            RenderableKind::Service => self.services.keys().map(String::as_str).collect(),
        }
    }

    /// JSON schema of the params declared by `key`.
    pub fn params_schema(&self, key: &str) -> Option<RootSchema> {
        self.pipes
            .get(key)
            .map(Entry::schema)
            .or_else(|| self.triggers.get(key).map(Entry::schema))
            .or_else(|| self.services.get(key).map(Entry::schema))
    }

    pub(crate) fn pipe(&self, key: &str) -> Option<&Entry<Box<dyn Pipe>>> {
        self.pipes.get(key)
    }

    pub(crate) fn trigger(&self, key: &str) -> Option<&Entry<Arc<dyn Trigger>>> {
        self.triggers.get(key)
    }

    pub(crate) fn service(&self, key: &str) -> Option<&Entry<SharedService>> {
        self.services.get(key)
    }
}
