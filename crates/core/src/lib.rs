//! # conduit-core
//!
//! Pipe engine and trigger orchestration for conduit.
//!
//! This crate provides:
//! - A dependency-aware step executor over an immutable context
//! - A registry-backed factory that renders params and injects services
//! - Triggers and an orchestrator that schedules pipelines on them
//! - Configuration loading from the `.conduit/` directory
//!
//! ## Modules
//!
//! - [`engine`]: `Pipe`, `PipeContext`, composite execution
//! - [`factory`]: `RenderableFactory`, `Registry`, configuration errors
//! - [`template`]: the template rendering capability
//! - [`triggers`]: `Trigger` and the interval trigger
//! - [`orchestrator`]: `Orchestrator` and `PipeRunner`
//! - [`builtins`]: pipes and services registered by default
//! - [`config`]: configuration loading
//! - [`init`]: `.conduit/` scaffolding

pub mod builtins;
pub mod config;
pub mod engine;
pub mod factory;
pub mod init;
pub mod orchestrator;
pub mod template;
pub mod triggers;

pub use conduit_protocol::{PipeConfig, PipeResult, RunnerDefinition, ServiceDefinition, TriggerDefinition};
