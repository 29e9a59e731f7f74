//! # conduit-protocol
//!
//! Declarative definitions and data models shared by the conduit engine,
//! its configuration loader and front ends.
//!
//! ## Modules
//!
//! - [`pipe_models`]: Pipe, trigger, runner and service definitions
//! - [`config_models`]: Global configuration from config.toml
//! - [`result_models`]: Step outcomes and how they combine
//! - [`ipc`]: Run notifications emitted by the orchestrator
//!
//! ## Design Principles
//!
//! - Minimal dependencies: serde, ts-rs, uuid and chrono
//! - TypeScript generation: All types derive `TS` for client compatibility
//! - Independent compilation: No dependencies on other conduit crates

pub mod config_models;
pub mod ipc;
pub mod pipe_models;
pub mod result_models;

// Re-export all public types for convenience
pub use config_models::*;
pub use ipc::*;
pub use pipe_models::*;
pub use result_models::*;
