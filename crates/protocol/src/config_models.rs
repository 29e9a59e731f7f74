//! Global configuration models for `.conduit/config.toml`.
//!
//! This module defines the structure of the global configuration file that
//! controls process-wide settings for the orchestrator.

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use ts_rs::TS;

/// Represents global settings from `.conduit/config.toml`.
///
/// # Example
///
/// ```toml
/// # .conduit/config.toml
/// shutdown_timeout_secs = 10
///
/// [params]
/// environment = "staging"
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
pub struct GlobalConfig {
    /// Upper bound on how long a graceful shutdown waits for runs that
    /// were already dispatched.
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_secs: u64,

    /// Ambient values seeded into the `params` of every fresh run context.
    #[serde(default)]
    #[ts(type = "Record<string, unknown>")]
    pub params: BTreeMap<String, Value>,
}

fn default_shutdown_timeout() -> u64 {
    30
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            shutdown_timeout_secs: default_shutdown_timeout(),
            params: BTreeMap::new(),
        }
    }
}
