//! Configuration loading.
//!
//! Reads the `.conduit/` directory of a project: `config.toml` for global
//! settings, `services/*.yaml` for injectable services and `runners/*.yaml`
//! for scheduled pipelines.

pub mod error;
pub mod loader;
pub mod models;
