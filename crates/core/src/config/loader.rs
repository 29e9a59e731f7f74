//! Loader for the `.conduit/` directory.
//!
//! - `config.toml`: global settings
//! - `services/*.yaml`: one service definition per file
//! - `runners/*.yaml`: one runner definition per file
//!
//! Files are read in file name order. `.yml` is accepted as well.

use crate::config::error::{ConfigError, ConfigResult};
use crate::config::models::AppConfig;
use conduit_protocol::config_models::GlobalConfig;
use conduit_protocol::pipe_models::{RunnerDefinition, ServiceDefinition};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Name of the configuration directory inside a project root.
pub const CONFIG_DIR: &str = ".conduit";

/// Loads all configuration from `<root>/.conduit/`.
///
/// # Arguments
///
/// * `root` - Project root containing the `.conduit/` folder
///
/// # Returns
///
/// The loaded `AppConfig`. A missing `.conduit/` directory, or any missing
/// file or sub-directory inside it, yields defaults rather than an error.
///
/// # Errors
///
/// Returns `ConfigError` if a file exists but cannot be read or parsed, or
/// if two service files declare the same id.
pub async fn load_config(root: &Path) -> ConfigResult<AppConfig> {
    let conduit_dir = root.join(CONFIG_DIR);

    if !conduit_dir.exists() {
        debug!(path = %conduit_dir.display(), "No configuration directory, using defaults");
        return Ok(AppConfig::default());
    }

    let global = load_global_config(&conduit_dir)?;
    let services = load_services(&conduit_dir)?;
    let runners: Vec<RunnerDefinition> = load_yaml_dir(&conduit_dir.join("runners"))?
        .into_iter()
        .map(|(_, runner)| runner)
        .collect();

    debug!(
        services = services.len(),
        runners = runners.len(),
        "Configuration loaded"
    );

    Ok(AppConfig {
        global,
        services,
        runners,
    })
}

fn load_global_config(conduit_dir: &Path) -> ConfigResult<GlobalConfig> {
    let config_path = conduit_dir.join("config.toml");

    if !config_path.exists() {
        return Ok(GlobalConfig::default());
    }

    let content = std::fs::read_to_string(&config_path).map_err(|source| ConfigError::FileRead {
        path: config_path.clone(),
        source,
    })?;

    toml::from_str(&content).map_err(|source| ConfigError::TomlParse {
        path: config_path,
        source,
    })
}

fn load_services(conduit_dir: &Path) -> ConfigResult<Vec<ServiceDefinition>> {
    let services: Vec<(PathBuf, ServiceDefinition)> = load_yaml_dir(&conduit_dir.join("services"))?;

    let mut seen: HashMap<String, PathBuf> = HashMap::new();
    for (path, service) in &services {
        if let Some(first) = seen.insert(service.id.clone(), path.clone()) {
            return Err(ConfigError::InvalidConfig {
                path: path.clone(),
                reason: format!(
                    "service id '{}' is already defined in {}",
                    service.id,
                    first.display()
                ),
            });
        }
    }

    Ok(services.into_iter().map(|(_, service)| service).collect())
}

/// Parse every `*.yaml` / `*.yml` file directly inside `dir`.
fn load_yaml_dir<T: DeserializeOwned>(dir: &Path) -> ConfigResult<Vec<(PathBuf, T)>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut loaded = Vec::new();

    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|source| ConfigError::DirectoryWalk {
            path: dir.to_path_buf(),
            source,
        })?;

        let path = entry.path();
        let ext = path.extension().and_then(|s| s.to_str());
        if ext != Some("yaml") && ext != Some("yml") {
            continue;
        }

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;

        let value: T = serde_yaml::from_str(&content).map_err(|source| ConfigError::YamlParse {
            path: path.to_path_buf(),
            source,
        })?;

        loaded.push((path.to_path_buf(), value));
    }

    Ok(loaded)
}
