//! Writes the embedded templates into a project.

use super::error::{InitError, InitResult};
use super::templates::{get_template, list_templates};
use crate::config::loader::CONFIG_DIR;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Templates written even in minimal mode.
const MINIMAL_TEMPLATES: &[&str] = &["config.toml", "runners/heartbeat.yaml"];

#[derive(Debug, Clone)]
pub struct InitOptions {
    /// Directory in which `.conduit/` is created.
    pub target_dir: PathBuf,

    /// Write into an existing `.conduit/` directory.
    pub force: bool,

    /// Only `config.toml` and the heartbeat runner.
    pub minimal: bool,
}

impl Default for InitOptions {
    fn default() -> Self {
        Self {
            target_dir: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            force: false,
            minimal: false,
        }
    }
}

/// Generate a `.conduit/` directory from the embedded templates.
///
/// ```text
/// .conduit/
/// ├── config.toml
/// ├── runners/
/// │   ├── heartbeat.yaml
/// │   └── nightly-report.yaml (unless minimal)
/// └── services/
///     └── reporter.yaml (unless minimal)
/// ```
///
/// # Returns
///
/// The paths written, in order.
///
/// # Errors
///
/// Fails if `.conduit/` exists and `force` is not set, or on any file
/// system error.
pub async fn generate_conduit_structure(options: InitOptions) -> InitResult<Vec<PathBuf>> {
    let conduit_dir = options.target_dir.join(CONFIG_DIR);

    if conduit_dir.exists() && !options.force {
        return Err(InitError::DirectoryExists(conduit_dir));
    }

    let templates: Vec<String> = if options.minimal {
        MINIMAL_TEMPLATES.iter().map(|path| path.to_string()).collect()
    } else {
        list_templates("")
    };

    let mut written = Vec::with_capacity(templates.len());
    for template in &templates {
        written.push(write_template_file(&conduit_dir, template)?);
    }

    info!(path = %conduit_dir.display(), files = written.len(), "Initialized configuration");
    Ok(written)
}

fn write_template_file(conduit_dir: &Path, template_path: &str) -> InitResult<PathBuf> {
    let content = get_template(template_path)
        .ok_or_else(|| InitError::TemplateNotFound(template_path.to_string()))?;

    let target_path = conduit_dir.join(template_path);

    if let Some(parent) = target_path.parent() {
        fs::create_dir_all(parent).map_err(|source| InitError::DirectoryCreate {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    fs::write(&target_path, content).map_err(|source| InitError::FileWrite {
        path: target_path.clone(),
        source,
    })?;

    Ok(target_path)
}
