//! Error types for configuration loading.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading `.conduit/`.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A file under `.conduit/` exists but could not be read.
    #[error("Failed to read config file at {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    /// `config.toml` is not valid TOML or does not match `GlobalConfig`.
    #[error("Failed to parse TOML file at {path}: {source}")]
    TomlParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// A runner or service file is not a valid definition.
    #[error("Failed to parse YAML file at {path}: {source}")]
    YamlParse {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    /// `runners/` or `services/` could not be listed.
    #[error("Failed to traverse directory {path}: {source}")]
    DirectoryWalk {
        path: PathBuf,
        source: walkdir::Error,
    },

    /// Files parsed but do not fit together, e.g. two services with one id.
    #[error("Invalid configuration in {path}: {reason}")]
    InvalidConfig { path: PathBuf, reason: String },
}

/// Result of loading configuration.
pub type ConfigResult<T> = Result<T, ConfigError>;
