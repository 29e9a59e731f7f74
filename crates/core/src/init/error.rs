//! Error types for initialization.

use std::path::PathBuf;
use thiserror::Error;

/// Result of scaffolding.
pub type InitResult<T> = Result<T, InitError>;

/// Errors raised while writing a new `.conduit/` directory.
#[derive(Debug, Error)]
pub enum InitError {
    /// `.conduit/` is already there and `force` was not set.
    #[error(".conduit directory already exists at {0:?}. Use --force to overwrite.")]
    DirectoryExists(PathBuf),

    /// A scaffold path has no embedded template.
    #[error("Template file not found: {0}")]
    TemplateNotFound(String),

    /// A directory inside `.conduit/` could not be created.
    #[error("Failed to create directory {path:?}: {source}")]
    DirectoryCreate {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A scaffold file could not be written.
    #[error("Failed to write file {path:?}: {source}")]
    FileWrite {
        path: PathBuf,
        source: std::io::Error,
    },
}
