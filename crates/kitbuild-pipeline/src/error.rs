//! Error types shared by the build steps.

use std::path::Path;

use crate::process::ToolError;

/// Errors raised while generating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Unsupported dependency group label: {0}")]
    UnknownLabel(String),

    #[error("Dependency group label used twice: {0}")]
    DuplicateLabel(String),

    #[error("Malformed manifest {path}: {message}")]
    MalformedManifest { path: String, message: String },
}

/// Errors that abort a build step.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error(transparent)]
    Tool(#[from] ToolError),

    #[error("Filesystem error at {path}: {message}")]
    Filesystem { path: String, message: String },

    #[error(transparent)]
    Configuration(#[from] ConfigError),
}

impl BuildError {
    /// Wrap an I/O failure together with the path it happened on.
    pub fn fs(path: &Path, err: impl std::fmt::Display) -> Self {
        BuildError::Filesystem {
            path: path.display().to_string(),
            message: err.to_string(),
        }
    }
}
