//! Error types for reposync-core.

use std::path::PathBuf;

use thiserror::Error;

/// Configuration errors. All of them are fatal: a run aborts before any
/// remote repository is touched.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Underlying I/O failure while reading or writing the registry.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The registry file did not exist at the expected path.
    #[error("registry not found at {path}")]
    RegistryNotFound { path: PathBuf },

    /// YAML parse error on load, with the file path and serde_yaml's line context.
    #[error("failed to parse registry at {path}: {source}")]
    ParseYaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// JSON parse error on load, with the file path and serde_json's line context.
    #[error("failed to parse registry at {path}: {source}")]
    ParseJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// YAML serialization error (save path).
    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization error (save path).
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// A repository entry has an empty (or whitespace-only) name.
    #[error("registry {path}: repository #{index} has an empty name")]
    EmptyName { path: PathBuf, index: usize },

    /// A repository name that cannot be used as a single path segment.
    #[error("registry {path}: invalid repository name '{name}'")]
    InvalidName { path: PathBuf, name: String },

    /// The same repository name appears more than once.
    #[error("registry {path}: duplicate repository name '{name}'")]
    DuplicateName { path: PathBuf, name: String },

    /// No organization given on the command line nor in the registry.
    #[error("no organization configured; pass --org or set \"org\" in the registry")]
    MissingOrg,
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> ConfigError {
    ConfigError::Io {
        path: path.into(),
        source,
    }
}
