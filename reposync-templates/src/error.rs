//! Error types for reposync-templates.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise while loading the template tree.
#[derive(Debug, Error)]
pub enum TemplateError {
    /// The template root directory does not exist.
    #[error("template root not found at {path}")]
    RootNotFound { path: PathBuf },

    /// Filesystem error while walking or reading templates.
    #[error("template io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A template file name is not valid UTF-8 and cannot be used as a remote path.
    #[error("template path is not valid UTF-8: {path}")]
    NonUtf8Path { path: PathBuf },

    /// `managed-paths.yaml` could not be parsed.
    #[error("failed to parse managed paths at {path}: {source}")]
    ManagedPaths {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// A managed prefix that would match every path (empty or `/`).
    #[error("invalid managed prefix '{prefix}'")]
    InvalidPrefix { prefix: String },
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> TemplateError {
    TemplateError::Io {
        path: path.into(),
        source,
    }
}
