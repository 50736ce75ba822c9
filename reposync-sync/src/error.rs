//! Error types for reposync-sync.

use serde::Serialize;
use thiserror::Error;

use reposync_core::ConfigError;
use reposync_templates::TemplateError;

/// Failure signals returned by a [`RemotePort`](crate::port::RemotePort).
///
/// `NotFound` is an expected answer that drives create-vs-update branching; the
/// other variants become per-path failures in the run report.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    /// The path (or repository) does not exist.
    #[error("not found")]
    NotFound,

    /// Network failure, rate limit, or server-side error. Not retried here.
    #[error("transient transport error: {message}")]
    Transient { message: String },

    /// The revision marker did not match: the remote changed since it was read.
    #[error("revision conflict: {message}")]
    Conflict { message: String },

    /// The remote answered with something this adapter cannot interpret.
    #[error("unexpected remote response: {message}")]
    Protocol { message: String },
}

impl RemoteError {
    pub fn transient(message: impl Into<String>) -> Self {
        RemoteError::Transient {
            message: message.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        RemoteError::Conflict {
            message: message.into(),
        }
    }

    pub fn protocol(message: impl Into<String>) -> Self {
        RemoteError::Protocol {
            message: message.into(),
        }
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            RemoteError::NotFound => FailureKind::NotFound,
            RemoteError::Transient { .. } => FailureKind::Transient,
            RemoteError::Conflict { .. } => FailureKind::Conflict,
            RemoteError::Protocol { .. } => FailureKind::Protocol,
        }
    }
}

/// Serializable classification of a per-path failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    NotFound,
    Transient,
    Conflict,
    Protocol,
}

/// Fatal errors: raised before any remote state is touched.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Malformed or missing registry, or no organization configured.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Malformed or missing template tree.
    #[error("template error: {0}")]
    Template(#[from] TemplateError),

    /// A scope filter named a repository absent from the registry.
    #[error("repository '{name}' is not in the registry")]
    UnknownRepository { name: String },
}
