//! reposync core library: domain types, registry persistence, errors.
//!
//! - [`types`] — newtypes and the registry document
//! - [`error`] — [`ConfigError`]
//! - [`registry`] — load / validate / save

pub mod error;
pub mod registry;
pub mod types;

pub use error::ConfigError;
pub use types::{OrgName, Registry, RepoKind, RepoName, RepoSlug, RepositoryTarget};
