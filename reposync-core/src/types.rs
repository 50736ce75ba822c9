//! Domain types for the repository registry.
//!
//! All types are serializable/deserializable via serde, so the registry can be
//! stored as either JSON or YAML.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// A strongly-typed repository name (the part after `owner/`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RepoName(pub String);

impl fmt::Display for RepoName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for RepoName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for RepoName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// A strongly-typed organization / owner name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrgName(pub String);

impl fmt::Display for OrgName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for OrgName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for OrgName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Fully-qualified remote repository, `org/name`.
///
/// Passed explicitly to every remote call; there is no ambient "current org".
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepoSlug {
    pub org: OrgName,
    pub name: RepoName,
}

impl RepoSlug {
    pub fn new(org: OrgName, name: RepoName) -> Self {
        Self { org, name }
    }
}

impl fmt::Display for RepoSlug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.org, self.name)
    }
}

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// The category of a target repository, derived from its `type` label.
///
/// Only `docs` is significant; every other label is a plain repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RepoKind {
    #[default]
    Plain,
    Docs,
}

impl RepoKind {
    pub fn is_docs(self) -> bool {
        self == RepoKind::Docs
    }
}

impl From<&str> for RepoKind {
    fn from(s: &str) -> Self {
        if s.trim().eq_ignore_ascii_case("docs") {
            RepoKind::Docs
        } else {
            RepoKind::Plain
        }
    }
}

impl fmt::Display for RepoKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RepoKind::Plain => write!(f, "plain"),
            RepoKind::Docs => write!(f, "docs"),
        }
    }
}

// ---------------------------------------------------------------------------
// Domain structs
// ---------------------------------------------------------------------------

/// One repository the fleet is reconciled against.
///
/// The registry's `type` label is kept verbatim so that saving the registry
/// never rewrites labels the engine does not interpret.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryTarget {
    pub name: RepoName,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl RepositoryTarget {
    pub fn new(name: impl Into<RepoName>, kind: RepoKind) -> Self {
        let label = kind.is_docs().then(|| kind.to_string());
        Self {
            name: name.into(),
            label,
        }
    }

    /// Target with a free-form `type` label, stored as given.
    pub fn with_label(name: impl Into<RepoName>, label: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: Some(label.into()),
        }
    }

    pub fn kind(&self) -> RepoKind {
        self.label.as_deref().map(RepoKind::from).unwrap_or_default()
    }

    /// Qualify this target with an owner.
    pub fn slug(&self, org: &OrgName) -> RepoSlug {
        RepoSlug::new(org.clone(), self.name.clone())
    }
}

/// Root of the repository registry document.
///
/// Order of `repositories` is the processing order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Registry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub org: Option<OrgName>,
    #[serde(default)]
    pub repositories: Vec<RepositoryTarget>,
}

impl Registry {
    /// Look up a repository by name.
    pub fn find(&self, name: &str) -> Option<&RepositoryTarget> {
        self.repositories.iter().find(|r| r.name.0 == name)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
