//! Convergence plan: the per-repository list of operations.
//!
//! A plan is ephemeral. It is built from remote reads, consumed immediately
//! by the engine, and never persisted.

use serde::Serialize;

use reposync_core::{RepoKind, RepoSlug};
use reposync_templates::Collection;

use crate::error::RemoteError;

/// Default `<label>` in commit messages.
pub const DEFAULT_SOURCE_LABEL: &str = "control-center";

/// Reconciliation passes, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Pass {
    /// Content-compared upserts of the always-sync collection.
    Always,
    /// Removal of managed paths that no template collection claims.
    Deletion,
    /// Create-if-absent of the initial-only collection.
    Initial,
    /// Content-compared upserts of the docs collection (docs repositories only).
    Docs,
}

impl Pass {
    /// Passes that apply to a repository of `kind`, in order.
    pub fn for_kind(kind: RepoKind) -> &'static [Pass] {
        match kind {
            RepoKind::Docs => &[Pass::Always, Pass::Deletion, Pass::Initial, Pass::Docs],
            RepoKind::Plain => &[Pass::Always, Pass::Deletion, Pass::Initial],
        }
    }

    /// Template collection feeding this pass; the deletion pass has none.
    pub fn collection(&self) -> Option<Collection> {
        match self {
            Pass::Always => Some(Collection::Always),
            Pass::Deletion => None,
            Pass::Initial => Some(Collection::InitialOnly),
            Pass::Docs => Some(Collection::Docs),
        }
    }

    /// Commit message for a write or delete of `path` in this pass.
    pub fn commit_message(&self, path: &str, source_label: &str) -> String {
        match self {
            Pass::Always => format!("chore: sync {path} from {source_label}"),
            Pass::Deletion => {
                format!("chore: remove {path} (no longer managed by {source_label})")
            }
            Pass::Initial => format!("chore: initial setup for {path}"),
            Pass::Docs => format!("chore: sync specialized docs file {path}"),
        }
    }
}

impl std::fmt::Display for Pass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Pass::Always => "always",
            Pass::Deletion => "deletion",
            Pass::Initial => "initial",
            Pass::Docs => "docs",
        })
    }
}

/// Why no write was planned for a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Remote content is byte-identical to the template.
    Unchanged,
    /// Initial-only file already present; never overwritten.
    AlreadyExists,
    /// Deletion candidate vanished before it could be deleted.
    AlreadyAbsent,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            SkipReason::Unchanged => "unchanged",
            SkipReason::AlreadyExists => "already exists",
            SkipReason::AlreadyAbsent => "already absent",
        })
    }
}

/// One planned step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    /// Write a file, replacing the remote `revision` when there is one.
    Upsert {
        path: String,
        content: Vec<u8>,
        revision: Option<String>,
        /// Remote content at planning time, kept for diffs.
        previous: Option<Vec<u8>>,
        message: String,
    },
    /// Remove a file currently at `revision`.
    Delete {
        path: String,
        revision: String,
        message: String,
    },
    /// Nothing to do.
    Skip { path: String, reason: SkipReason },
    /// The remote state could not be determined; no mutation is attempted.
    Blocked { path: String, error: RemoteError },
}

impl Operation {
    pub fn path(&self) -> &str {
        match self {
            Operation::Upsert { path, .. }
            | Operation::Delete { path, .. }
            | Operation::Skip { path, .. }
            | Operation::Blocked { path, .. } => path,
        }
    }

    pub fn is_mutation(&self) -> bool {
        matches!(self, Operation::Upsert { .. } | Operation::Delete { .. })
    }
}

/// A planned operation tagged with the pass that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedStep {
    pub pass: Pass,
    pub op: Operation,
}

/// Ordered operations for one repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvergencePlan {
    pub repository: RepoSlug,
    pub steps: Vec<PlannedStep>,
}

impl ConvergencePlan {
    /// Steps that would write or delete.
    pub fn mutations(&self) -> impl Iterator<Item = &PlannedStep> {
        self.steps.iter().filter(|s| s.op.is_mutation())
    }

    /// Steps of one pass, in order.
    pub fn pass(&self, pass: Pass) -> impl Iterator<Item = &PlannedStep> {
        self.steps.iter().filter(move |s| s.pass == pass)
    }
}
