//! Dry-run unified diff support for `reposync diff`.

use similar::TextDiff;

use reposync_core::{OrgName, RepositoryTarget};
use reposync_templates::TemplateSet;

use crate::engine::{Reconciler, RunOptions};
use crate::error::RemoteError;
use crate::plan::{Operation, Pass};
use crate::port::RemotePort;

/// A single pending write rendered as a diff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDiff {
    pub pass: Pass,
    pub path: String,
    pub unified_diff: String,
}

/// Everything `sync` would change in one repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffRepositoryResult {
    pub repository: String,
    pub diffs: Vec<FileDiff>,
    /// Paths the deletion pass would remove.
    pub deletions: Vec<String>,
    /// Paths whose remote state could not be read.
    pub blocked: Vec<(String, RemoteError)>,
}

impl DiffRepositoryResult {
    pub fn is_empty(&self) -> bool {
        self.diffs.is_empty() && self.deletions.is_empty() && self.blocked.is_empty()
    }
}

/// Compare what `sync` would write with current remote content.
///
/// No files are written or deleted.
pub fn diff_repository<P: RemotePort + ?Sized>(
    port: &P,
    org: &OrgName,
    target: &RepositoryTarget,
    templates: &TemplateSet,
    options: &RunOptions,
) -> DiffRepositoryResult {
    let plan = Reconciler::new(port, templates, options).plan(org, target);

    let mut result = DiffRepositoryResult {
        repository: plan.repository.to_string(),
        diffs: Vec::new(),
        deletions: Vec::new(),
        blocked: Vec::new(),
    };
    for step in plan.steps {
        match step.op {
            Operation::Upsert {
                path,
                content,
                previous,
                ..
            } => {
                let unified_diff = unified(&path, previous.as_deref().unwrap_or_default(), &content);
                result.diffs.push(FileDiff {
                    pass: step.pass,
                    path,
                    unified_diff,
                });
            }
            Operation::Delete { path, .. } => result.deletions.push(path),
            Operation::Blocked { path, error } => result.blocked.push((path, error)),
            Operation::Skip { .. } => {}
        }
    }
    result
}

fn unified(path: &str, old: &[u8], new: &[u8]) -> String {
    let old_header = format!("a/{path}");
    let new_header = format!("b/{path}");
    let (Ok(old), Ok(new)) = (std::str::from_utf8(old), std::str::from_utf8(new)) else {
        return format!("Binary files {old_header} and {new_header} differ\n");
    };
    let unified = TextDiff::from_lines(old, new)
        .unified_diff()
        .header(&old_header, &new_header)
        .context_radius(3)
        .to_string();
    unified
}
