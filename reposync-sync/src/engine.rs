//! Reconciliation engine.
//!
//! ## Passes, per repository, in order
//!
//! 1. **Always**: read each always-sync path; skip when the remote bytes equal
//!    the template bytes exactly, upsert otherwise.
//! 2. **Deletion**: list the repository; delete every path that lies under a
//!    managed prefix and is in none of the template collections.
//! 3. **Initial**: create each initial-only path that does not exist yet, with
//!    the repository name substituted. Existing files are never touched.
//! 4. **Docs** (docs repositories only): as pass 1, for the docs collection.
//!
//! Each pass is planned and then applied before the next pass is planned.
//! When writes are not performed (dry run, plan, diff), later passes see the
//! upserts earlier passes planned instead of the unchanged remote.
//! Every mutation is attempted independently: a failure is recorded against
//! its path and the remaining steps still run.
//!
//! A read that fails with anything other than `NotFound` blocks that path:
//! nothing is written over a state that could not be observed.

use std::collections::HashMap;

use chrono::Utc;

use reposync_core::{OrgName, RepoSlug, RepositoryTarget};
use reposync_templates::{Collection, TemplateSet};

use crate::error::RemoteError;
use crate::plan::{ConvergencePlan, Operation, Pass, PlannedStep, SkipReason, DEFAULT_SOURCE_LABEL};
use crate::port::RemotePort;
use crate::report::{Action, PathOutcome, RunReport};

/// Knobs shared by every repository of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    /// Plan only: reads and listings happen, writes and deletes do not.
    pub dry_run: bool,
    /// Names the template source in commit messages.
    pub source_label: String,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            source_label: DEFAULT_SOURCE_LABEL.to_string(),
        }
    }
}

/// Reconciles repositories against one loaded [`TemplateSet`] through one port.
///
/// Holds no per-repository state; a single value can serve a whole run.
pub struct Reconciler<'a, P: RemotePort + ?Sized> {
    port: &'a P,
    templates: &'a TemplateSet,
    options: &'a RunOptions,
}

impl<'a, P: RemotePort + ?Sized> Reconciler<'a, P> {
    pub fn new(port: &'a P, templates: &'a TemplateSet, options: &'a RunOptions) -> Self {
        Self {
            port,
            templates,
            options,
        }
    }

    /// Converge `target` (owned by `org`) and report what happened per path.
    pub fn reconcile(&self, org: &OrgName, target: &RepositoryTarget) -> RunReport {
        let slug = target.slug(org);
        let started_at = Utc::now();
        tracing::info!("reconciling {slug} ({})", target.kind());

        let mut outcomes = Vec::new();
        let mut pending = PendingWrites::default();
        for pass in Pass::for_kind(target.kind()) {
            for op in self.plan_pass(&slug, *pass, &pending) {
                if self.options.dry_run {
                    pending.record(&op);
                }
                outcomes.push(self.apply(&slug, *pass, op));
            }
        }

        RunReport {
            repository: slug.to_string(),
            kind: target.kind(),
            dry_run: self.options.dry_run,
            started_at,
            finished_at: Utc::now(),
            outcomes,
        }
    }

    /// Build the full plan for `target` without applying anything.
    ///
    /// A path an earlier pass would upsert is treated as present, with the
    /// planned content, by every later pass.
    pub fn plan(&self, org: &OrgName, target: &RepositoryTarget) -> ConvergencePlan {
        let slug = target.slug(org);
        let mut steps = Vec::new();
        let mut pending = PendingWrites::default();
        for pass in Pass::for_kind(target.kind()) {
            for op in self.plan_pass(&slug, *pass, &pending) {
                pending.record(&op);
                steps.push(PlannedStep { pass: *pass, op });
            }
        }
        ConvergencePlan {
            repository: slug,
            steps,
        }
    }

    fn plan_pass(&self, slug: &RepoSlug, pass: Pass, pending: &PendingWrites) -> Vec<Operation> {
        match pass.collection() {
            None => self.plan_deletions(slug),
            Some(Collection::InitialOnly) => self.plan_initial(slug, pending),
            Some(collection) => self.plan_content_sync(slug, pass, collection, pending),
        }
    }

    // -----------------------------------------------------------------------
    // Planning
    // -----------------------------------------------------------------------

    /// Content-compared upsert/skip for every file of `collection`.
    fn plan_content_sync(
        &self,
        slug: &RepoSlug,
        pass: Pass,
        collection: Collection,
        pending: &PendingWrites,
    ) -> Vec<Operation> {
        let mut ops = Vec::with_capacity(self.templates.len(collection));
        for file in self.templates.files(collection) {
            let path = file.relative_path.clone();
            let content = file.content_for(&slug.name.0).into_owned();
            if let Some(planned) = pending.get(&path) {
                ops.push(if planned == content.as_slice() {
                    Operation::Skip {
                        path,
                        reason: SkipReason::Unchanged,
                    }
                } else {
                    Operation::Upsert {
                        message: pass.commit_message(&path, &self.options.source_label),
                        previous: Some(planned.to_vec()),
                        path,
                        content,
                        revision: None,
                    }
                });
                continue;
            }
            let op = match self.port.read(slug, &path) {
                Ok(remote) if remote.content == content => Operation::Skip {
                    path,
                    reason: SkipReason::Unchanged,
                },
                Ok(remote) => Operation::Upsert {
                    message: pass.commit_message(&path, &self.options.source_label),
                    path,
                    content,
                    revision: Some(remote.revision),
                    previous: Some(remote.content),
                },
                Err(RemoteError::NotFound) => Operation::Upsert {
                    message: pass.commit_message(&path, &self.options.source_label),
                    path,
                    content,
                    revision: None,
                    previous: None,
                },
                Err(error) => Operation::Blocked { path, error },
            };
            ops.push(op);
        }
        ops
    }

    /// Delete managed paths that no template collection claims.
    fn plan_deletions(&self, slug: &RepoSlug) -> Vec<Operation> {
        let remote_paths = match self.port.list_recursive(slug, "") {
            Ok(paths) => paths,
            Err(error) => {
                return vec![Operation::Blocked {
                    path: String::new(),
                    error,
                }]
            }
        };

        let mut candidates: Vec<String> = remote_paths
            .into_iter()
            .filter(|path| self.is_deletion_candidate(path))
            .collect();
        candidates.sort();
        candidates.dedup();

        let mut ops = Vec::with_capacity(candidates.len());
        for path in candidates {
            let op = match self.port.read(slug, &path) {
                Ok(remote) => Operation::Delete {
                    message: Pass::Deletion.commit_message(&path, &self.options.source_label),
                    path,
                    revision: remote.revision,
                },
                Err(RemoteError::NotFound) => Operation::Skip {
                    path,
                    reason: SkipReason::AlreadyAbsent,
                },
                Err(error) => Operation::Blocked { path, error },
            };
            ops.push(op);
        }
        ops
    }

    /// Managed, and not claimed by any collection. Initial-only and docs
    /// paths are additive-only and never deleted.
    fn is_deletion_candidate(&self, path: &str) -> bool {
        self.templates.managed().matches(path)
            && !Collection::all()
                .iter()
                .any(|c| self.templates.contains(*c, path))
    }

    /// Existence check only; content is never compared.
    fn plan_initial(&self, slug: &RepoSlug, pending: &PendingWrites) -> Vec<Operation> {
        let mut ops = Vec::with_capacity(self.templates.len(Collection::InitialOnly));
        for file in self.templates.files(Collection::InitialOnly) {
            let path = file.relative_path.clone();
            let exists = match pending.get(&path) {
                Some(_) => Ok(true),
                None => self.port.exists(slug, &path),
            };
            let op = match exists {
                Ok(true) => Operation::Skip {
                    path,
                    reason: SkipReason::AlreadyExists,
                },
                Ok(false) => Operation::Upsert {
                    message: Pass::Initial.commit_message(&path, &self.options.source_label),
                    content: file.content_for(&slug.name.0).into_owned(),
                    path,
                    revision: None,
                    previous: None,
                },
                Err(error) => Operation::Blocked { path, error },
            };
            ops.push(op);
        }
        ops
    }

    // -----------------------------------------------------------------------
    // Applying
    // -----------------------------------------------------------------------

    fn apply(&self, slug: &RepoSlug, pass: Pass, op: Operation) -> PathOutcome {
        let dry_run = self.options.dry_run;
        let (path, action) = match op {
            Operation::Skip { path, reason } => {
                tracing::debug!("{slug}: {path} {reason}");
                (path, Action::Skipped { reason })
            }
            Operation::Blocked { path, error } => {
                tracing::warn!("{slug}: cannot determine state of '{path}': {error}");
                (path, Action::failed(&error))
            }
            Operation::Upsert {
                path, previous, ..
            } if dry_run => {
                tracing::info!("[dry-run] {slug}: would write {path}");
                let action = if previous.is_some() {
                    Action::WouldUpdate
                } else {
                    Action::WouldCreate
                };
                (path, action)
            }
            Operation::Upsert {
                path,
                content,
                revision,
                message,
                ..
            } => {
                let action = match self
                    .port
                    .write(slug, &path, &content, revision.as_deref(), &message)
                {
                    Ok(_) if revision.is_some() => Action::Updated,
                    Ok(_) => Action::Created,
                    Err(error) => {
                        tracing::warn!("{slug}: write of {path} failed: {error}");
                        Action::failed(&error)
                    }
                };
                if matches!(action, Action::Created | Action::Updated) {
                    tracing::info!("{slug}: wrote {path}");
                }
                (path, action)
            }
            Operation::Delete { path, .. } if dry_run => {
                tracing::info!("[dry-run] {slug}: would delete {path}");
                (path, Action::WouldDelete)
            }
            Operation::Delete {
                path,
                revision,
                message,
            } => {
                let action = match self.port.delete(slug, &path, &revision, &message) {
                    Ok(()) => {
                        tracing::info!("{slug}: deleted {path}");
                        Action::Deleted
                    }
                    Err(RemoteError::NotFound) => Action::Skipped {
                        reason: SkipReason::AlreadyAbsent,
                    },
                    Err(error) => {
                        tracing::warn!("{slug}: delete of {path} failed: {error}");
                        Action::failed(&error)
                    }
                };
                (path, action)
            }
        };
        PathOutcome { pass, path, action }
    }
}

/// Upserts planned by earlier passes of the same repository that have not
/// reached the remote.
#[derive(Debug, Default)]
struct PendingWrites(HashMap<String, Vec<u8>>);

impl PendingWrites {
    fn record(&mut self, op: &Operation) {
        if let Operation::Upsert { content, .. } = op {
            self.0.insert(op.path().to_string(), content.clone());
        }
    }

    fn get(&self, path: &str) -> Option<&[u8]> {
        self.0.get(path).map(Vec::as_slice)
    }
}

/// Reconcile a single repository with default construction of the engine.
pub fn reconcile<P: RemotePort + ?Sized>(
    port: &P,
    org: &OrgName,
    target: &RepositoryTarget,
    templates: &TemplateSet,
    options: &RunOptions,
) -> RunReport {
    Reconciler::new(port, templates, options).reconcile(org, target)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
