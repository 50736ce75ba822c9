//! Run reports: per-path outcomes, per-repository reports, run summary.

use chrono::{DateTime, Utc};
use serde::Serialize;

use reposync_core::RepoKind;

use crate::error::{FailureKind, RemoteError};
use crate::plan::{Pass, SkipReason};

/// What happened to one path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    Created,
    Updated,
    Deleted,
    Skipped { reason: SkipReason },
    /// Dry run: the file would have been created.
    WouldCreate,
    /// Dry run: the file would have been replaced.
    WouldUpdate,
    /// Dry run: the file would have been deleted.
    WouldDelete,
    Failed { kind: FailureKind, error: String },
}

impl Action {
    pub fn failed(error: &RemoteError) -> Self {
        Action::Failed {
            kind: error.kind(),
            error: error.to_string(),
        }
    }
}

/// Outcome of one planned step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PathOutcome {
    pub pass: Pass,
    pub path: String,
    #[serde(flatten)]
    pub action: Action,
}

/// Aggregate counts over outcomes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Counts {
    pub created: usize,
    pub updated: usize,
    pub deleted: usize,
    pub skipped: usize,
    pub would_create: usize,
    pub would_update: usize,
    pub would_delete: usize,
    pub failed: usize,
}

impl Counts {
    fn record(&mut self, action: &Action) {
        match action {
            Action::Created => self.created += 1,
            Action::Updated => self.updated += 1,
            Action::Deleted => self.deleted += 1,
            Action::Skipped { .. } => self.skipped += 1,
            Action::WouldCreate => self.would_create += 1,
            Action::WouldUpdate => self.would_update += 1,
            Action::WouldDelete => self.would_delete += 1,
            Action::Failed { .. } => self.failed += 1,
        }
    }

    fn add(&mut self, other: &Counts) {
        self.created += other.created;
        self.updated += other.updated;
        self.deleted += other.deleted;
        self.skipped += other.skipped;
        self.would_create += other.would_create;
        self.would_update += other.would_update;
        self.would_delete += other.would_delete;
        self.failed += other.failed;
    }

    /// Writes applied (created + updated).
    pub fn upserted(&self) -> usize {
        self.created + self.updated
    }

    /// Mutations applied or, in a dry run, pending.
    pub fn changes(&self) -> usize {
        self.upserted() + self.deleted + self.would_create + self.would_update + self.would_delete
    }
}

/// Result of reconciling one repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    /// `org/name`
    pub repository: String,
    pub kind: RepoKind,
    pub dry_run: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub outcomes: Vec<PathOutcome>,
}

impl RunReport {
    pub fn counts(&self) -> Counts {
        let mut counts = Counts::default();
        for outcome in &self.outcomes {
            counts.record(&outcome.action);
        }
        counts
    }

    pub fn failures(&self) -> impl Iterator<Item = &PathOutcome> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.action, Action::Failed { .. }))
    }

    /// Outcome for `path` in `pass`, if the path was planned.
    pub fn outcome(&self, pass: Pass, path: &str) -> Option<&Action> {
        self.outcomes
            .iter()
            .find(|o| o.pass == pass && o.path == path)
            .map(|o| &o.action)
    }
}

/// All repository reports of a run plus their totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub totals: Counts,
    pub reports: Vec<RunReport>,
}

impl RunSummary {
    pub fn new(reports: Vec<RunReport>) -> Self {
        let mut totals = Counts::default();
        for report in &reports {
            totals.add(&report.counts());
        }
        Self { totals, reports }
    }

    pub fn has_failures(&self) -> bool {
        self.totals.failed > 0
    }
}
