//! # reposync-sync
//!
//! Reconciliation of remote repositories against the template tree.
//!
//! Call [`reconcile`] to converge a single repository through a
//! [`RemotePort`], or [`pipeline::run`] to process every repository in the
//! registry. [`diff_repository`] shows what a run would change without
//! changing it.

pub mod diff;
pub mod engine;
pub mod error;
pub mod local;
pub mod memory;
pub mod pipeline;
pub mod plan;
pub mod port;
pub mod report;

pub use diff::{diff_repository, DiffRepositoryResult, FileDiff};
pub use engine::{reconcile, Reconciler, RunOptions};
pub use error::{FailureKind, RemoteError, SyncError};
pub use local::LocalDirRemote;
pub use memory::MemoryRemote;
pub use plan::{ConvergencePlan, Operation, Pass, PlannedStep, SkipReason};
pub use port::{RemoteFile, RemotePort};
pub use report::{Action, Counts, PathOutcome, RunReport, RunSummary};
