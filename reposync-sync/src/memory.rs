//! In-memory [`RemotePort`] with call recording and fault injection.
//!
//! Revisions are `r1`, `r2`, … from a counter shared by all repositories.
//! Writes and deletes enforce revision markers the same way the hosted API
//! does: updating or deleting requires the current revision, and creating
//! requires that the path does not exist yet.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

use reposync_core::RepoSlug;

use crate::error::RemoteError;
use crate::port::{RemoteFile, RemotePort};

/// Kind of port call, for recording and fault injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallKind {
    Read,
    Write,
    Delete,
    List,
}

/// One recorded port call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub kind: CallKind,
    pub repo: String,
    pub path: String,
    /// Commit message for writes and deletes.
    pub message: Option<String>,
}

#[derive(Debug, Clone)]
struct StoredFile {
    content: Vec<u8>,
    revision: String,
}

#[derive(Debug, Clone)]
enum FaultTrigger {
    /// The n-th call (1-based) of a kind.
    Nth(usize),
    /// Every call of a kind on a path.
    Path(String),
}

#[derive(Debug, Clone)]
struct Fault {
    kind: CallKind,
    trigger: FaultTrigger,
    error: RemoteError,
}

#[derive(Debug, Default)]
struct State {
    repos: HashMap<RepoSlug, BTreeMap<String, StoredFile>>,
    next_revision: u64,
    calls: Vec<Call>,
    counts: HashMap<CallKind, usize>,
    faults: Vec<Fault>,
}

impl State {
    fn revision(&mut self) -> String {
        self.next_revision += 1;
        format!("r{}", self.next_revision)
    }

    /// Record the call and return the injected error, if any.
    fn record(
        &mut self,
        kind: CallKind,
        repo: &RepoSlug,
        path: &str,
        message: Option<&str>,
    ) -> Option<RemoteError> {
        self.calls.push(Call {
            kind,
            repo: repo.to_string(),
            path: path.to_string(),
            message: message.map(str::to_string),
        });
        let count = self.counts.entry(kind).or_insert(0);
        *count += 1;
        let count = *count;
        self.faults
            .iter()
            .find(|f| {
                f.kind == kind
                    && match &f.trigger {
                        FaultTrigger::Nth(n) => *n == count,
                        FaultTrigger::Path(p) => p == path,
                    }
            })
            .map(|f| f.error.clone())
    }
}

/// Remote repositories held in memory.
#[derive(Debug, Default)]
pub struct MemoryRemote {
    state: Mutex<State>,
}

impl MemoryRemote {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Seed a file without recording a call. Returns its revision.
    pub fn insert(&self, repo: &RepoSlug, path: &str, content: impl Into<Vec<u8>>) -> String {
        let mut state = self.lock();
        let revision = state.revision();
        state.repos.entry(repo.clone()).or_default().insert(
            path.to_string(),
            StoredFile {
                content: content.into(),
                revision: revision.clone(),
            },
        );
        revision
    }

    /// Current content of a file, bypassing call recording.
    pub fn content(&self, repo: &RepoSlug, path: &str) -> Option<Vec<u8>> {
        self.lock()
            .repos
            .get(repo)
            .and_then(|files| files.get(path))
            .map(|f| f.content.clone())
    }

    /// All paths currently stored for `repo`, sorted.
    pub fn paths(&self, repo: &RepoSlug) -> Vec<String> {
        self.lock()
            .repos
            .get(repo)
            .map(|files| files.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Every call made so far, in order.
    pub fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    /// Recorded calls of one kind.
    pub fn calls_of(&self, kind: CallKind) -> Vec<Call> {
        self.lock()
            .calls
            .iter()
            .filter(|c| c.kind == kind)
            .cloned()
            .collect()
    }

    pub fn clear_calls(&self) {
        let mut state = self.lock();
        state.calls.clear();
        state.counts.clear();
    }

    /// Fail the n-th (1-based) call of `kind` with `error`.
    pub fn fail_nth(&self, kind: CallKind, n: usize, error: RemoteError) {
        self.lock().faults.push(Fault {
            kind,
            trigger: FaultTrigger::Nth(n),
            error,
        });
    }

    /// Fail every call of `kind` on `path` with `error`.
    pub fn fail_path(&self, kind: CallKind, path: &str, error: RemoteError) {
        self.lock().faults.push(Fault {
            kind,
            trigger: FaultTrigger::Path(path.to_string()),
            error,
        });
    }
}

impl RemotePort for MemoryRemote {
    fn read(&self, repo: &RepoSlug, path: &str) -> Result<RemoteFile, RemoteError> {
        let mut state = self.lock();
        if let Some(err) = state.record(CallKind::Read, repo, path, None) {
            return Err(err);
        }
        state
            .repos
            .get(repo)
            .and_then(|files| files.get(path))
            .map(|f| RemoteFile {
                path: path.to_string(),
                revision: f.revision.clone(),
                content: f.content.clone(),
            })
            .ok_or(RemoteError::NotFound)
    }

    fn write(
        &self,
        repo: &RepoSlug,
        path: &str,
        content: &[u8],
        revision: Option<&str>,
        message: &str,
    ) -> Result<String, RemoteError> {
        let mut state = self.lock();
        if let Some(err) = state.record(CallKind::Write, repo, path, Some(message)) {
            return Err(err);
        }
        let current = state
            .repos
            .get(repo)
            .and_then(|files| files.get(path))
            .map(|f| f.revision.clone());
        match (current.as_deref(), revision) {
            (None, None) => {}
            (Some(cur), Some(given)) if cur == given => {}
            (Some(cur), given) => {
                return Err(RemoteError::conflict(format!(
                    "{path} is at {cur}, write expected {}",
                    given.unwrap_or("no file")
                )))
            }
            (None, Some(given)) => {
                return Err(RemoteError::conflict(format!(
                    "{path} does not exist, write expected {given}"
                )))
            }
        }
        let new_revision = state.revision();
        state.repos.entry(repo.clone()).or_default().insert(
            path.to_string(),
            StoredFile {
                content: content.to_vec(),
                revision: new_revision.clone(),
            },
        );
        Ok(new_revision)
    }

    fn delete(
        &self,
        repo: &RepoSlug,
        path: &str,
        revision: &str,
        message: &str,
    ) -> Result<(), RemoteError> {
        let mut state = self.lock();
        if let Some(err) = state.record(CallKind::Delete, repo, path, Some(message)) {
            return Err(err);
        }
        let files = state.repos.get_mut(repo).ok_or(RemoteError::NotFound)?;
        let current = files.get(path).ok_or(RemoteError::NotFound)?;
        if current.revision != revision {
            return Err(RemoteError::conflict(format!(
                "{path} is at {}, delete expected {revision}",
                current.revision
            )));
        }
        files.remove(path);
        Ok(())
    }

    fn list_recursive(&self, repo: &RepoSlug, path: &str) -> Result<Vec<String>, RemoteError> {
        let mut state = self.lock();
        if let Some(err) = state.record(CallKind::List, repo, path, None) {
            return Err(err);
        }
        let prefix = path.trim_end_matches('/');
        Ok(state
            .repos
            .get(repo)
            .map(|files| {
                files
                    .keys()
                    .filter(|p| {
                        prefix.is_empty()
                            || p.as_str() == prefix
                            || p.strip_prefix(prefix).is_some_and(|r| r.starts_with('/'))
                    })
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}
