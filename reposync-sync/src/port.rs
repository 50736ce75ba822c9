//! Remote Repository Port — the capability the engine converges through.
//!
//! One blocking request/response per call; the engine never has more than one
//! call in flight. Retry policy, if any, belongs to the adapter.

use reposync_core::RepoSlug;

use crate::error::RemoteError;

/// Point-in-time state of one remote file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFile {
    pub path: String,
    /// Opaque token identifying this version; required to update or delete.
    pub revision: String,
    /// Decoded file content.
    pub content: Vec<u8>,
}

/// Read / write / delete / list access to a single remote repository.
pub trait RemotePort {
    /// Current content and revision of `path`, or [`RemoteError::NotFound`].
    fn read(&self, repo: &RepoSlug, path: &str) -> Result<RemoteFile, RemoteError>;

    /// Create (`revision == None`) or replace `path`. Returns the new revision.
    fn write(
        &self,
        repo: &RepoSlug,
        path: &str,
        content: &[u8],
        revision: Option<&str>,
        message: &str,
    ) -> Result<String, RemoteError>;

    /// Delete `path`, which must currently be at `revision`.
    fn delete(
        &self,
        repo: &RepoSlug,
        path: &str,
        revision: &str,
        message: &str,
    ) -> Result<(), RemoteError>;

    /// Every file path beneath `path` (`""` for the repository root).
    fn list_recursive(&self, repo: &RepoSlug, path: &str) -> Result<Vec<String>, RemoteError>;

    /// Whether `path` exists. `NotFound` maps to `Ok(false)`.
    fn exists(&self, repo: &RepoSlug, path: &str) -> Result<bool, RemoteError> {
        match self.read(repo, path) {
            Ok(_) => Ok(true),
            Err(RemoteError::NotFound) => Ok(false),
            Err(err) => Err(err),
        }
    }
}
