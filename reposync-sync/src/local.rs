//! Local-directory [`RemotePort`]: repository `org/name` is `<root>/org/name/`.
//!
//! Revision markers are SHA-256 hex digests of file content. Writes use the
//! `.reposync.tmp` + rename protocol so a crashed run never leaves a
//! half-written file behind.

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use sha2::{Digest, Sha256};

use reposync_core::RepoSlug;

use crate::error::RemoteError;
use crate::port::{RemoteFile, RemotePort};

/// Directory names never reported by [`LocalDirRemote::list_recursive`].
const IGNORED_DIRS: &[&str] = &[".git"];

/// Repositories mirrored as plain directories.
#[derive(Debug, Clone)]
pub struct LocalDirRemote {
    root: PathBuf,
}

impl LocalDirRemote {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// `<root>/<org>/<name>`
    pub fn repo_dir(&self, repo: &RepoSlug) -> PathBuf {
        self.root.join(&repo.org.0).join(&repo.name.0)
    }

    fn file_path(&self, repo: &RepoSlug, path: &str) -> Result<PathBuf, RemoteError> {
        let rel = Path::new(path);
        let is_plain = !path.is_empty()
            && rel
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !is_plain {
            return Err(RemoteError::protocol(format!("refusing path '{path}'")));
        }
        Ok(self.repo_dir(repo).join(rel))
    }
}

/// SHA-256 hex digest used as the revision marker.
pub fn content_revision(content: &[u8]) -> String {
    let mut h = Sha256::new();
    h.update(content);
    hex::encode(h.finalize())
}

fn io_to_remote(path: &Path, err: std::io::Error) -> RemoteError {
    if err.kind() == ErrorKind::NotFound {
        RemoteError::NotFound
    } else {
        RemoteError::transient(format!("{}: {err}", path.display()))
    }
}

fn current_revision(path: &Path) -> Result<Option<String>, RemoteError> {
    match std::fs::read(path) {
        Ok(content) => Ok(Some(content_revision(&content))),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
        Err(err) => Err(io_to_remote(path, err)),
    }
}

fn collect_files(dir: &Path, base: &Path, out: &mut Vec<String>) -> Result<(), RemoteError> {
    let entries = std::fs::read_dir(dir).map_err(|e| io_to_remote(dir, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| io_to_remote(dir, e))?;
        let path = entry.path();
        let file_type = entry.file_type().map_err(|e| io_to_remote(&path, e))?;
        if file_type.is_dir() {
            let name = entry.file_name();
            if IGNORED_DIRS.iter().any(|d| name == *d) {
                continue;
            }
            collect_files(&path, base, out)?;
        } else if file_type.is_file() {
            let rel = path.strip_prefix(base).unwrap_or(path.as_path());
            let parts: Option<Vec<&str>> =
                rel.components().map(|c| c.as_os_str().to_str()).collect();
            match parts {
                Some(parts) => out.push(parts.join("/")),
                None => tracing::warn!("skipping non-UTF-8 path {}", path.display()),
            }
        }
    }
    Ok(())
}

/// Remove now-empty directories between `path`'s parent and `stop`.
fn prune_empty_parents(path: &Path, stop: &Path) {
    let mut dir = path.parent();
    while let Some(d) = dir {
        if d == stop || !d.starts_with(stop) {
            break;
        }
        if std::fs::remove_dir(d).is_err() {
            break;
        }
        dir = d.parent();
    }
}

impl RemotePort for LocalDirRemote {
    fn read(&self, repo: &RepoSlug, path: &str) -> Result<RemoteFile, RemoteError> {
        let file = self.file_path(repo, path)?;
        if file.is_dir() {
            return Err(RemoteError::protocol(format!("{path} is a directory")));
        }
        let content = std::fs::read(&file).map_err(|e| io_to_remote(&file, e))?;
        Ok(RemoteFile {
            path: path.to_string(),
            revision: content_revision(&content),
            content,
        })
    }

    fn write(
        &self,
        repo: &RepoSlug,
        path: &str,
        content: &[u8],
        revision: Option<&str>,
        message: &str,
    ) -> Result<String, RemoteError> {
        let file = self.file_path(repo, path)?;
        match (current_revision(&file)?, revision) {
            (None, None) => {}
            (Some(cur), Some(given)) if cur == given => {}
            (Some(_), None) => {
                return Err(RemoteError::conflict(format!("{path} already exists")));
            }
            (Some(_), Some(_)) => {
                return Err(RemoteError::conflict(format!("{path} changed since it was read")));
            }
            (None, Some(_)) => {
                return Err(RemoteError::conflict(format!("{path} was removed since it was read")));
            }
        }

        if let Some(parent) = file.parent() {
            std::fs::create_dir_all(parent).map_err(|e| io_to_remote(parent, e))?;
        }
        let tmp = PathBuf::from(format!("{}.reposync.tmp", file.display()));
        std::fs::write(&tmp, content).map_err(|e| io_to_remote(&tmp, e))?;
        if let Err(e) = std::fs::rename(&tmp, &file) {
            let _ = std::fs::remove_file(&tmp);
            return Err(io_to_remote(&file, e));
        }

        tracing::debug!("{repo}: wrote {path} ({message})");
        Ok(content_revision(content))
    }

    fn delete(
        &self,
        repo: &RepoSlug,
        path: &str,
        revision: &str,
        message: &str,
    ) -> Result<(), RemoteError> {
        let file = self.file_path(repo, path)?;
        match current_revision(&file)? {
            None => return Err(RemoteError::NotFound),
            Some(cur) if cur != revision => {
                return Err(RemoteError::conflict(format!("{path} changed since it was read")));
            }
            Some(_) => {}
        }
        std::fs::remove_file(&file).map_err(|e| io_to_remote(&file, e))?;
        prune_empty_parents(&file, &self.repo_dir(repo));

        tracing::debug!("{repo}: deleted {path} ({message})");
        Ok(())
    }

    fn list_recursive(&self, repo: &RepoSlug, path: &str) -> Result<Vec<String>, RemoteError> {
        let base = self.repo_dir(repo);
        let start = if path.trim_matches('/').is_empty() {
            base.clone()
        } else {
            self.file_path(repo, path.trim_matches('/'))?
        };
        if !start.exists() {
            return Ok(vec![]);
        }
        let mut out = Vec::new();
        collect_files(&start, &base, &mut out)?;
        out.sort();
        Ok(out)
    }
}
