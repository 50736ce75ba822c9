//! Template tree loading — [`Collection`], [`TemplateSet`], and [`DirTemplateSource`].
//!
//! # Layout
//!
//! | Directory                | Collection                    |
//! |--------------------------|-------------------------------|
//! | `<root>/always-sync/`    | [`Collection::Always`]        |
//! | `<root>/initial-only/`   | [`Collection::InitialOnly`]   |
//! | `<root>/docs/`           | [`Collection::Docs`]          |
//! | `<root>/managed-paths.yaml` | managed prefixes (optional) |
//!
//! A missing collection directory is an empty collection.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{io_err, TemplateError};
use crate::managed::ManagedPathSet;
use crate::placeholder::substitute_repo_name;

/// Template root used when no `--templates` is given.
pub const DEFAULT_TEMPLATE_ROOT: &str = "repository-files";

// ---------------------------------------------------------------------------
// Collection
// ---------------------------------------------------------------------------

/// The three named template collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Collection {
    /// Must match remote content on every run.
    Always,
    /// Created once, never overwritten.
    InitialOnly,
    /// Applied only to documentation repositories.
    Docs,
}

impl Collection {
    /// All collections in processing order.
    pub fn all() -> &'static [Collection] {
        &[Collection::Always, Collection::InitialOnly, Collection::Docs]
    }

    /// Directory name under the template root.
    pub fn dir_name(&self) -> &'static str {
        match self {
            Collection::Always => "always-sync",
            Collection::InitialOnly => "initial-only",
            Collection::Docs => "docs",
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.dir_name())
    }
}

// ---------------------------------------------------------------------------
// TemplateFile / TemplateSet
// ---------------------------------------------------------------------------

/// One file of the desired state. Immutable for the duration of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateFile {
    /// `/`-separated path relative to the repository root.
    pub relative_path: String,
    pub content: Vec<u8>,
    pub collection: Collection,
}

impl TemplateFile {
    /// Content as it should be written to `repo_name`.
    ///
    /// Initial-only files get the repository-name token substituted; the other
    /// collections are written verbatim.
    pub fn content_for(&self, repo_name: &str) -> Cow<'_, [u8]> {
        match self.collection {
            Collection::InitialOnly => Cow::Owned(substitute_repo_name(&self.content, repo_name)),
            Collection::Always | Collection::Docs => Cow::Borrowed(&self.content),
        }
    }
}

/// The loaded desired state: three ordered collections plus the managed set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateSet {
    collections: BTreeMap<Collection, BTreeMap<String, TemplateFile>>,
    managed: ManagedPathSet,
}

impl TemplateSet {
    pub fn builder() -> TemplateSetBuilder {
        TemplateSetBuilder::default()
    }

    /// Files of `collection`, sorted by relative path.
    pub fn files(&self, collection: Collection) -> impl Iterator<Item = &TemplateFile> {
        self.collections
            .get(&collection)
            .into_iter()
            .flat_map(|files| files.values())
    }

    /// Whether `collection` has a file at `path`.
    pub fn contains(&self, collection: Collection, path: &str) -> bool {
        self.collections
            .get(&collection)
            .is_some_and(|files| files.contains_key(path))
    }

    pub fn len(&self, collection: Collection) -> usize {
        self.collections.get(&collection).map_or(0, BTreeMap::len)
    }

    pub fn is_empty(&self) -> bool {
        self.collections.values().all(BTreeMap::is_empty)
    }

    pub fn managed(&self) -> &ManagedPathSet {
        &self.managed
    }
}

/// Incremental construction of a [`TemplateSet`]; later inserts of the same
/// path within a collection replace earlier ones.
#[derive(Debug, Default)]
pub struct TemplateSetBuilder {
    set: TemplateSet,
}

impl TemplateSetBuilder {
    pub fn file(
        mut self,
        collection: Collection,
        relative_path: impl Into<String>,
        content: impl Into<Vec<u8>>,
    ) -> Self {
        let relative_path = normalize_relative_path(&relative_path.into());
        let file = TemplateFile {
            relative_path: relative_path.clone(),
            content: content.into(),
            collection,
        };
        self.set
            .collections
            .entry(collection)
            .or_default()
            .insert(relative_path, file);
        self
    }

    pub fn always(self, path: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        self.file(Collection::Always, path, content)
    }

    pub fn initial_only(self, path: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        self.file(Collection::InitialOnly, path, content)
    }

    pub fn docs(self, path: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        self.file(Collection::Docs, path, content)
    }

    pub fn managed(mut self, managed: ManagedPathSet) -> Self {
        self.set.managed = managed;
        self
    }

    pub fn build(self) -> TemplateSet {
        self.set
    }
}

// ---------------------------------------------------------------------------
// TemplateSource
// ---------------------------------------------------------------------------

/// Anything that can produce the desired state for a run.
pub trait TemplateSource {
    fn load(&self) -> Result<TemplateSet, TemplateError>;
}

/// Template source backed by a local directory tree.
#[derive(Debug, Clone)]
pub struct DirTemplateSource {
    root: PathBuf,
}

impl DirTemplateSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl TemplateSource for DirTemplateSource {
    fn load(&self) -> Result<TemplateSet, TemplateError> {
        if !self.root.is_dir() {
            return Err(TemplateError::RootNotFound {
                path: self.root.clone(),
            });
        }

        let mut builder = TemplateSet::builder().managed(ManagedPathSet::load_at(&self.root)?);
        for collection in Collection::all() {
            let dir = self.root.join(collection.dir_name());
            for (relative_path, path) in load_collection_files(&dir)? {
                let content = std::fs::read(&path).map_err(|e| io_err(&path, e))?;
                builder = builder.file(*collection, relative_path, content);
            }
        }
        Ok(builder.build())
    }
}

// ---------------------------------------------------------------------------
// Tree walking helpers
// ---------------------------------------------------------------------------

fn collect_files(dir: &Path, out: &mut Vec<PathBuf>) -> Result<(), TemplateError> {
    let entries = std::fs::read_dir(dir).map_err(|e| io_err(dir, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| io_err(dir, e))?;
        let path = entry.path();
        let meta = std::fs::metadata(&path).map_err(|e| io_err(&path, e))?;
        if meta.is_dir() {
            collect_files(&path, out)?;
        } else if meta.is_file() {
            out.push(path);
        }
    }
    Ok(())
}

/// `(relative_path, absolute_path)` for every file beneath `dir`.
fn load_collection_files(dir: &Path) -> Result<Vec<(String, PathBuf)>, TemplateError> {
    if !dir.exists() {
        return Ok(vec![]);
    }
    let mut files = Vec::new();
    collect_files(dir, &mut files)?;

    let mut out = Vec::with_capacity(files.len());
    for path in files {
        let rel = path.strip_prefix(dir).unwrap_or(path.as_path());
        let parts: Option<Vec<&str>> = rel.components().map(|c| c.as_os_str().to_str()).collect();
        let Some(parts) = parts else {
            return Err(TemplateError::NonUtf8Path { path });
        };
        out.push((parts.join("/"), path));
    }
    out.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(out)
}

fn normalize_relative_path(path: &str) -> String {
    path.replace('\\', "/")
        .trim_start_matches("./")
        .trim_start_matches('/')
        .to_string()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
