//! Managed path prefixes: the territory the sync system may delete from.

use std::path::Path;

use serde::Deserialize;

use crate::error::TemplateError;

/// File (at the template root) that overrides [`DEFAULT_MANAGED_PREFIXES`].
pub const MANAGED_PATHS_FILE: &str = "managed-paths.yaml";

/// Prefixes used when the template tree carries no `managed-paths.yaml`.
pub const DEFAULT_MANAGED_PREFIXES: &[&str] = &[".cursor/rules/", ".github/workflows/"];

#[derive(Debug, Deserialize)]
struct ManagedPathsFile {
    #[serde(default)]
    prefixes: Vec<String>,
}

/// Set of path prefixes the sync system considers itself authoritative over.
///
/// A prefix ending in `/` matches everything beneath that directory. Any other
/// prefix matches the exact path, or everything beneath it as a directory
/// (`docs` matches `docs` and `docs/a.md`, never `docs-old/a.md`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagedPathSet {
    prefixes: Vec<String>,
}

impl ManagedPathSet {
    /// Build a set from raw prefixes. Leading `/` and `./` are stripped;
    /// a prefix that is empty afterwards is rejected.
    pub fn new<I, S>(prefixes: I) -> Result<Self, TemplateError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut out = Vec::new();
        for raw in prefixes {
            let raw = raw.as_ref();
            let trimmed = raw.trim().trim_start_matches("./").trim_start_matches('/');
            if trimmed.is_empty() {
                return Err(TemplateError::InvalidPrefix {
                    prefix: raw.to_string(),
                });
            }
            if !out.iter().any(|p: &String| p == trimmed) {
                out.push(trimmed.to_string());
            }
        }
        Ok(Self { prefixes: out })
    }

    /// Load `<root>/managed-paths.yaml`, or the defaults when it is absent.
    pub fn load_at(root: &Path) -> Result<Self, TemplateError> {
        let path = root.join(MANAGED_PATHS_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents =
            std::fs::read_to_string(&path).map_err(|e| crate::error::io_err(&path, e))?;
        let file: ManagedPathsFile = serde_yaml::from_str(&contents)
            .map_err(|e| TemplateError::ManagedPaths { path, source: e })?;
        Self::new(file.prefixes)
    }

    pub fn prefixes(&self) -> &[String] {
        &self.prefixes
    }

    /// Whether `path` lies in managed territory.
    pub fn matches(&self, path: &str) -> bool {
        self.prefixes.iter().any(|prefix| {
            if prefix.ends_with('/') {
                path.starts_with(prefix.as_str())
            } else {
                path == prefix
                    || path
                        .strip_prefix(prefix.as_str())
                        .is_some_and(|rest| rest.starts_with('/'))
            }
        })
    }
}

impl Default for ManagedPathSet {
    fn default() -> Self {
        Self {
            prefixes: DEFAULT_MANAGED_PREFIXES.iter().map(|p| p.to_string()).collect(),
        }
    }
}
