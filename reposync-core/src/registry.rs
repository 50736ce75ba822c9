//! Repository registry persistence.
//!
//! # File format
//!
//! ```text
//! { "org": "acme", "repositories": [ { "name": "widgets", "type": "docs" } ] }
//! ```
//!
//! Files ending in `.json` are read and written as JSON; anything else as YAML.
//!
//! # API pattern
//!
//! Every function has two forms:
//! - `fn_at(path: &Path, …)` — explicit registry path; used in tests with `TempDir`
//! - `fn(…)` — uses [`DEFAULT_REGISTRY_FILE`] in the working directory, delegates to `_at`

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::error::{io_err, ConfigError};
use crate::types::{OrgName, Registry, RepoName, RepositoryTarget};

/// Registry file used when no `--config` is given.
pub const DEFAULT_REGISTRY_FILE: &str = "repo-config.json";

/// On-disk encoding of a registry file, chosen by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryFormat {
    Json,
    Yaml,
}

impl RegistryFormat {
    pub fn for_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => RegistryFormat::Json,
            _ => RegistryFormat::Yaml,
        }
    }
}

// ---------------------------------------------------------------------------
// 1. Load
// ---------------------------------------------------------------------------

/// Load and validate the registry at `path`.
///
/// Returns `ConfigError::RegistryNotFound` if absent, a parse error (with path
/// and line context) if malformed, and a validation error if any name is empty,
/// contains `/`, or is duplicated.
pub fn load_at(path: &Path) -> Result<Registry, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::RegistryNotFound {
            path: path.to_path_buf(),
        });
    }
    let contents = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
    let registry: Registry = match RegistryFormat::for_path(path) {
        RegistryFormat::Json => serde_json::from_str(&contents).map_err(|e| {
            ConfigError::ParseJson {
                path: path.to_path_buf(),
                source: e,
            }
        })?,
        RegistryFormat::Yaml => serde_yaml::from_str(&contents).map_err(|e| {
            ConfigError::ParseYaml {
                path: path.to_path_buf(),
                source: e,
            }
        })?,
    };
    validate(&registry, path)?;
    Ok(registry)
}

/// `load_at` convenience wrapper.
pub fn load() -> Result<Registry, ConfigError> {
    load_at(Path::new(DEFAULT_REGISTRY_FILE))
}

// ---------------------------------------------------------------------------
// 2. Validate
// ---------------------------------------------------------------------------

/// Check the registry invariants: names are non-empty, single path segments,
/// and unique. `path` is only used for error context.
pub fn validate(registry: &Registry, path: &Path) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();
    for (index, repo) in registry.repositories.iter().enumerate() {
        let name = repo.name.0.as_str();
        if name.trim().is_empty() {
            return Err(ConfigError::EmptyName {
                path: path.to_path_buf(),
                index,
            });
        }
        if name != name.trim() || name.contains('/') || name == "." || name == ".." {
            return Err(ConfigError::InvalidName {
                path: path.to_path_buf(),
                name: name.to_string(),
            });
        }
        if !seen.insert(name) {
            return Err(ConfigError::DuplicateName {
                path: path.to_path_buf(),
                name: name.to_string(),
            });
        }
    }
    Ok(())
}

/// Pick the organization: an explicit value wins over the registry's `org`.
pub fn resolve_org(explicit: Option<&str>, registry: &Registry) -> Result<OrgName, ConfigError> {
    match explicit {
        Some(org) if !org.trim().is_empty() => Ok(OrgName::from(org.trim())),
        _ => registry
            .org
            .as_ref()
            .filter(|o| !o.0.trim().is_empty())
            .cloned()
            .ok_or(ConfigError::MissingOrg),
    }
}

// ---------------------------------------------------------------------------
// 3. Save (atomic)
// ---------------------------------------------------------------------------

/// Atomically save the registry to `path`.
///
/// Write flow: validate → serialize → `<file>.tmp` sibling → `rename`.
/// The `.tmp` file lives in the same directory as the target, so the rename
/// never crosses filesystems.
pub fn save_at(path: &Path, registry: &Registry) -> Result<(), ConfigError> {
    validate(registry, path)?;
    let serialized = match RegistryFormat::for_path(path) {
        RegistryFormat::Json => {
            let mut s = serde_json::to_string_pretty(registry)?;
            s.push('\n');
            s
        }
        RegistryFormat::Yaml => serde_yaml::to_string(registry)?,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
    }
    let tmp_path = tmp_path_for(path);
    std::fs::write(&tmp_path, serialized).map_err(|e| io_err(&tmp_path, e))?;
    if let Err(e) = std::fs::rename(&tmp_path, path) {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(io_err(path, e));
    }
    Ok(())
}

/// `save_at` convenience wrapper.
pub fn save(registry: &Registry) -> Result<(), ConfigError> {
    save_at(Path::new(DEFAULT_REGISTRY_FILE), registry)
}

// ---------------------------------------------------------------------------
// 4. Add repository
// ---------------------------------------------------------------------------

/// Register `name` in the registry at `path`, creating the file if needed.
///
/// Idempotent: if the name is already present, returns the existing entry
/// unchanged (its type is not rewritten). Labels of other entries are
/// written back exactly as loaded.
pub fn add_repository_at(
    path: &Path,
    name: RepoName,
    label: Option<&str>,
) -> Result<RepositoryTarget, ConfigError> {
    let mut registry = if path.exists() {
        load_at(path)?
    } else {
        Registry::default()
    };

    if let Some(existing) = registry.find(&name.0) {
        return Ok(existing.clone());
    }

    let target = RepositoryTarget {
        name,
        label: label.map(str::to_string),
    };
    registry.repositories.push(target.clone());
    save_at(path, &registry)?;
    Ok(target)
}

/// `add_repository_at` convenience wrapper.
pub fn add_repository(name: RepoName, label: Option<&str>) -> Result<RepositoryTarget, ConfigError> {
    add_repository_at(Path::new(DEFAULT_REGISTRY_FILE), name, label)
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

fn tmp_path_for(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| DEFAULT_REGISTRY_FILE.to_string());
    path.with_file_name(format!("{file_name}.tmp"))
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
