//! Runner: shared entrypoint used by the CLI.
//!
//! Loads the registry and template tree once, then reconciles repositories one
//! at a time. Sequential on purpose: the remote is a shared, rate-limited
//! resource, and one in-flight request at a time keeps clear of burst
//! throttling without an admission-control layer.

use std::path::PathBuf;

use reposync_core::{registry, OrgName, Registry, RepositoryTarget};
use reposync_templates::{DirTemplateSource, TemplateSet, TemplateSource, DEFAULT_TEMPLATE_ROOT};

use crate::engine::{Reconciler, RunOptions};
use crate::port::RemotePort;
use crate::report::RunSummary;
use crate::SyncError;

/// Scope for a sync pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncScope {
    /// Every repository in the registry, in registry order.
    All,
    /// A single named repository.
    Repository(String),
}

/// Where the run's inputs come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    pub registry_path: PathBuf,
    pub template_root: PathBuf,
    /// Overrides the registry's `org`.
    pub org: Option<String>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            registry_path: PathBuf::from(registry::DEFAULT_REGISTRY_FILE),
            template_root: PathBuf::from(DEFAULT_TEMPLATE_ROOT),
            org: None,
        }
    }
}

/// Validated inputs of a run. Read-only for its whole duration.
#[derive(Debug, Clone)]
pub struct LoadedInputs {
    pub org: OrgName,
    pub registry: Registry,
    pub templates: TemplateSet,
}

impl LoadedInputs {
    /// Repositories selected by `scope`.
    pub fn targets(&self, scope: &SyncScope) -> Result<Vec<&RepositoryTarget>, SyncError> {
        match scope {
            SyncScope::All => Ok(self.registry.repositories.iter().collect()),
            SyncScope::Repository(name) => self
                .registry
                .find(name)
                .map(|t| vec![t])
                .ok_or_else(|| SyncError::UnknownRepository { name: name.clone() }),
        }
    }
}

/// Load and validate registry, organization, and templates.
///
/// Every configuration problem surfaces here, before any remote call.
pub fn load_inputs(config: &SyncConfig) -> Result<LoadedInputs, SyncError> {
    let registry = registry::load_at(&config.registry_path)?;
    let org = registry::resolve_org(config.org.as_deref(), &registry)?;
    let templates = DirTemplateSource::new(&config.template_root).load()?;
    Ok(LoadedInputs {
        org,
        registry,
        templates,
    })
}

/// Reconcile every repository selected by `scope`.
///
/// Per-path failures are part of the returned summary; only an unknown
/// repository in `scope` is an error, and it is raised before any remote call.
pub fn run_loaded<P: RemotePort + ?Sized>(
    port: &P,
    inputs: &LoadedInputs,
    scope: &SyncScope,
    options: &RunOptions,
) -> Result<RunSummary, SyncError> {
    let targets = inputs.targets(scope)?;
    let engine = Reconciler::new(port, &inputs.templates, options);

    let mut reports = Vec::with_capacity(targets.len());
    for target in targets {
        let report = engine.reconcile(&inputs.org, target);
        let counts = report.counts();
        tracing::info!(
            "{}: {} created, {} updated, {} deleted, {} skipped, {} failed",
            report.repository,
            counts.created,
            counts.updated,
            counts.deleted,
            counts.skipped,
            counts.failed
        );
        reports.push(report);
    }
    Ok(RunSummary::new(reports))
}

/// Load inputs per `config`, then [`run_loaded`].
pub fn run<P: RemotePort + ?Sized>(
    port: &P,
    config: &SyncConfig,
    scope: &SyncScope,
    options: &RunOptions,
) -> Result<RunSummary, SyncError> {
    let inputs = load_inputs(config)?;
    run_loaded(port, &inputs, scope, options)
}
