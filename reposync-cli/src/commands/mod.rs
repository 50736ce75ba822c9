pub mod diff;
pub mod repos;
pub mod sync;
pub mod templates;

use std::path::PathBuf;

use clap::Args;

use reposync_core::registry::DEFAULT_REGISTRY_FILE;
use reposync_sync::{pipeline::SyncConfig, LocalDirRemote, RemotePort};
use reposync_templates::DEFAULT_TEMPLATE_ROOT;

use crate::github::{GitHubRemote, DEFAULT_API_URL};

/// Options shared by every subcommand.
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Repository registry (JSON, or YAML for any other extension).
    #[arg(long, global = true, value_name = "FILE", default_value = DEFAULT_REGISTRY_FILE)]
    pub config: PathBuf,

    /// Template tree root.
    #[arg(long, global = true, value_name = "DIR", default_value = DEFAULT_TEMPLATE_ROOT)]
    pub templates: PathBuf,

    /// Organization owning the repositories; overrides the registry's `org`.
    #[arg(long, global = true)]
    pub org: Option<String>,

    /// Treat `<DIR>/<org>/<name>/` directories as the remote repositories.
    #[arg(long, global = true, value_name = "DIR", conflicts_with = "api_url")]
    pub remote_dir: Option<PathBuf>,

    /// GitHub REST API root.
    #[arg(long, global = true, value_name = "URL")]
    pub api_url: Option<String>,

    /// Increase log verbosity (-v info, -vv debug).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl GlobalArgs {
    pub fn sync_config(&self) -> SyncConfig {
        SyncConfig {
            registry_path: self.config.clone(),
            template_root: self.templates.clone(),
            org: self.org.clone(),
        }
    }

    /// The single transport used for this invocation.
    pub fn remote(&self) -> Box<dyn RemotePort> {
        match &self.remote_dir {
            Some(dir) => {
                tracing::info!("using local directory remote at {}", dir.display());
                Box::new(LocalDirRemote::new(dir.clone()))
            }
            None => {
                let api_url = self.api_url.as_deref().unwrap_or(DEFAULT_API_URL);
                tracing::info!("using GitHub API at {api_url}");
                Box::new(GitHubRemote::from_env(api_url))
            }
        }
    }
}
