//! `reposync diff <repo>` — show unified diffs for what sync would change.

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;

use reposync_sync::{
    diff_repository,
    pipeline::{self, SyncScope},
    RunOptions,
};

use super::GlobalArgs;

/// Arguments for `reposync diff`.
#[derive(Args, Debug)]
pub struct DiffArgs {
    /// Registered repository name.
    pub repo: String,
}

impl DiffArgs {
    pub fn run(self, global: &GlobalArgs) -> Result<()> {
        let inputs =
            pipeline::load_inputs(&global.sync_config()).context("failed to load configuration")?;
        let targets = inputs.targets(&SyncScope::Repository(self.repo.clone()))?;
        let Some(target) = targets.first() else {
            bail!("repository '{}' is not in the registry", self.repo);
        };

        let remote = global.remote();
        let result = diff_repository(
            remote.as_ref(),
            &inputs.org,
            target,
            &inputs.templates,
            &RunOptions::default(),
        );

        if result.is_empty() {
            println!("No differences for '{}'.", result.repository);
            return Ok(());
        }

        for diff in &result.diffs {
            print!("{}", diff.unified_diff);
            if !diff.unified_diff.ends_with('\n') {
                println!();
            }
        }
        for path in &result.deletions {
            println!("{} {path}", "deleted:".red());
        }
        for (path, error) in &result.blocked {
            eprintln!("{} {path}: {error}", "error:".red().bold());
        }

        if !result.blocked.is_empty() {
            bail!(
                "could not read {} path(s) in {}",
                result.blocked.len(),
                result.repository
            );
        }
        Ok(())
    }
}
