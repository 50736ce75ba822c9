//! `reposync sync` — converge repositories onto the template tree.

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use reposync_sync::{
    pipeline::{self, SyncScope},
    plan::DEFAULT_SOURCE_LABEL,
    Action, PathOutcome, RunOptions, RunReport, RunSummary,
};

use super::GlobalArgs;

/// Arguments for `reposync sync`.
#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Sync only this repository (default: every registered repository).
    #[arg(long, value_name = "NAME")]
    pub repo: Option<String>,

    /// Read remote state and report what would change without writing.
    #[arg(long)]
    pub dry_run: bool,

    /// Emit the run summary as JSON.
    #[arg(long)]
    pub json: bool,

    /// Name used in commit messages ("sync <path> from <label>").
    #[arg(long, value_name = "LABEL", default_value = DEFAULT_SOURCE_LABEL)]
    pub source_label: String,
}

impl SyncArgs {
    pub fn run(self, global: &GlobalArgs) -> Result<()> {
        let config = global.sync_config();
        let inputs = pipeline::load_inputs(&config).with_context(|| {
            format!(
                "failed to load {} and {}",
                config.registry_path.display(),
                config.template_root.display()
            )
        })?;
        let scope = match self.repo {
            Some(name) => SyncScope::Repository(name),
            None => SyncScope::All,
        };
        let options = RunOptions {
            dry_run: self.dry_run,
            source_label: self.source_label,
        };

        let remote = global.remote();
        let summary = pipeline::run_loaded(remote.as_ref(), &inputs, &scope, &options)?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&summary)?);
        } else {
            print_summary(&summary, options.dry_run);
        }

        if summary.has_failures() {
            bail!(
                "{} path(s) failed; re-run sync after resolving the errors above",
                summary.totals.failed
            );
        }
        Ok(())
    }
}

#[derive(Tabled)]
struct SummaryRow {
    #[tabled(rename = "repository")]
    repository: String,
    #[tabled(rename = "created")]
    created: usize,
    #[tabled(rename = "updated")]
    updated: usize,
    #[tabled(rename = "deleted")]
    deleted: usize,
    #[tabled(rename = "unchanged")]
    skipped: usize,
    #[tabled(rename = "failed")]
    failed: usize,
}

impl SummaryRow {
    fn new(report: &RunReport, dry_run: bool) -> Self {
        let c = report.counts();
        let (created, updated, deleted) = if dry_run {
            (c.would_create, c.would_update, c.would_delete)
        } else {
            (c.created, c.updated, c.deleted)
        };
        Self {
            repository: report.repository.clone(),
            created,
            updated,
            deleted,
            skipped: c.skipped,
            failed: c.failed,
        }
    }
}

fn print_summary(summary: &RunSummary, dry_run: bool) {
    let prefix = if dry_run { "[dry-run] " } else { "" };

    if summary.reports.is_empty() {
        println!("No repositories registered. Run `reposync repos add <name>` first.");
        return;
    }

    for report in &summary.reports {
        let changes: Vec<&PathOutcome> = report
            .outcomes
            .iter()
            .filter(|o| !matches!(o.action, Action::Skipped { .. }))
            .collect();
        if changes.is_empty() {
            println!("{prefix}✓ {} — up to date", report.repository);
            continue;
        }
        println!("{prefix}{} ({})", report.repository.bold(), report.kind);
        for outcome in changes {
            println!("  {}", format_outcome(outcome));
        }
    }

    let rows: Vec<SummaryRow> = summary
        .reports
        .iter()
        .map(|r| SummaryRow::new(r, dry_run))
        .collect();
    println!();
    println!("{}", Table::new(rows).with(Style::rounded()));
}

fn format_outcome(outcome: &PathOutcome) -> String {
    let path = if outcome.path.is_empty() {
        "(repository listing)"
    } else {
        outcome.path.as_str()
    };
    match &outcome.action {
        Action::Created => format!("{} {path}", "+".green()),
        Action::Updated => format!("{} {path}", "~".yellow()),
        Action::Deleted => format!("{} {path}", "-".red()),
        Action::WouldCreate => format!("{} {path} (would create)", "+".green()),
        Action::WouldUpdate => format!("{} {path} (would update)", "~".yellow()),
        Action::WouldDelete => format!("{} {path} (would delete)", "-".red()),
        Action::Skipped { reason } => format!("{} {path} ({reason})", "·".dimmed()),
        Action::Failed { error, .. } => {
            format!("{} {path} [{}]: {}", "✗".red().bold(), outcome.pass, error.red())
        }
    }
}
