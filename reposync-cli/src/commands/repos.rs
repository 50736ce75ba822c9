//! `reposync repos list` and `reposync repos add <name>`

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use tabled::{settings::Style, Table, Tabled};

use reposync_core::{registry, RepoName};

use super::GlobalArgs;

/// Inspect or extend the repository registry.
#[derive(Subcommand, Debug)]
pub enum ReposCommand {
    /// List registered repositories in processing order.
    List,

    /// Register a repository (creates the registry file if needed).
    Add(AddArgs),
}

#[derive(Args, Debug)]
pub struct AddArgs {
    /// Repository name within the organization.
    pub name: String,

    /// Repository type label; "docs" enables the docs collection.
    #[arg(long = "type", short = 't', value_name = "LABEL")]
    pub label: Option<String>,
}

#[derive(Tabled)]
struct RepoRow {
    #[tabled(rename = "repository")]
    name: String,
    #[tabled(rename = "type")]
    label: String,
    #[tabled(rename = "synced as")]
    kind: String,
}

pub fn run(cmd: ReposCommand, global: &GlobalArgs) -> Result<()> {
    match cmd {
        ReposCommand::List => list(global),
        ReposCommand::Add(args) => add(args, global),
    }
}

fn list(global: &GlobalArgs) -> Result<()> {
    let registry = registry::load_at(&global.config)
        .with_context(|| format!("failed to load {}", global.config.display()))?;

    if registry.repositories.is_empty() {
        println!("No repositories registered.");
        println!("Run: reposync repos add <name>");
        return Ok(());
    }

    match global.org.as_deref().or(registry.org.as_ref().map(|o| o.0.as_str())) {
        Some(org) => println!("Organization: {org}"),
        None => println!("Organization: (not set; pass --org)"),
    }
    let rows: Vec<RepoRow> = registry
        .repositories
        .iter()
        .map(|r| RepoRow {
            name: r.name.to_string(),
            label: r.label.clone().unwrap_or_else(|| "-".to_string()),
            kind: r.kind().to_string(),
        })
        .collect();
    println!("{}", Table::new(rows).with(Style::rounded()));
    Ok(())
}

fn add(args: AddArgs, global: &GlobalArgs) -> Result<()> {
    let target = registry::add_repository_at(
        &global.config,
        RepoName::from(args.name.clone()),
        args.label.as_deref(),
    )
    .with_context(|| format!("failed to add '{}' to {}", args.name, global.config.display()))?;

    let kind = target.kind().to_string();
    println!(
        "✓ Registered '{}' ({})",
        target.name,
        target.label.as_deref().unwrap_or(&kind)
    );
    Ok(())
}
