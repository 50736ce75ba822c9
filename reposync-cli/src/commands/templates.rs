//! `reposync templates` — show the desired state loaded from the template tree.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use reposync_templates::{Collection, DirTemplateSource, TemplateSource};

use super::GlobalArgs;

/// Arguments for `reposync templates`.
#[derive(Args, Debug)]
pub struct TemplatesArgs {}

#[derive(Tabled)]
struct TemplateRow {
    #[tabled(rename = "collection")]
    collection: String,
    #[tabled(rename = "path")]
    path: String,
    #[tabled(rename = "bytes")]
    bytes: usize,
}

impl TemplatesArgs {
    pub fn run(self, global: &GlobalArgs) -> Result<()> {
        let source = DirTemplateSource::new(&global.templates);
        let set = source
            .load()
            .with_context(|| format!("failed to load templates from {}", source.root().display()))?;

        let rows: Vec<TemplateRow> = Collection::all()
            .iter()
            .flat_map(|c| set.files(*c))
            .map(|f| TemplateRow {
                collection: f.collection.to_string(),
                path: f.relative_path.clone(),
                bytes: f.content.len(),
            })
            .collect();

        if rows.is_empty() {
            println!("No template files under {}.", source.root().display());
        } else {
            println!("{}", Table::new(rows).with(Style::rounded()));
        }

        println!("\n{}", "Managed prefixes (stale files here are deleted):".bold());
        for prefix in set.managed().prefixes() {
            println!("  {prefix}");
        }
        Ok(())
    }
}
