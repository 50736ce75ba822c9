//! reposync — converge a fleet of repositories onto a template tree.
//!
//! # Usage
//!
//! ```text
//! reposync [--config FILE] [--templates DIR] [--org ORG] [--remote-dir DIR] [--api-url URL] [-v...]
//! reposync sync [--repo NAME] [--dry-run] [--json] [--source-label LABEL]
//! reposync diff <repo>
//! reposync repos list
//! reposync repos add <name> [--type LABEL]
//! reposync templates
//! ```

mod commands;
mod github;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{
    diff::DiffArgs, repos::ReposCommand, sync::SyncArgs, templates::TemplatesArgs, GlobalArgs,
};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "reposync",
    version,
    about = "Keep shared files in sync across an organization's repositories",
    long_about = None,
)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Converge every registered repository (or one) onto the template tree.
    Sync(SyncArgs),

    /// Show unified diffs of what sync would change in a repository.
    Diff(DiffArgs),

    /// Inspect or extend the repository registry.
    Repos {
        #[command(subcommand)]
        command: ReposCommand,
    },

    /// List the template collections and managed path prefixes.
    Templates(TemplatesArgs),
}

fn init_tracing(verbose: u8) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.global.verbose);
    match cli.command {
        Commands::Sync(args) => args.run(&cli.global),
        Commands::Diff(args) => args.run(&cli.global),
        Commands::Repos { command } => commands::repos::run(command, &cli.global),
        Commands::Templates(args) => args.run(&cli.global),
    }
}
