//! Commitlog CLI - command-line interface for commit history ingestion.

mod commands;
mod config;
mod progress;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use console::Term;
use tracing_subscriber::EnvFilter;

use crate::commands::authors::OutputFormat;

#[derive(Parser)]
#[command(name = "commitlog")]
#[command(version)]
#[command(about = "Ingest GitHub commit history and group it by author")]
#[command(
    long_about = "Commitlog fetches the commit history of a GitHub repository, stores \
contributors, repositories and commits in a local database, and reports commits \
grouped by author and date. Re-ingesting the same history never duplicates rows."
)]
#[command(after_long_help = r#"EXAMPLES
    Ingest the full history of a repository:
        $ commitlog sync rust-lang rust

    Ingest one author's commits from March 2024:
        $ commitlog sync rust-lang rust --author alice --since 2024-03-01 --until 2024-04-01

    Ingest and print commits grouped by author and date:
        $ commitlog authors --owner rust-lang --repository rust

    Report from the local database without contacting GitHub:
        $ commitlog authors --owner rust-lang --repository rust --offline

    Generate shell completions:
        $ commitlog completions bash > ~/.local/share/bash-completion/completions/commitlog

CONFIGURATION
    Commitlog reads configuration from:
      1. ~/.config/commitlog/config.toml (or $XDG_CONFIG_HOME/commitlog/config.toml)
      2. ./commitlog.toml
      3. Environment variables (COMMITLOG_* prefix, e.g., COMMITLOG_GITHUB_TOKEN)
      4. .env file in current directory

ENVIRONMENT VARIABLES
    COMMITLOG_DATABASE_URL     Database connection string (default: ~/.local/state/commitlog/commitlog.db)
    COMMITLOG_GITHUB_TOKEN     GitHub personal access token
    COMMITLOG_GITHUB_URL       GitHub API root (default: https://api.github.com)
    COMMITLOG_GITHUB_TIMEOUT   Per-request timeout in seconds (default: 30)
"#)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Database migration commands
    Migrate {
        #[command(subcommand)]
        action: MigrateAction,
    },
    /// Fetch a repository's commits and store them
    Sync {
        /// Repository owner (user or organization)
        owner: String,
        /// Repository name
        repository: String,
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Print commits grouped by author and date
    Authors {
        /// Repository owner (user or organization)
        #[arg(long)]
        owner: Option<String>,
        /// Repository name
        #[arg(long)]
        repository: Option<String>,
        #[command(flatten)]
        filter: FilterArgs,
        /// Report from the local database only
        #[arg(long)]
        offline: bool,
        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
        output: OutputFormat,
    },
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
    /// Generate man pages
    Man {
        /// Output directory for man pages (prints to stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Narrowing shared by `sync` and `authors`.
#[derive(clap::Args, Clone, Debug, Default)]
struct FilterArgs {
    /// Only commits by this author (GitHub login or email)
    #[arg(long)]
    author: Option<String>,
    /// Only commits on or after this date (YYYY-MM-DD)
    #[arg(long)]
    since: Option<String>,
    /// Only commits before this date (YYYY-MM-DD)
    #[arg(long)]
    until: Option<String>,
}

#[derive(Subcommand, Clone, Copy)]
enum MigrateAction {
    /// Apply all pending migrations
    Up,
    /// Rollback the last migration
    Down,
    /// Show migration status
    Status,
    /// Drop all tables and reapply migrations
    Fresh,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // Structured logging only when not attached to a terminal
    if !Term::stdout().is_term() {
        let env_filter = match EnvFilter::try_from_default_env() {
            Ok(filter) => filter,
            Err(_) => EnvFilter::new("commitlog=info,commitlog_cli=info"),
        };

        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .init();
    }

    let config = config::Config::load();

    let cli = Cli::parse();

    // Handle commands that don't require database access first
    match &cli.command {
        Commands::Completions { shell } => {
            commands::meta::handle_completions(*shell)?;
            return Ok(());
        }
        Commands::Man { output } => {
            commands::meta::handle_man(output.clone())?;
            return Ok(());
        }
        _ => {}
    }

    let database_url = config
        .database_url()
        .ok_or("Could not determine a database URL; set COMMITLOG_DATABASE_URL")?;

    ensure_sqlite_parent_dir(&database_url)?;

    match cli.command {
        Commands::Migrate { action } => {
            commands::migrate::handle_migrate(action, &database_url).await?;
        }
        Commands::Sync {
            owner,
            repository,
            filter,
        } => {
            commands::sync::handle_sync(owner, repository, filter, &config, &database_url).await?;
        }
        Commands::Authors {
            owner,
            repository,
            filter,
            offline,
            output,
        } => {
            let args = commands::authors::AuthorsArgs {
                owner,
                repository,
                filter,
                offline,
                output,
            };
            commands::authors::handle_authors(args, &config, &database_url).await?;
        }
        Commands::Completions { .. } | Commands::Man { .. } => {}
    }

    Ok(())
}

/// Create the directory holding a file-backed SQLite database.
fn ensure_sqlite_parent_dir(database_url: &str) -> std::io::Result<()> {
    let Some(db_path) = database_url.strip_prefix("sqlite://") else {
        return Ok(());
    };
    // Strip query parameters (e.g., ?mode=rwc) before path operations
    let db_path = db_path.split('?').next().unwrap_or(db_path);
    let db_path = std::path::Path::new(db_path);

    if db_path.is_relative() && !db_path.as_os_str().is_empty() {
        tracing::warn!(
            "Database path '{}' is relative - behavior depends on current directory. \
             Consider using an absolute path.",
            db_path.display()
        );
    }

    if let Some(parent) = db_path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}
