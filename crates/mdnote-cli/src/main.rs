//! mdnote CLI - Command-line interface for mdnote
//!
//! Provides commands for:
//! - Viewing sync status and running a sync
//! - Opening, initializing and cloning note repositories
//! - Staging, diffing and resolving individual notes
//! - Auto-sync and configuration settings
//! - Controlling the daemon

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use mdnote_core::config::AppConfig;
use tracing_subscriber::EnvFilter;

mod backend;
mod commands;
mod output;

use commands::{
    auto_sync::AutoSyncCommand,
    completions::CompletionsCommand,
    config::ConfigCommand,
    daemon::DaemonCommand,
    files::{AddCommand, DiffCommand, ResolveCommand},
    repo::{CloneCommand, InitCommand, OpenCommand, RemoteCommand},
    status::StatusCommand,
    sync::SyncCommand,
};
use output::OutputFormat;

#[derive(Debug, Parser)]
#[command(name = "mdnote", version, about = "Git-backed sync for markdown notes")]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    /// Verbose output (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Use alternate config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Show synchronization status
    Status(StatusCommand),
    /// Commit, pull and push the working directory
    Sync(SyncCommand),
    /// Initialize a repository in a directory
    Init(InitCommand),
    /// Make a directory the working directory
    Open(OpenCommand),
    /// Clone a remote repository and open it
    Clone(CloneCommand),
    /// Set the origin remote
    Remote(RemoteCommand),
    /// Stage a note
    Add(AddCommand),
    /// Show uncommitted changes of a note
    Diff(DiffCommand),
    /// Mark a conflicted note as resolved
    Resolve(ResolveCommand),
    /// Show or change the auto-sync schedule
    AutoSync(AutoSyncCommand),
    /// View and manage configuration
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Manage the mdnote background daemon
    #[command(subcommand)]
    Daemon(DaemonCommand),
    /// Generate shell completions
    Completions(CompletionsCommand),
}

/// Settings shared by every command
#[derive(Debug, Clone)]
pub struct Context {
    pub format: OutputFormat,
    pub config_path: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup tracing
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let ctx = Context {
        format: if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        },
        config_path: cli.config.unwrap_or_else(AppConfig::default_path),
    };

    match cli.command {
        Commands::Status(cmd) => cmd.execute(&ctx).await,
        Commands::Sync(cmd) => cmd.execute(&ctx).await,
        Commands::Init(cmd) => cmd.execute(&ctx).await,
        Commands::Open(cmd) => cmd.execute(&ctx).await,
        Commands::Clone(cmd) => cmd.execute(&ctx).await,
        Commands::Remote(cmd) => cmd.execute(&ctx).await,
        Commands::Add(cmd) => cmd.execute(&ctx).await,
        Commands::Diff(cmd) => cmd.execute(&ctx).await,
        Commands::Resolve(cmd) => cmd.execute(&ctx).await,
        Commands::AutoSync(cmd) => cmd.execute(&ctx).await,
        Commands::Config(cmd) => cmd.execute(&ctx).await,
        Commands::Daemon(cmd) => cmd.execute(&ctx).await,
        Commands::Completions(cmd) => cmd.execute(&ctx).await,
    }
}
