//! Repository setup commands
//!
//! - `init [path]`           - Initialize a repository (defaults to the current directory)
//! - `open <path>`           - Make a directory the working directory
//! - `clone <url> <parent>`  - Clone into `<parent>` and open the clone
//! - `remote <url>`          - Point `origin` at a URL

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Args;
use tracing::info;

use crate::backend::{absolute, Backend};
use crate::output::get_formatter;
use crate::Context;

/// Initialize a repository
#[derive(Debug, Args)]
pub struct InitCommand {
    /// Directory to initialize
    pub path: Option<PathBuf>,
}

impl InitCommand {
    pub async fn execute(&self, ctx: &Context) -> Result<()> {
        let formatter = get_formatter(ctx.format.is_json());
        let path = absolute(self.path.as_deref().unwrap_or(Path::new(".")))?;

        let backend = Backend::connect(&ctx.config_path, ctx.format).await?;
        info!(path = %path.display(), "Initializing repository");
        backend.init_repo(&path).await?;

        if ctx.format.is_json() {
            formatter.print_json(&serde_json::json!({
                "action": "init",
                "success": true,
                "path": path.display().to_string(),
            }));
        } else {
            formatter.success(&format!("Initialized repository in {}", path.display()));
            formatter.info(&format!(
                "Run 'mdnote open {}' to sync it.",
                path.display()
            ));
        }
        Ok(())
    }
}

/// Switch the working directory
#[derive(Debug, Args)]
pub struct OpenCommand {
    /// Directory holding the notes
    pub path: PathBuf,
}

impl OpenCommand {
    pub async fn execute(&self, ctx: &Context) -> Result<()> {
        let formatter = get_formatter(ctx.format.is_json());
        let path = absolute(&self.path)?;

        let backend = Backend::connect(&ctx.config_path, ctx.format).await?;
        let status = backend.open_project(&path).await?;

        if ctx.format.is_json() {
            formatter.print_json(&serde_json::json!({
                "action": "open",
                "path": path.display().to_string(),
                "status": status,
            }));
        } else {
            formatter.success(&format!("Working directory is now {}", path.display()));
            formatter.info(&format!("State: {}", status.state));
        }
        Ok(())
    }
}

/// Clone a remote repository
#[derive(Debug, Args)]
pub struct CloneCommand {
    /// Remote URL
    pub url: String,
    /// Directory the clone is created in
    pub parent: PathBuf,
}

impl CloneCommand {
    pub async fn execute(&self, ctx: &Context) -> Result<()> {
        let formatter = get_formatter(ctx.format.is_json());
        let parent = absolute(&self.parent)?;

        let backend = Backend::connect(&ctx.config_path, ctx.format).await?;
        formatter.info(&format!("Cloning {}...", self.url));
        let path = backend.clone_repository(&self.url, &parent).await?;

        if ctx.format.is_json() {
            formatter.print_json(&serde_json::json!({
                "action": "clone",
                "url": self.url,
                "path": path.display().to_string(),
            }));
        } else {
            formatter.success(&format!("Cloned into {}", path.display()));
        }
        Ok(())
    }
}

/// Set the origin remote
#[derive(Debug, Args)]
pub struct RemoteCommand {
    /// Remote URL
    pub url: String,
}

impl RemoteCommand {
    pub async fn execute(&self, ctx: &Context) -> Result<()> {
        let formatter = get_formatter(ctx.format.is_json());

        let backend = Backend::connect(&ctx.config_path, ctx.format).await?;
        backend.set_remote(&self.url).await?;

        if ctx.format.is_json() {
            formatter.print_json(&serde_json::json!({
                "action": "remote",
                "url": self.url,
                "success": true,
            }));
        } else {
            formatter.success(&format!("origin set to {}", self.url));
        }
        Ok(())
    }
}
