//! Per-note commands: `add`, `diff`, `resolve`

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use crate::backend::{absolute, Backend};
use crate::output::get_formatter;
use crate::Context;

/// Stage a note
#[derive(Debug, Args)]
pub struct AddCommand {
    pub path: PathBuf,
}

impl AddCommand {
    pub async fn execute(&self, ctx: &Context) -> Result<()> {
        let formatter = get_formatter(ctx.format.is_json());
        let path = absolute(&self.path)?;

        let backend = Backend::connect(&ctx.config_path, ctx.format).await?;
        backend.add_file(&path).await?;

        if ctx.format.is_json() {
            formatter.print_json(&serde_json::json!({
                "action": "add",
                "path": path.display().to_string(),
                "success": true,
            }));
        } else {
            formatter.success(&format!("Staged {}", path.display()));
        }
        Ok(())
    }
}

/// Show the uncommitted diff of a note
#[derive(Debug, Args)]
pub struct DiffCommand {
    pub path: PathBuf,
}

impl DiffCommand {
    pub async fn execute(&self, ctx: &Context) -> Result<()> {
        let formatter = get_formatter(ctx.format.is_json());
        let path = absolute(&self.path)?;

        let backend = Backend::connect(&ctx.config_path, ctx.format).await?;
        let diff = backend.get_diff(&path).await?;

        if ctx.format.is_json() {
            formatter.print_json(&serde_json::json!({
                "path": path.display().to_string(),
                "diff": diff,
            }));
        } else if diff.is_empty() {
            formatter.success("No changes");
        } else {
            // Raw so the output can be piped into a pager or `git apply`
            print!("{}", diff);
        }
        Ok(())
    }
}

/// Mark a conflicted note as resolved
#[derive(Debug, Args)]
pub struct ResolveCommand {
    pub path: PathBuf,
}

impl ResolveCommand {
    pub async fn execute(&self, ctx: &Context) -> Result<()> {
        let formatter = get_formatter(ctx.format.is_json());
        let path = absolute(&self.path)?;

        let backend = Backend::connect(&ctx.config_path, ctx.format).await?;
        backend.resolve_conflict(&path).await?;

        if ctx.format.is_json() {
            formatter.print_json(&serde_json::json!({
                "action": "resolve",
                "path": path.display().to_string(),
                "success": true,
            }));
        } else {
            formatter.success(&format!("Marked {} as resolved", path.display()));
            formatter.info("Run 'mdnote sync' to finish.");
        }
        Ok(())
    }
}
