//! Status command - Display synchronization status
//!
//! Provides the `mdnote status` CLI command which shows:
//! 1. The one-line indicator (up to date, modified, ahead, ...)
//! 2. Counts of uncommitted, unpushed and unpulled changes
//! 3. Conflicted paths and the last error, when present
//! 4. Per-file status codes with `--files`

use anyhow::Result;
use chrono::Local;
use clap::Args;
use mdnote_core::domain::{SyncState, SyncStatus};
use tracing::info;

use crate::backend::Backend;
use crate::output::{get_formatter, OutputFormatter};
use crate::Context;

/// Status command
#[derive(Debug, Args)]
pub struct StatusCommand {
    /// Also list every changed file with its status code
    #[arg(long)]
    pub files: bool,
}

impl StatusCommand {
    pub async fn execute(&self, ctx: &Context) -> Result<()> {
        let formatter = get_formatter(ctx.format.is_json());

        let backend = Backend::connect(&ctx.config_path, ctx.format).await?;
        let status = backend.status().await?;
        let indicator = backend.indicator().await?;
        info!(daemon = backend.is_daemon(), state = %status.state, "Status read");

        if ctx.format.is_json() {
            let mut json = serde_json::to_value(&status)?;
            if let Some(obj) = json.as_object_mut() {
                obj.insert("indicator".into(), serde_json::Value::String(indicator));
                obj.insert("daemon".into(), serde_json::Value::Bool(backend.is_daemon()));
            }
            formatter.print_json(&json);
            return Ok(());
        }

        render_human(formatter.as_ref(), &status, &indicator, self.files);
        if !backend.is_daemon() {
            formatter.info("");
            formatter.info("Daemon not running; status read directly from the repository.");
        }
        Ok(())
    }
}

fn render_human(formatter: &dyn OutputFormatter, status: &SyncStatus, indicator: &str, files: bool) {
    match status.state {
        SyncState::Error => formatter.error(indicator),
        SyncState::Conflict => formatter.warn(indicator),
        SyncState::Idle => formatter.success(indicator),
    }

    formatter.info("");
    formatter.info(&format!("Modified:   {}", status.modified_count));
    formatter.info(&format!("To push:    {}", status.ahead));
    formatter.info(&format!("To pull:    {}", status.behind));
    if let Some(checked) = status.last_checked_at {
        formatter.info(&format!(
            "Checked:    {}",
            checked.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S")
        ));
    }

    if !status.conflicted_paths.is_empty() {
        formatter.info("");
        formatter.info(&format!(
            "{} conflicted file{}:",
            status.conflicted_paths.len(),
            plural(status.conflicted_paths.len())
        ));
        for path in &status.conflicted_paths {
            formatter.info(&format!("  {}", path));
        }
        formatter.info("Edit the files, then run 'mdnote resolve <path>'.");
    }

    if files && !status.file_statuses.is_empty() {
        formatter.info("");
        for (path, code) in &status.file_statuses {
            formatter.info(&format!("  {} {}", code, path));
        }
    }
}

fn plural(n: usize) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}
