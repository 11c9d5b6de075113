//! Sync command - Commit, pull and push the working directory
//!
//! Provides the `mdnote sync` CLI command which:
//! 1. Asks a running daemon to sync, so its re-entrancy guard applies
//! 2. Otherwise runs the sequence with an in-process engine
//! 3. Exits non-zero when the sequence failed

use anyhow::Result;
use clap::Args;
use mdnote_core::domain::SyncOutcome;
use tracing::info;

use crate::backend::Backend;
use crate::output::{get_formatter, OutputFormatter};
use crate::Context;

/// Sync command
#[derive(Debug, Args)]
pub struct SyncCommand {
    /// Do not report success; failures are still reported
    #[arg(long)]
    pub silent: bool,
}

impl SyncCommand {
    pub async fn execute(&self, ctx: &Context) -> Result<()> {
        let formatter = get_formatter(ctx.format.is_json());

        let backend = Backend::connect(&ctx.config_path, ctx.format).await?;
        info!(daemon = backend.is_daemon(), silent = self.silent, "Starting sync");

        let outcome = backend.sync(self.silent).await?;

        if ctx.format.is_json() {
            formatter.print_json(&serde_json::to_value(&outcome)?);
        } else {
            // The in-process engine already reported through the console sink
            let reported_by_sink = !backend.is_daemon();
            render_outcome(formatter.as_ref(), &outcome, reported_by_sink);
        }

        if let SyncOutcome::Failed { step, message } = outcome {
            anyhow::bail!("sync failed while {}: {}", step, message);
        }
        Ok(())
    }
}

fn render_outcome(formatter: &dyn OutputFormatter, outcome: &SyncOutcome, reported_by_sink: bool) {
    match outcome {
        SyncOutcome::Skipped => formatter.warn("A sync is already running"),
        SyncOutcome::NotConfigured => {
            formatter.warn("No working directory configured");
            formatter.info("Run 'mdnote open <path>' or 'mdnote clone <url> <dir>' first.");
        }
        _ if reported_by_sink => {}
        SyncOutcome::UpToDate => formatter.success("Already up to date"),
        SyncOutcome::Completed { committed, pulled } => {
            formatter.success("Sync completed successfully");
            if *committed {
                formatter.info("Committed local changes");
            }
            if !*pulled {
                formatter.info("Remote branch did not exist yet; pushed it");
            }
        }
        SyncOutcome::Failed { step, message } => {
            formatter.error(&format!("Sync failed while {}: {}", step, message));
        }
    }
}
