//! Auto-sync command - Show or change the auto-sync schedule
//!
//! `mdnote auto-sync` with no flags prints the current setting. `--enable`,
//! `--disable` and `--interval` change it; a running daemon restarts its
//! timer as soon as the new value is saved.

use anyhow::Result;
use clap::Args;
use mdnote_core::domain::AutoSyncConfig;

use crate::backend::Backend;
use crate::output::{get_formatter, OutputFormatter};
use crate::Context;

#[derive(Debug, Args)]
pub struct AutoSyncCommand {
    /// Turn auto-sync on
    #[arg(long, conflicts_with = "disable")]
    pub enable: bool,

    /// Turn auto-sync off
    #[arg(long)]
    pub disable: bool,

    /// Minutes between syncs
    #[arg(long, value_name = "MINUTES")]
    pub interval: Option<u32>,
}

impl AutoSyncCommand {
    /// Settings after applying the flags to `current`, or `None` for a read
    fn requested(&self, current: AutoSyncConfig) -> Option<AutoSyncConfig> {
        if !self.enable && !self.disable && self.interval.is_none() {
            return None;
        }
        let enabled = if self.enable {
            true
        } else if self.disable {
            false
        } else {
            current.enabled
        };
        Some(AutoSyncConfig::new(
            enabled,
            self.interval.unwrap_or(current.interval_minutes),
        ))
    }

    pub async fn execute(&self, ctx: &Context) -> Result<()> {
        let formatter = get_formatter(ctx.format.is_json());

        let backend = Backend::connect(&ctx.config_path, ctx.format).await?;
        let current = backend.auto_sync().await?;

        let shown = match self.requested(current) {
            None => current,
            Some(next) => {
                let saved = backend
                    .set_auto_sync(next.enabled, next.interval_minutes)
                    .await?;
                if !ctx.format.is_json() {
                    formatter.success("Auto-sync updated");
                }
                saved
            }
        };

        render(formatter.as_ref(), ctx.format.is_json(), shown);
        Ok(())
    }
}

fn render(formatter: &dyn OutputFormatter, json: bool, auto: AutoSyncConfig) {
    if json {
        formatter.print_json(&serde_json::json!({
            "enabled": auto.enabled,
            "intervalMinutes": auto.interval_minutes,
        }));
    } else if auto.enabled {
        formatter.info(&format!(
            "Auto-sync is on, every {} minute{}",
            auto.interval_minutes,
            if auto.interval_minutes == 1 { "" } else { "s" }
        ));
    } else {
        formatter.info(&format!(
            "Auto-sync is off (interval {} minutes)",
            auto.interval_minutes
        ));
    }
}
