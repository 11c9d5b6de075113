//! Daemon management commands
//!
//! Provides the `mdnote daemon` CLI subcommands for controlling the
//! mdnote background synchronization service via systemd user units.
//!
//! # Subcommands
//!
//! - `start`   - Start the daemon service
//! - `stop`    - Stop the daemon service
//! - `status`  - Show daemon status
//! - `restart` - Restart the daemon service

use std::process::{Command, Output};

use anyhow::{Context as _, Result};
use clap::Subcommand;
use mdnote_ipc::client::SyncClient;
use tracing::info;

use crate::output::{get_formatter, OutputFormatter};
use crate::Context;

/// Service unit name for the mdnote daemon
const SYSTEMD_UNIT: &str = "mdnote";

/// Manage the mdnote background daemon
#[derive(Debug, Subcommand)]
pub enum DaemonCommand {
    /// Start the mdnote daemon
    Start,
    /// Stop the mdnote daemon
    Stop,
    /// Show daemon status
    Status,
    /// Restart the mdnote daemon
    Restart,
}

impl DaemonCommand {
    /// Execute the selected daemon subcommand
    pub async fn execute(&self, ctx: &Context) -> Result<()> {
        let json = ctx.format.is_json();
        match self {
            DaemonCommand::Start => control("start", "started", json),
            DaemonCommand::Stop => control("stop", "stopped", json),
            DaemonCommand::Restart => control("restart", "restarted", json),
            DaemonCommand::Status => daemon_status(json).await,
        }
    }
}

fn systemctl(action: &str) -> Result<Output> {
    info!(action, unit = SYSTEMD_UNIT, "Running systemctl");
    Command::new("systemctl")
        .args(["--user", action, SYSTEMD_UNIT])
        .output()
        .context("Failed to execute systemctl. Is systemd available?")
}

fn unit_missing(stderr: &str) -> bool {
    stderr.contains("not found") || stderr.contains("No such file")
}

fn install_hint(formatter: &dyn OutputFormatter) {
    formatter.info("Hint: The systemd unit file may not be installed.");
    formatter.info("Copy config/mdnote.service to ~/.config/systemd/user/mdnote.service");
    formatter.info("Then run: systemctl --user daemon-reload");
}

/// Runs `systemctl --user <action> mdnote` and reports the result
fn control(action: &str, past: &str, json: bool) -> Result<()> {
    let formatter = get_formatter(json);
    let output = systemctl(action)?;

    if output.status.success() {
        formatter.success(&format!("mdnote daemon {}", past));
        if json {
            formatter.print_json(&serde_json::json!({
                "action": action,
                "success": true,
            }));
        }
        return Ok(());
    }

    let stderr = String::from_utf8_lossy(&output.stderr);
    formatter.error(&format!("Failed to {} daemon: {}", action, stderr.trim()));
    if unit_missing(&stderr) {
        install_hint(formatter.as_ref());
    }
    if json {
        formatter.print_json(&serde_json::json!({
            "action": action,
            "success": false,
            "error": stderr.trim(),
        }));
    }
    Ok(())
}

/// Maps `systemctl status` output to a short state name
fn parse_unit_state(stdout: &str) -> &'static str {
    if stdout.contains("active (running)") {
        "running"
    } else if stdout.contains("failed") {
        "failed"
    } else if stdout.contains("inactive (dead)") {
        "stopped"
    } else {
        "unknown"
    }
}

/// Shows the unit state and, when the daemon answers on the bus, its indicator
async fn daemon_status(json: bool) -> Result<()> {
    let formatter = get_formatter(json);

    let output = systemctl("status")?;
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    let unit_state = parse_unit_state(&stdout);

    let indicator = match SyncClient::connect().await {
        Ok(Some(client)) => client.indicator().await.ok(),
        _ => None,
    };

    if json {
        formatter.print_json(&serde_json::json!({
            "action": "status",
            "status": unit_state,
            "active": unit_state == "running",
            "on_bus": indicator.is_some(),
            "indicator": indicator,
            "details": stdout.trim(),
        }));
        return Ok(());
    }

    match unit_state {
        "running" => formatter.success("mdnote daemon is running"),
        "failed" => formatter.error("mdnote daemon has failed"),
        "stopped" => formatter.info("mdnote daemon is stopped"),
        _ if indicator.is_some() => {
            formatter.success("mdnote daemon is running (not managed by systemd)")
        }
        _ => formatter.info("mdnote daemon status is unknown"),
    }
    if let Some(indicator) = &indicator {
        formatter.info(&format!("Sync: {}", indicator));
    }

    if !stdout.is_empty() {
        formatter.info("");
        for line in stdout.lines() {
            formatter.info(line);
        }
    }

    // systemctl status exits non-zero for inactive units; only a missing unit
    // deserves a hint
    if !output.status.success() && unit_missing(&stderr) {
        formatter.info("");
        install_hint(formatter.as_ref());
    }

    Ok(())
}
