//! Config command - View and manage mdnote configuration
//!
//! Provides the `mdnote config` CLI command which:
//! 1. Shows the current configuration document
//! 2. Sets individual configuration values via dot-notation keys
//! 3. Validates the configuration file and reports errors

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::Subcommand;
use mdnote_core::config::{AppConfig, ConfigStore};
use mdnote_ipc::client::SyncClient;
use tracing::info;

use crate::output::get_formatter;
use crate::Context;

/// Keys accepted by `config set`, with a short description
const SUPPORTED_KEYS: &[(&str, &str)] = &[
    ("repoPath", "Working directory (empty or 'none' to unset)"),
    ("remoteUrl", "URL of origin (empty or 'none' to unset)"),
    ("git.autoSync", "true|false"),
    ("git.autoSyncInterval", "Minutes between auto-syncs"),
    ("git.authorName", "Commit author name"),
    ("git.authorEmail", "Commit author email"),
    ("git.watchChanges", "true|false - refresh status on file changes"),
    ("git.debounceSeconds", "Seconds a change must settle"),
    ("logging.level", "trace|debug|info|warn|error"),
    ("logging.format", "text|json"),
];

/// Config subcommands
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Display current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (e.g., "git.autoSyncInterval")
        key: String,
        /// New value
        value: String,
    },
    /// Validate configuration file
    Validate,
}

impl ConfigCommand {
    /// Execute the config command
    pub async fn execute(&self, ctx: &Context) -> Result<()> {
        match self {
            ConfigCommand::Show => self.execute_show(ctx).await,
            ConfigCommand::Set { key, value } => self.execute_set(key, value, ctx).await,
            ConfigCommand::Validate => self.execute_validate(ctx).await,
        }
    }

    /// Show current configuration
    async fn execute_show(&self, ctx: &Context) -> Result<()> {
        let formatter = get_formatter(ctx.format.is_json());
        let config = AppConfig::load_or_default(&ctx.config_path);

        info!(config_path = %ctx.config_path.display(), "Showing configuration");

        let json =
            serde_json::to_value(&config).context("Failed to serialize configuration to JSON")?;
        if ctx.format.is_json() {
            formatter.print_json(&json);
        } else {
            formatter.success(&format!("Configuration ({})", ctx.config_path.display()));
            formatter.info("");
            let pretty = serde_json::to_string_pretty(&json)?;
            for line in pretty.lines() {
                formatter.info(line);
            }
        }

        Ok(())
    }

    /// Set a configuration value using dot-notation
    async fn execute_set(&self, key: &str, value: &str, ctx: &Context) -> Result<()> {
        let formatter = get_formatter(ctx.format.is_json());

        let store = ConfigStore::open(&ctx.config_path).with_context(|| {
            format!("Failed to open configuration at {}", ctx.config_path.display())
        })?;
        let mut next = store.get();

        info!(key = %key, value = %value, "Setting configuration value");

        if let Err(e) = apply_config_value(&mut next, key, value) {
            if ctx.format.is_json() {
                formatter.print_json(&serde_json::json!({
                    "success": false,
                    "key": key,
                    "value": value,
                    "error": e.to_string(),
                }));
            } else {
                formatter.error(&format!("Failed to set '{}': {}", key, e));
                formatter.info("");
                formatter.info("Supported keys:");
                for (name, description) in SUPPORTED_KEYS {
                    formatter.info(&format!("  {:<24} - {}", name, description));
                }
            }
            return Ok(());
        }

        let errors = next.validate();
        if !errors.is_empty() {
            let error_msgs: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            if ctx.format.is_json() {
                formatter.print_json(&serde_json::json!({
                    "success": false,
                    "key": key,
                    "value": value,
                    "errors": error_msgs,
                }));
            } else {
                formatter.error(&format!(
                    "Invalid value for '{}': {}",
                    key,
                    error_msgs.join("; ")
                ));
            }
            return Ok(());
        }

        store
            .update(|cfg| *cfg = next)
            .context("Failed to write configuration file")?;

        if ctx.format.is_json() {
            formatter.print_json(&serde_json::json!({
                "success": true,
                "key": key,
                "value": value,
                "config_path": ctx.config_path.display().to_string(),
            }));
        } else {
            formatter.success(&format!("Set {} = {}", key, value));
            formatter.info(&format!("Saved to {}", ctx.config_path.display()));
        }

        // A running daemon keeps its own copy of the document
        if let Ok(Some(_)) = SyncClient::connect().await {
            formatter.warn("The daemon is running; restart it with 'mdnote daemon restart' to apply");
        }

        Ok(())
    }

    /// Validate configuration file
    async fn execute_validate(&self, ctx: &Context) -> Result<()> {
        let formatter = get_formatter(ctx.format.is_json());
        let config_path = &ctx.config_path;

        // Load the file explicitly (not load_or_default)
        let config = match AppConfig::load(config_path) {
            Ok(cfg) => cfg,
            Err(e) => {
                if !config_path.exists() {
                    if ctx.format.is_json() {
                        formatter.print_json(&serde_json::json!({
                            "valid": false,
                            "config_path": config_path.display().to_string(),
                            "errors": ["Configuration file not found. Using defaults."],
                        }));
                    } else {
                        formatter.info(&format!(
                            "Configuration file not found at {}",
                            config_path.display()
                        ));
                        formatter.info("Using default configuration. Run 'mdnote config set <key> <value>' to create one.");
                    }
                    return Ok(());
                }

                if ctx.format.is_json() {
                    formatter.print_json(&serde_json::json!({
                        "valid": false,
                        "config_path": config_path.display().to_string(),
                        "errors": [format!("Failed to parse configuration: {}", e)],
                    }));
                } else {
                    formatter.error(&format!("Failed to parse configuration: {}", e));
                    formatter.info(&format!("File: {}", config_path.display()));
                }
                return Ok(());
            }
        };

        info!(config_path = %config_path.display(), "Validating configuration");

        let errors = config.validate();

        if ctx.format.is_json() {
            let error_strings: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            formatter.print_json(&serde_json::json!({
                "valid": errors.is_empty(),
                "config_path": config_path.display().to_string(),
                "errors": error_strings,
            }));
        } else if errors.is_empty() {
            formatter.success("Configuration is valid");
            formatter.info(&format!("File: {}", config_path.display()));
        } else {
            formatter.error(&format!(
                "Configuration has {} error{}:",
                errors.len(),
                if errors.len() == 1 { "" } else { "s" }
            ));
            formatter.info(&format!("File: {}", config_path.display()));
            formatter.info("");
            for error in &errors {
                formatter.info(&format!("  {} - {}", error.field, error.message));
            }
        }

        Ok(())
    }
}

/// Empty and `none` clear optional values
fn optional(value: &str) -> Option<String> {
    if value.is_empty() || value == "none" {
        None
    } else {
        Some(value.to_string())
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value {
        "true" | "on" | "yes" | "1" => Ok(true),
        "false" | "off" | "no" | "0" => Ok(false),
        _ => anyhow::bail!("Expected true or false for {}", key),
    }
}

/// Apply a dot-notation key/value pair to an [`AppConfig`]
///
/// Keys use the document's own camelCase names; see [`SUPPORTED_KEYS`].
fn apply_config_value(config: &mut AppConfig, key: &str, value: &str) -> Result<()> {
    match key {
        "repoPath" => {
            config.repo_path = optional(value).map(PathBuf::from);
        }
        "remoteUrl" => {
            config.remote_url = optional(value);
        }

        // --- git ---
        "git.autoSync" => {
            config.git.auto_sync = parse_bool(key, value)?;
        }
        "git.autoSyncInterval" => {
            config.git.auto_sync_interval = value
                .parse::<u32>()
                .context("Expected a positive integer for git.autoSyncInterval")?;
        }
        "git.authorName" => {
            config.git.author_name = optional(value);
        }
        "git.authorEmail" => {
            config.git.author_email = optional(value);
        }
        "git.watchChanges" => {
            config.git.watch_changes = parse_bool(key, value)?;
        }
        "git.debounceSeconds" => {
            config.git.debounce_seconds = value
                .parse::<u64>()
                .context("Expected a positive integer for git.debounceSeconds")?;
        }

        // --- logging ---
        "logging.level" => {
            config.logging.level = value.to_string();
        }
        "logging.format" => {
            config.logging.format = value.to_string();
        }

        _ => {
            anyhow::bail!("Unknown configuration key: '{}'", key);
        }
    }

    Ok(())
}
