//! Configuration module for mdnote.
//!
//! The application keeps a single JSON document shared with the desktop
//! front end. The sync engine owns the `git` section (auto-sync schedule,
//! commit identity, change watching) and reads `repoPath` / `remoteUrl`.
//! Keys it does not know are preserved verbatim when the document is saved.

mod store;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::AutoSyncConfig;

pub use store::ConfigStore;

/// Maximum number of entries kept in `recentProjects`.
pub const MAX_RECENT_PROJECTS: usize = 10;

// ---------------------------------------------------------------------------
// AppConfig struct with sub-sections
// ---------------------------------------------------------------------------

/// Top-level application configuration document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppConfig {
    /// Working directory holding the notes and the git metadata.
    pub repo_path: Option<PathBuf>,
    /// URL last configured as `origin`.
    pub remote_url: Option<String>,
    /// Recently opened working directories, most recent first.
    pub recent_projects: Vec<PathBuf>,
    pub git: GitConfig,
    pub logging: LoggingConfig,
    /// Sections owned by other parts of the application.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Synchronization settings (the `git` key).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GitConfig {
    /// Whether the auto-sync timer runs.
    pub auto_sync: bool,
    /// Minutes between auto-sync ticks.
    pub auto_sync_interval: u32,
    /// Commit author name passed to git when set.
    pub author_name: Option<String>,
    /// Commit author email passed to git when set.
    pub author_email: Option<String>,
    /// Watch the working directory and refresh status once edits settle.
    pub watch_changes: bool,
    /// Seconds a path must be quiet before a change counts as settled.
    pub debounce_seconds: u64,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Logging / tracing settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingConfig {
    /// Log level: `trace`, `debug`, `info`, `warn`, or `error`.
    pub level: String,
    /// Output format: `text` or `json`.
    pub format: String,
}

impl Default for GitConfig {
    fn default() -> Self {
        let auto = AutoSyncConfig::default();
        Self {
            auto_sync: auto.enabled,
            auto_sync_interval: auto.interval_minutes,
            author_name: None,
            author_email: None,
            watch_changes: true,
            debounce_seconds: 2,
            extra: serde_json::Map::new(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

/// Errors raised while loading or persisting the configuration document.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration document: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid configuration: {}", format_errors(.0))]
    Invalid(Vec<ValidationError>),
}

fn format_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

// ---------------------------------------------------------------------------
// AppConfig::load()
// ---------------------------------------------------------------------------

impl AppConfig {
    /// Load configuration from a JSON file at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: AppConfig = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Try to load from `path`; fall back to [`AppConfig::default`] on any error.
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_default()
    }

    /// Platform-appropriate default path for the configuration file.
    ///
    /// Typically `$XDG_CONFIG_HOME/mdnote/config.json` on Linux.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("mdnote")
            .join("config.json")
    }

    /// Working directory, treating an empty string as unset.
    pub fn working_dir(&self) -> Option<PathBuf> {
        self.repo_path
            .as_ref()
            .filter(|p| !p.as_os_str().is_empty())
            .cloned()
    }

    pub fn auto_sync(&self) -> AutoSyncConfig {
        AutoSyncConfig::new(self.git.auto_sync, self.git.auto_sync_interval)
    }

    pub fn set_auto_sync(&mut self, auto: AutoSyncConfig) {
        self.git.auto_sync = auto.enabled;
        self.git.auto_sync_interval = auto.interval_minutes;
    }

    /// Commit identity, when both name and email are configured.
    pub fn identity(&self) -> Option<(String, String)> {
        match (&self.git.author_name, &self.git.author_email) {
            (Some(name), Some(email)) if !name.is_empty() && !email.is_empty() => {
                Some((name.clone(), email.clone()))
            }
            _ => None,
        }
    }

    /// Moves `path` to the front of `recent_projects`.
    pub fn remember_project(&mut self, path: &Path) {
        self.recent_projects.retain(|p| p != path);
        self.recent_projects.insert(0, path.to_path_buf());
        self.recent_projects.truncate(MAX_RECENT_PROJECTS);
    }
}

// ---------------------------------------------------------------------------
// AppConfig::validate()
// ---------------------------------------------------------------------------

/// A single validation error found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path to the offending field, e.g. `"git.autoSyncInterval"`.
    pub field: String,
    /// Human-readable explanation.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Valid values for `logging.level`.
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Valid values for `logging.format`.
const VALID_LOG_FORMATS: &[&str] = &["text", "json"];

impl AppConfig {
    /// Validate the configuration and return all errors found.
    ///
    /// An empty vector means the configuration is valid.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        // --- git ---
        if self.git.auto_sync_interval == 0 {
            errors.push(ValidationError {
                field: "git.autoSyncInterval".into(),
                message: "must be greater than 0".into(),
            });
        }
        if self.git.debounce_seconds == 0 {
            errors.push(ValidationError {
                field: "git.debounceSeconds".into(),
                message: "must be greater than 0".into(),
            });
        }
        if self.git.author_name.is_some() != self.git.author_email.is_some() {
            errors.push(ValidationError {
                field: "git.authorEmail".into(),
                message: "authorName and authorEmail must be set together".into(),
            });
        }

        // --- remote ---
        if let Some(url) = &self.remote_url {
            if url.trim().is_empty() {
                errors.push(ValidationError {
                    field: "remoteUrl".into(),
                    message: "must not be empty when present".into(),
                });
            }
        }

        // --- logging ---
        if !VALID_LOG_LEVELS.contains(&self.logging.level.as_str()) {
            errors.push(ValidationError {
                field: "logging.level".into(),
                message: format!(
                    "invalid level '{}'; valid options: {}",
                    self.logging.level,
                    VALID_LOG_LEVELS.join(", ")
                ),
            });
        }
        if !VALID_LOG_FORMATS.contains(&self.logging.format.as_str()) {
            errors.push(ValidationError {
                field: "logging.format".into(),
                message: format!(
                    "invalid format '{}'; valid options: {}",
                    self.logging.format,
                    VALID_LOG_FORMATS.join(", ")
                ),
            });
        }

        errors
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    // -- Defaults --

    #[test]
    fn default_config_has_sensible_values() {
        let cfg = AppConfig::default();
        assert!(cfg.repo_path.is_none());
        assert!(cfg.remote_url.is_none());
        assert!(cfg.recent_projects.is_empty());
        assert!(!cfg.git.auto_sync);
        assert_eq!(cfg.git.auto_sync_interval, 30);
        assert!(cfg.git.watch_changes);
        assert_eq!(cfg.git.debounce_seconds, 2);
        assert_eq!(cfg.logging.level, "info");
        assert_eq!(cfg.logging.format, "text");
    }

    #[test]
    fn default_config_passes_validation() {
        let errors = AppConfig::default().validate();
        assert!(errors.is_empty(), "unexpected validation errors: {errors:?}");
    }

    // -- Loading --

    #[test]
    fn load_from_json_file() {
        let json = r#"{
  "repoPath": "/tmp/notes",
  "remoteUrl": "git@example.com:me/notes.git",
  "recentProjects": ["/tmp/notes", "/tmp/old"],
  "theme": "dark",
  "git": { "autoSync": true, "autoSyncInterval": 5 },
  "logging": { "level": "debug" }
}"#;
        let mut tmp = tempfile::NamedTempFile::new().expect("create temp file");
        tmp.write_all(json.as_bytes()).unwrap();
        tmp.flush().unwrap();

        let cfg = AppConfig::load(tmp.path()).expect("load config");
        assert_eq!(cfg.working_dir(), Some(PathBuf::from("/tmp/notes")));
        assert_eq!(cfg.remote_url.as_deref(), Some("git@example.com:me/notes.git"));
        assert_eq!(cfg.recent_projects.len(), 2);
        assert_eq!(cfg.auto_sync(), AutoSyncConfig::new(true, 5));
        // Missing keys fall back to defaults
        assert!(cfg.git.watch_changes);
        assert_eq!(cfg.logging.level, "debug");
        assert_eq!(cfg.logging.format, "text");
        // Unknown keys survive
        assert_eq!(cfg.extra.get("theme"), Some(&serde_json::json!("dark")));
    }

    #[test]
    fn unknown_keys_round_trip() {
        let json = r#"{"theme":"dark","git":{"autoSync":false,"pushOnExit":true}}"#;
        let cfg: AppConfig = serde_json::from_str(json).unwrap();
        let out = serde_json::to_value(&cfg).unwrap();
        assert_eq!(out["theme"], "dark");
        assert_eq!(out["git"]["pushOnExit"], true);
        assert_eq!(out["git"]["autoSyncInterval"], 30);
    }

    #[test]
    fn empty_repo_path_is_unset() {
        let cfg: AppConfig = serde_json::from_str(r#"{"repoPath": ""}"#).unwrap();
        assert!(cfg.working_dir().is_none());
    }

    #[test]
    fn load_or_default_returns_default_on_missing_file() {
        let cfg = AppConfig::load_or_default(Path::new("/nonexistent/path/config.json"));
        assert_eq!(cfg, AppConfig::default());
    }

    #[test]
    fn load_returns_error_on_invalid_json() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        tmp.write_all(b"{ not json").unwrap();
        tmp.flush().unwrap();

        let result = AppConfig::load(tmp.path());
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    // -- Validation --

    #[test]
    fn validate_catches_zero_interval() {
        let mut cfg = AppConfig::default();
        cfg.git.auto_sync_interval = 0;
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "git.autoSyncInterval"));
    }

    #[test]
    fn validate_catches_half_identity() {
        let mut cfg = AppConfig::default();
        cfg.git.author_name = Some("Ada".to_string());
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "git.authorEmail"));
        assert!(cfg.identity().is_none());

        cfg.git.author_email = Some("ada@example.com".to_string());
        assert!(cfg.validate().is_empty());
        assert_eq!(
            cfg.identity(),
            Some(("Ada".to_string(), "ada@example.com".to_string()))
        );
    }

    #[test]
    fn validate_catches_invalid_log_level_and_format() {
        let mut cfg = AppConfig::default();
        cfg.logging.level = "verbose".into();
        cfg.logging.format = "xml".into();
        let fields: Vec<_> = cfg.validate().into_iter().map(|e| e.field).collect();
        assert!(fields.contains(&"logging.level".to_string()));
        assert!(fields.contains(&"logging.format".to_string()));
    }

    // -- Recent projects --

    #[test]
    fn remember_project_dedups_and_caps() {
        let mut cfg = AppConfig::default();
        for i in 0..12 {
            cfg.remember_project(Path::new(&format!("/notes/{i}")));
        }
        cfg.remember_project(Path::new("/notes/5"));

        assert_eq!(cfg.recent_projects.len(), MAX_RECENT_PROJECTS);
        assert_eq!(cfg.recent_projects[0], PathBuf::from("/notes/5"));
        assert_eq!(
            cfg.recent_projects
                .iter()
                .filter(|p| **p == PathBuf::from("/notes/5"))
                .count(),
            1
        );
    }
}
