//! Notification sink port (driven/secondary port)
//!
//! This module defines how the Sync Orchestrator surfaces success, failure
//! and progress to the user. Implementations may use desktop notifications
//! over D-Bus, a terminal, or nothing but the log.
//!
//! ## Design Notes
//!
//! - Uses `anyhow::Result` because delivery failures are adapter-specific.
//! - Notifications are fire-and-forget; the orchestrator logs a delivery
//!   failure and carries on.
//! - `details` is free-form diagnostic text (e.g. git's stderr) for a
//!   "show details" affordance. The headline must stand on its own.

use serde::{Deserialize, Serialize};

use crate::domain::SyncStep;

// ============================================================================
// Notification struct and NotificationPriority enum
// ============================================================================

/// Priority level for a notification
///
/// Maps to urgency levels in notification systems (e.g., libnotify urgency).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationPriority {
    Low,
    #[default]
    Normal,
    High,
}

impl NotificationPriority {
    /// libnotify urgency byte (0 = low, 1 = normal, 2 = critical)
    pub fn urgency(&self) -> u8 {
        match self {
            NotificationPriority::Low => 0,
            NotificationPriority::Normal => 1,
            NotificationPriority::High => 2,
        }
    }
}

/// A notification to display to the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Short headline
    pub title: String,
    /// Body text with the message itself
    pub body: String,
    /// Optional diagnostic text, shown only on request
    pub details: Option<String>,
    pub priority: NotificationPriority,
}

impl Notification {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            details: None,
            priority: NotificationPriority::Normal,
        }
    }

    pub fn with_priority(mut self, priority: NotificationPriority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_details(mut self, details: Option<String>) -> Self {
        self.details = details;
        self
    }

    /// Creates a success notification
    pub fn success(message: impl Into<String>) -> Self {
        Self::new("Sync", message).with_priority(NotificationPriority::Low)
    }

    /// Creates an error notification with High priority
    pub fn error(message: impl Into<String>, details: Option<&str>) -> Self {
        Self::new("Sync error", message)
            .with_priority(NotificationPriority::High)
            .with_details(details.map(str::to_string))
    }
}

// ============================================================================
// INotificationSink trait
// ============================================================================

/// Port trait for user-facing sync notifications
#[async_trait::async_trait]
pub trait INotificationSink: Send + Sync {
    /// Reports a completed operation (success toast)
    async fn report_success(&self, message: &str) -> anyhow::Result<()>;

    /// Reports a failure with optional diagnostic details (error dialog)
    async fn report_error(&self, message: &str, details: Option<&str>) -> anyhow::Result<()>;

    /// Reports that a sync sequence entered `step`
    ///
    /// Progress is optional; the default implementation ignores it.
    async fn report_progress(&self, _step: SyncStep) -> anyhow::Result<()> {
        Ok(())
    }
}
