//! Desktop notifications over `org.freedesktop.Notifications`
//!
//! When no notification daemon answers (headless sessions, CI), every report
//! goes to the log instead. A delivery failure is never an error for the
//! caller.

use std::collections::HashMap;

use async_trait::async_trait;
use mdnote_core::domain::SyncStep;
use mdnote_core::ports::{INotificationSink, Notification};
use mdnote_sync::sinks::LogNotificationSink;
use tracing::{debug, warn};
use zbus::zvariant::Value;

const APP_NAME: &str = "mdnote";
const EXPIRE_DEFAULT: i32 = -1;

#[zbus::proxy(
    interface = "org.freedesktop.Notifications",
    default_service = "org.freedesktop.Notifications",
    default_path = "/org/freedesktop/Notifications"
)]
trait Notifications {
    #[allow(clippy::too_many_arguments)]
    fn notify(
        &self,
        app_name: &str,
        replaces_id: u32,
        app_icon: &str,
        summary: &str,
        body: &str,
        actions: &[&str],
        hints: HashMap<&str, &Value<'_>>,
        expire_timeout: i32,
    ) -> zbus::Result<u32>;
}

/// Notification body, with details appended under a blank line
fn body_text(notification: &Notification) -> String {
    match &notification.details {
        Some(details) if !details.is_empty() => format!("{}\n\n{}", notification.body, details),
        _ => notification.body.clone(),
    }
}

/// Raises desktop notifications, falling back to the log
pub struct DesktopNotificationSink {
    proxy: Option<NotificationsProxy<'static>>,
    fallback: LogNotificationSink,
}

impl DesktopNotificationSink {
    /// Connects to the session notification service
    ///
    /// Never fails; without a reachable service the sink only logs.
    pub async fn connect() -> Self {
        let proxy = match zbus::Connection::session().await {
            Ok(connection) => match NotificationsProxy::new(&connection).await {
                Ok(proxy) => Some(proxy),
                Err(e) => {
                    warn!(error = %e, "Notification service unavailable, logging only");
                    None
                }
            },
            Err(e) => {
                warn!(error = %e, "Session bus unavailable, logging notifications only");
                None
            }
        };
        Self {
            proxy,
            fallback: LogNotificationSink,
        }
    }

    /// A sink that only logs
    pub fn log_only() -> Self {
        Self {
            proxy: None,
            fallback: LogNotificationSink,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.proxy.is_some()
    }

    async fn show(&self, notification: &Notification) -> zbus::Result<()> {
        let Some(proxy) = &self.proxy else {
            return Err(zbus::Error::Failure("no notification service".into()));
        };
        let urgency = Value::from(notification.priority.urgency());
        let hints = HashMap::from([("urgency", &urgency)]);
        let id = proxy
            .notify(
                APP_NAME,
                0,
                "",
                &notification.title,
                &body_text(notification),
                &[],
                hints,
                EXPIRE_DEFAULT,
            )
            .await?;
        debug!(id, title = %notification.title, "Desktop notification shown");
        Ok(())
    }
}

#[async_trait]
impl INotificationSink for DesktopNotificationSink {
    async fn report_success(&self, message: &str) -> anyhow::Result<()> {
        if self.proxy.is_some() {
            match self.show(&Notification::success(message)).await {
                Ok(()) => return Ok(()),
                Err(e) => warn!(error = %e, "Desktop notification failed"),
            }
        }
        self.fallback.report_success(message).await
    }

    async fn report_error(&self, message: &str, details: Option<&str>) -> anyhow::Result<()> {
        if self.proxy.is_some() {
            match self.show(&Notification::error(message, details)).await {
                Ok(()) => return Ok(()),
                Err(e) => warn!(error = %e, "Desktop notification failed"),
            }
        }
        self.fallback.report_error(message, details).await
    }

    async fn report_progress(&self, step: SyncStep) -> anyhow::Result<()> {
        self.fallback.report_progress(step).await
    }
}
