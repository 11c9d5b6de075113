//! Notification sink that only writes to the log

use async_trait::async_trait;
use mdnote_core::domain::SyncStep;
use mdnote_core::ports::INotificationSink;
use tracing::{debug, error, info};

/// Sink for headless runs; every report becomes a tracing event
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotificationSink;

#[async_trait]
impl INotificationSink for LogNotificationSink {
    async fn report_success(&self, message: &str) -> anyhow::Result<()> {
        info!(target: "mdnote::notify", "{}", message);
        Ok(())
    }

    async fn report_error(&self, message: &str, details: Option<&str>) -> anyhow::Result<()> {
        match details {
            Some(details) => error!(target: "mdnote::notify", details, "{}", message),
            None => error!(target: "mdnote::notify", "{}", message),
        }
        Ok(())
    }

    async fn report_progress(&self, step: SyncStep) -> anyhow::Result<()> {
        debug!(target: "mdnote::notify", step = %step, "Sync progress");
        Ok(())
    }
}
