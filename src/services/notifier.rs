//! Desktop notifications

use std::path::PathBuf;

use tokio::process::Command;
use tracing::{info, warn};

/// Completion notification content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub icon: Option<PathBuf>,
    /// Highest priority, stays on screen until dismissed
    pub urgent: bool,
}

impl Notification {
    pub fn timer_finished(icon: Option<PathBuf>) -> Self {
        Self {
            title: "⏰ Time's up!".to_string(),
            body: "Your timer has finished.".to_string(),
            icon,
            urgent: true,
        }
    }
}

/// Shows notifications without waiting for them
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: &Notification);
}

/// Shows notifications through `notify-send`
#[derive(Debug, Clone, Default)]
pub struct NotifySend;

impl Notifier for NotifySend {
    fn notify(&self, notification: &Notification) {
        let notification = notification.clone();
        tokio::spawn(async move {
            if let Err(e) = notify_send(&notification).await {
                warn!("Failed to show notification: {}", e);
            }
        });
    }
}

/// Run `notify-send` for one notification
pub async fn notify_send(notification: &Notification) -> Result<(), String> {
    let mut command = Command::new("notify-send");
    command.args(["--app-name", "better-timer"]);
    if notification.urgent {
        command.args(["--urgency", "critical"]);
    }
    if let Some(icon) = &notification.icon {
        command.arg("--icon").arg(icon);
    }
    command.arg(&notification.title).arg(&notification.body);

    let output = command
        .output()
        .await
        .map_err(|e| format!("Failed to execute notify-send: {}", e))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(format!("notify-send failed: {}", stderr));
    }
    Ok(())
}

/// Writes notifications to the log only
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notification: &Notification) {
        info!("{} {}", notification.title, notification.body);
    }
}
