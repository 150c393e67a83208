//! Alarm recovery background task

use std::{sync::Arc, time::Duration};
use tokio::time::interval;
use tracing::{info, warn};

use crate::controller::Controller;

pub const RECOVERY_INTERVAL: Duration = Duration::from_secs(5);

/// Background task that keeps the alarm aligned with the stored record.
///
/// Covers a daemon started after the panel wrote a running timer and
/// `start-timer` messages that never arrived. The first tick runs at once,
/// so a deadline that passed while the daemon was down fires on startup.
pub async fn alarm_recovery_task(controller: Arc<Controller>) {
    info!("Starting alarm recovery task");

    let mut interval = interval(RECOVERY_INTERVAL);

    loop {
        interval.tick().await;

        if let Err(e) = controller.reconcile_alarm() {
            warn!("Failed to reconcile alarm with stored timer: {}", e);
        }
    }
}
