//! Delivers fired alarms to the controller

use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info};

use crate::{controller::Controller, services::Alarm};

/// Background task that finalises the timer for every alarm that fires
pub async fn alarm_listener_task(controller: Arc<Controller>, mut fired: mpsc::UnboundedReceiver<Alarm>) {
    info!("Starting alarm listener");

    while let Some(alarm) = fired.recv().await {
        match controller.on_alarm(&alarm).await {
            Ok(outcome) => info!("Alarm '{}' handled: {:?}", alarm.name, outcome),
            Err(e) => error!("Failed to handle alarm '{}': {}", alarm.name, e),
        }
    }

    info!("Alarm channel closed, listener stopping");
}
