//! Inter-context messages
//!
//! Messages only shorten latency. Every context can rebuild its view from
//! the store, so a message that reaches nobody is logged and dropped.

use futures::future::{self, BoxFuture, FutureExt};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::debug;

use crate::error::{Result, TimerError};

/// Fire-and-forget notifications between the panel, daemon and audio helper
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Message {
    /// Panel → daemon: schedule the deadline alarm
    StartTimer {
        seconds: u64,
        #[serde(rename = "endTime", default, skip_serializing_if = "Option::is_none")]
        end_time: Option<i64>,
    },
    /// Daemon → audio helper: play the completion sound
    PlayDing,
    /// Daemon → panel: the deadline completed
    TimerFinished,
}

impl Message {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::StartTimer { .. } => "start-timer",
            Self::PlayDing => "play-ding",
            Self::TimerFinished => "timer-finished",
        }
    }
}

/// Somewhere a message can be posted without waiting for a reply
pub trait Outbox: Send + Sync {
    fn post(&self, message: Message) -> BoxFuture<'_, Result<()>>;
}

/// Post a message, logging instead of failing when nobody is listening
pub async fn deliver(outbox: &dyn Outbox, message: Message) -> bool {
    match outbox.post(message).await {
        Ok(()) => true,
        Err(e) => {
            debug!("Dropped {} message: {}", message.kind(), e);
            false
        }
    }
}

/// In-process broadcast bus
#[derive(Debug, Clone)]
pub struct Bus {
    tx: broadcast::Sender<Message>,
}

impl Bus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Message> {
        self.tx.subscribe()
    }

    /// Send to every listener; fails when nobody is listening
    pub fn send(&self, message: Message) -> Result<usize> {
        self.tx
            .send(message)
            .map_err(|_| TimerError::DeliveryFailed(format!("no listener for {}", message.kind())))
    }
}

impl Default for Bus {
    fn default() -> Self {
        Self::new(64)
    }
}

impl Outbox for Bus {
    fn post(&self, message: Message) -> BoxFuture<'_, Result<()>> {
        future::ready(self.send(message).map(|_| ())).boxed()
    }
}
