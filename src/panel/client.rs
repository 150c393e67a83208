//! Panel side of the daemon's HTTP endpoint

use std::time::Duration;

use futures::{
    future::{BoxFuture, FutureExt},
    stream::StreamExt,
};
use reqwest::Client;
use tokio::sync::mpsc;
use tracing::debug;

use crate::{
    error::{Result, TimerError},
    messages::{Message, Outbox},
};

/// How long a posted message may take before it counts as undelivered
const POST_TIMEOUT: Duration = Duration::from_secs(2);

/// Posts messages to a running daemon
#[derive(Debug, Clone)]
pub struct HttpOutbox {
    client: Client,
    base_url: String,
}

impl HttpOutbox {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Stream daemon pushes into `tx` until the connection or the receiver goes away
    pub async fn forward_events(&self, tx: mpsc::Sender<Message>) -> Result<()> {
        let response = self
            .client
            .get(format!("{}/events", self.base_url))
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| TimerError::DeliveryFailed(e.to_string()))?;
        debug!("Listening for daemon pushes");

        let mut body = response.bytes_stream();
        let mut buffer = String::new();
        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(|e| TimerError::DeliveryFailed(e.to_string()))?;
            buffer.push_str(&String::from_utf8_lossy(&chunk));

            while let Some(end) = buffer.find("\n\n") {
                let frame: String = buffer.drain(..end + 2).collect();
                if let Some(message) = parse_event(&frame) {
                    if tx.send(message).await.is_err() {
                        return Ok(());
                    }
                }
            }
        }
        Ok(())
    }
}

impl Outbox for HttpOutbox {
    fn post(&self, message: Message) -> BoxFuture<'_, Result<()>> {
        async move {
            self.client
                .post(format!("{}/message", self.base_url))
                .timeout(POST_TIMEOUT)
                .json(&message)
                .send()
                .await
                .and_then(|r| r.error_for_status())
                .map(|_| ())
                .map_err(|e| TimerError::DeliveryFailed(e.to_string()))
        }
        .boxed()
    }
}

/// Decode one server-sent event frame; comments and keep-alives yield `None`
pub fn parse_event(frame: &str) -> Option<Message> {
    let data: Vec<&str> = frame
        .lines()
        .filter_map(|line| line.strip_prefix("data:"))
        .map(str::trim_start)
        .collect();
    if data.is_empty() {
        return None;
    }
    serde_json::from_str(&data.join("\n")).ok()
}
