//! Daemon-side shared state

use std::{
    sync::{Arc, Mutex},
    time::Instant,
};
use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use super::{TimerCommand, TimerRecord, TimerState};
use crate::{
    error::Result,
    messages::{Bus, Message},
    services::BadgeRenderer,
    store::{self, TimerStore},
    utils::Clock,
};

/// State every daemon task shares: the store handle, the clock, the push
/// channel towards panels and the badge
pub struct AppState {
    /// The shared timer record
    pub store: Arc<dyn TimerStore>,
    pub clock: Arc<dyn Clock>,
    /// Daemon → panel pushes
    pub events: Bus,
    pub badge: BadgeRenderer,
    /// Server metadata
    pub start_time: Instant,
    pub port: u16,
    pub host: String,
    /// Last action tracking
    pub last_action: Arc<Mutex<Option<String>>>,
    pub last_action_time: Arc<Mutex<Option<DateTime<Utc>>>>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn TimerStore>,
        clock: Arc<dyn Clock>,
        badge: BadgeRenderer,
        port: u16,
        host: String,
    ) -> Self {
        Self {
            store,
            clock,
            events: Bus::new(16),
            badge,
            start_time: Instant::now(),
            port,
            host,
            last_action: Arc::new(Mutex::new(None)),
            last_action_time: Arc::new(Mutex::new(None)),
        }
    }

    pub fn now(&self) -> i64 {
        self.clock.now_millis()
    }

    /// Fresh read of the record
    pub fn record(&self) -> Result<TimerRecord> {
        self.store.get()
    }

    /// Apply a command against a fresh read and persist the whole result
    pub fn transition(&self, command: TimerCommand) -> Result<(TimerState, TimerState)> {
        store::transition(self.store.as_ref(), command, self.now())
    }

    /// Push to listening panels and return how many received it; nobody
    /// listening only costs latency
    pub fn push(&self, message: Message) -> usize {
        match self.events.send(message) {
            Ok(listeners) => {
                debug!("Pushed {} to {} panel(s)", message.kind(), listeners);
                listeners
            }
            Err(e) => {
                debug!("{}; panels will reconcile from the store", e);
                0
            }
        }
    }

    /// Remember the last handled action for status reporting
    pub fn note_action(&self, action: &str) {
        if let Ok(mut last_action) = self.last_action.lock() {
            *last_action = Some(action.to_string());
        }
        if let Ok(mut last_time) = self.last_action_time.lock() {
            *last_time = Some(Utc::now());
        }
    }

    /// Calculate daemon uptime as a formatted string
    pub fn get_uptime(&self) -> String {
        let duration = self.start_time.elapsed();
        let hours = duration.as_secs() / 3600;
        let minutes = (duration.as_secs() % 3600) / 60;
        let seconds = duration.as_secs() % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }

    /// Get last action information
    pub fn get_last_action(&self) -> (Option<String>, Option<DateTime<Utc>>) {
        let last_action = self.last_action.lock().ok().and_then(|a| a.clone());
        let last_action_time = self.last_action_time.lock().ok().and_then(|t| *t);
        (last_action, last_action_time)
    }

    /// Rewrite a contradictory stored record in its normalised form
    pub fn repair_store(&self) -> Result<()> {
        let record = self.record()?;
        let normalised = TimerRecord::from(record.state());
        if normalised != record {
            warn!("Repairing inconsistent timer record: {:?}", record);
            self.store.set(&normalised)?;
        }
        Ok(())
    }
}
