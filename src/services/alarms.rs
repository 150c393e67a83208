//! Durable named deadlines

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};

use tokio::{sync::mpsc, task::JoinHandle, time::sleep};
use tracing::{debug, info};

use crate::utils::Clock;

/// Longest single sleep while waiting for a deadline. Waking regularly and
/// re-reading the wall clock keeps deadlines honest across system suspend,
/// where monotonic sleeps stop counting.
const MAX_SLEEP_SLICE: Duration = Duration::from_secs(1);

/// A fired alarm
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alarm {
    pub name: String,
    /// Epoch milliseconds the alarm was scheduled for
    pub scheduled_time: i64,
}

/// Scheduling surface for named deadlines. Creating an alarm replaces any
/// pending alarm with the same name.
pub trait AlarmHost: Send + Sync {
    /// Schedule `name` to fire after `delay_minutes` (fractions allowed); returns the deadline
    fn create(&self, name: &str, delay_minutes: f64) -> i64;

    /// Drop a pending alarm; returns whether one was pending
    fn clear(&self, name: &str) -> bool;

    /// Deadline of the pending alarm called `name`
    fn scheduled(&self, name: &str) -> Option<i64>;
}

/// Convert a delay in minutes to whole milliseconds
pub fn minutes_to_millis(delay_minutes: f64) -> i64 {
    (delay_minutes.max(0.0) * 60_000.0).round() as i64
}

/// Delay in minutes from `now` until `deadline`, never negative
pub fn delay_minutes(now: i64, deadline: i64) -> f64 {
    (deadline - now).max(0) as f64 / 60_000.0
}

/// Alarm host backed by tokio tasks; fired alarms arrive on a channel
pub struct TokioAlarms {
    clock: Arc<dyn Clock>,
    fired_tx: mpsc::UnboundedSender<Alarm>,
    pending: Mutex<HashMap<String, (i64, JoinHandle<()>)>>,
}

impl TokioAlarms {
    pub fn new(clock: Arc<dyn Clock>) -> (Self, mpsc::UnboundedReceiver<Alarm>) {
        let (fired_tx, fired_rx) = mpsc::unbounded_channel();
        let host = Self {
            clock,
            fired_tx,
            pending: Mutex::new(HashMap::new()),
        };
        (host, fired_rx)
    }
}

impl AlarmHost for TokioAlarms {
    fn create(&self, name: &str, delay_minutes: f64) -> i64 {
        let scheduled_time = self.clock.now_millis() + minutes_to_millis(delay_minutes);
        let clock = Arc::clone(&self.clock);
        let fired_tx = self.fired_tx.clone();
        let alarm = Alarm {
            name: name.to_string(),
            scheduled_time,
        };

        let handle = tokio::spawn(async move {
            loop {
                let left = alarm.scheduled_time - clock.now_millis();
                if left <= 0 {
                    break;
                }
                sleep(Duration::from_millis(left as u64).min(MAX_SLEEP_SLICE)).await;
            }
            debug!("Alarm '{}' fired", alarm.name);
            let _ = fired_tx.send(alarm);
        });

        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some((previous, old)) = pending.insert(name.to_string(), (scheduled_time, handle)) {
            old.abort();
            debug!("Replaced alarm '{}' scheduled for {}", name, previous);
        }
        info!("Alarm '{}' scheduled for {} ({:.2} min)", name, scheduled_time, delay_minutes);
        scheduled_time
    }

    fn clear(&self, name: &str) -> bool {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        match pending.remove(name) {
            Some((_, handle)) => {
                let was_pending = !handle.is_finished();
                handle.abort();
                if was_pending {
                    info!("Alarm '{}' cleared", name);
                }
                was_pending
            }
            None => false,
        }
    }

    fn scheduled(&self, name: &str) -> Option<i64> {
        let pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        pending
            .get(name)
            .filter(|(_, handle)| !handle.is_finished())
            .map(|(deadline, _)| *deadline)
    }
}
