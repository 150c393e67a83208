//! The long-running controller
//!
//! Owns the deadline alarm and everything that happens when it fires. The
//! controller trusts nothing it cached: every decision starts from a fresh
//! read of the store.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::{
    audio::AudioBridge,
    error::{Result, TimerError},
    messages::Message,
    services::{
        alarms::{delay_minutes, Alarm},
        AlarmHost, Notification, Notifier, PanelLauncher,
    },
    state::{duration_millis, same_deadline, AppState, TimerCommand, TimerState},
};

/// Name of the single deadline alarm
pub const DONE_ALARM: &str = "done";

/// What a fired alarm amounted to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// The timer finished now
    Finished,
    /// The record was already finalised, nothing repeated
    AlreadyFinished,
    /// The timer was paused, reset or rescheduled since the alarm was set
    Stale,
    /// The timer changed between the check and the write; sound and
    /// notification already went out, the newer record was kept
    Interrupted,
    /// Not our alarm
    Ignored,
}

pub struct Controller {
    pub state: Arc<AppState>,
    alarms: Arc<dyn AlarmHost>,
    audio: Arc<AudioBridge>,
    notifier: Arc<dyn Notifier>,
    notification: Notification,
    launcher: Option<Arc<dyn PanelLauncher>>,
}

impl Controller {
    pub fn new(
        state: Arc<AppState>,
        alarms: Arc<dyn AlarmHost>,
        audio: Arc<AudioBridge>,
        notifier: Arc<dyn Notifier>,
        notification: Notification,
    ) -> Self {
        Self {
            state,
            alarms,
            audio,
            notifier,
            notification,
            launcher: None,
        }
    }

    /// Reopen a panel after completion when none is listening
    pub fn with_launcher(mut self, launcher: Arc<dyn PanelLauncher>) -> Self {
        self.launcher = Some(launcher);
        self
    }

    /// Handle a message posted to the daemon
    pub async fn handle_message(&self, message: Message) -> Result<()> {
        self.state.note_action(message.kind());
        match message {
            Message::StartTimer { seconds, end_time } => {
                self.schedule(seconds, end_time)?;
            }
            Message::PlayDing => self.audio.play_ding().await,
            Message::TimerFinished => {
                debug!("Ignoring timer-finished addressed to the daemon");
            }
        }
        Ok(())
    }

    /// Schedule the deadline alarm, replacing any earlier one. An explicit
    /// `end_time` aligns the alarm with the deadline the panel persisted.
    pub fn schedule(&self, seconds: u64, end_time: Option<i64>) -> Result<i64> {
        let now = self.state.now();
        let deadline = match end_time {
            Some(end_time) => end_time,
            None if seconds > 0 => now
                .checked_add(duration_millis(seconds)?)
                .ok_or_else(|| TimerError::InvalidInput("deadline out of range".to_string()))?,
            None => {
                return Err(TimerError::InvalidInput(
                    "start-timer needs a positive duration".to_string(),
                ))
            }
        };
        info!("Scheduling deadline in {}s", (deadline - now).max(0) / 1000);
        Ok(self.alarms.create(DONE_ALARM, delay_minutes(now, deadline)))
    }

    /// Finalise the timer when its alarm fires.
    ///
    /// Order: sound, notification, persisted record, badge, panel push, and
    /// a fresh panel when nobody received the push. Sound runs on its own
    /// task so a slow or missing helper never delays the rest.
    pub async fn on_alarm(&self, alarm: &Alarm) -> Result<Completion> {
        if alarm.name != DONE_ALARM {
            return Ok(Completion::Ignored);
        }

        let deadline = alarm.scheduled_time;
        let complete = TimerCommand::Complete { deadline };
        let current = self.state.record()?.state();
        match current.apply(complete, self.state.now()) {
            Ok(_) if current == TimerState::Finished => {
                debug!("Deadline {} already finalised", deadline);
                return Ok(Completion::AlreadyFinished);
            }
            Ok(_) => {}
            Err(e @ TimerError::StaleDeadline { .. }) => {
                info!("Ignoring alarm: {}", e);
                // the fired alarm is spent; a deadline moved by a lost
                // message still needs one
                if self.alarms.scheduled(DONE_ALARM) == Some(deadline) {
                    self.alarms.clear(DONE_ALARM);
                }
                if let Err(e) = self.reconcile_alarm() {
                    warn!("Failed to re-arm alarm: {}", e);
                }
                return Ok(Completion::Stale);
            }
            Err(e) => return Err(e),
        }

        info!("Timer finished");
        self.state.note_action("timer-finished");

        let audio = Arc::clone(&self.audio);
        tokio::spawn(async move { audio.play_ding().await });

        self.notifier.notify(&self.notification);

        match self.state.transition(complete) {
            Ok(_) => {}
            Err(e) if e.is_rejection() => {
                warn!("Timer changed while finishing: {}", e);
                return Ok(Completion::Interrupted);
            }
            Err(e) => return Err(e),
        }

        self.state.badge.clear();
        let reached = self.state.push(Message::TimerFinished);
        if reached == 0 {
            if let Some(launcher) = &self.launcher {
                launcher.open();
            }
        }
        Ok(Completion::Finished)
    }

    /// Deadline of a pending alarm
    pub fn alarm(&self, name: &str) -> Option<i64> {
        self.alarms.scheduled(name)
    }

    /// Bring the alarm in line with the stored record: re-arm a running
    /// timer whose alarm is missing or points elsewhere, drop an alarm the
    /// record no longer needs. Returns the deadline now armed.
    pub fn reconcile_alarm(&self) -> Result<Option<i64>> {
        let state = self.state.record()?.state();
        let scheduled = self.alarms.scheduled(DONE_ALARM);

        match state {
            TimerState::Running { end_time, .. } => {
                let aligned = scheduled.is_some_and(|at| same_deadline(at, end_time));
                if aligned {
                    return Ok(scheduled);
                }
                info!("Re-arming alarm for stored deadline {}", end_time);
                Ok(Some(self.schedule(0, Some(end_time))?))
            }
            _ => {
                if scheduled.is_some() && self.alarms.clear(DONE_ALARM) {
                    debug!("Dropped alarm for a timer that is {}", state.name());
                }
                Ok(None)
            }
        }
    }
}
