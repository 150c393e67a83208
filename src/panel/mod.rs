//! The transient panel
//!
//! A panel lives only while the user looks at it. It rebuilds everything
//! from the store on open and on each tick, turns user actions into one
//! complete store write, and tells the daemon about new deadlines.

pub mod client;
pub mod session;
pub mod view;

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use tracing::{debug, info};

use crate::{
    error::Result,
    messages::{deliver, Message, Outbox},
    state::{TimerCommand, TimerState},
    store::{self, TimerStore},
    utils::Clock,
};

pub use client::HttpOutbox;
pub use view::{parse_duration, Phase, PanelView};

/// Default wait past a deadline before the panel finalises the record itself
pub const DEFAULT_FINALIZE_GRACE_MS: i64 = 2_000;

pub struct Panel {
    store: Arc<dyn TimerStore>,
    clock: Arc<dyn Clock>,
    outbox: Arc<dyn Outbox>,
    finalize_grace_ms: i64,
    ticking: AtomicBool,
}

/// Clears the tick flag when a tick ends, however it ends
struct TickGuard<'a>(&'a AtomicBool);

impl<'a> TickGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for TickGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Panel {
    pub fn new(store: Arc<dyn TimerStore>, clock: Arc<dyn Clock>, outbox: Arc<dyn Outbox>) -> Self {
        Self {
            store,
            clock,
            outbox,
            finalize_grace_ms: DEFAULT_FINALIZE_GRACE_MS,
            ticking: AtomicBool::new(false),
        }
    }

    pub fn with_finalize_grace(mut self, grace_ms: i64) -> Self {
        self.finalize_grace_ms = grace_ms.max(0);
        self
    }

    fn apply(&self, command: TimerCommand) -> Result<TimerState> {
        let (_, next) = store::transition(self.store.as_ref(), command, self.clock.now_millis())?;
        Ok(next)
    }

    /// Ask the daemon to arm its alarm for a freshly written deadline
    async fn announce(&self, state: TimerState) {
        if let TimerState::Running {
            end_time, remaining, ..
        } = state
        {
            let message = Message::StartTimer {
                seconds: remaining,
                end_time: Some(end_time),
            };
            if !deliver(self.outbox.as_ref(), message).await {
                info!("Daemon not reachable; it will pick the deadline up from the store");
            }
        }
    }

    /// Start from typed input, or resume a paused remainder, which wins over the input
    pub async fn start(&self, input: &str) -> Result<PanelView> {
        let seconds = parse_duration(input);
        let next = self.apply(TimerCommand::Start { seconds })?;
        info!("Timer started for {}s", next.remaining_at(self.clock.now_millis()));
        self.announce(next).await;
        self.view()
    }

    /// Freeze the remaining time
    pub async fn pause(&self) -> Result<PanelView> {
        let next = self.apply(TimerCommand::Pause)?;
        info!("Timer paused with {}s left", next.remaining_at(self.clock.now_millis()));
        self.view()
    }

    /// The start/pause button
    pub async fn toggle(&self, input: &str) -> Result<PanelView> {
        match self.store.get()?.state() {
            TimerState::Running { .. } => self.pause().await,
            _ => self.start(input).await,
        }
    }

    /// Add time, moving the deadline when running
    pub async fn add_time(&self, seconds: u64) -> Result<PanelView> {
        let next = self.apply(TimerCommand::AddTime { seconds })?;
        info!("Added {}s", seconds);
        self.announce(next).await;
        self.view()
    }

    /// Back to install defaults
    pub fn reset(&self) -> Result<PanelView> {
        self.apply(TimerCommand::Reset)?;
        info!("Timer reset");
        self.view()
    }

    /// Leave the finished view
    pub fn new_timer(&self) -> Result<PanelView> {
        self.apply(TimerCommand::NewTimer)?;
        self.view()
    }

    /// Preview typed input on an idle timer
    pub fn set_input(&self, input: &str) -> Result<PanelView> {
        self.apply(TimerCommand::SetInput {
            seconds: parse_duration(input),
        })?;
        self.view()
    }

    /// Current view, reconciled from the store
    pub fn view(&self) -> Result<PanelView> {
        let state = self.store.get()?.state();
        Ok(PanelView::derive(state, self.clock.now_millis()))
    }

    /// Periodic refresh. Returns `None` when another tick is still running.
    ///
    /// A deadline that passed while nobody finalised it shows as finished at
    /// once; once it is older than the grace period the panel finalises the
    /// record itself, with the same transition the daemon uses.
    pub fn tick(&self) -> Result<Option<PanelView>> {
        let Some(_guard) = TickGuard::acquire(&self.ticking) else {
            debug!("Skipping overlapping tick");
            return Ok(None);
        };

        let now = self.clock.now_millis();
        let state = self.store.get()?.state();
        if let TimerState::Running { end_time, .. } = state {
            if now - end_time >= self.finalize_grace_ms {
                match store::transition(
                    self.store.as_ref(),
                    TimerCommand::Complete { deadline: end_time },
                    now,
                ) {
                    Ok(_) => info!("Deadline passed without the daemon, finished from the panel"),
                    Err(e) if e.is_rejection() => debug!("Timer changed under the panel: {}", e),
                    Err(e) => return Err(e),
                }
            }
        }

        self.view().map(Some)
    }

    /// React to a push from the daemon
    pub fn on_message(&self, message: Message) -> Result<Option<PanelView>> {
        match message {
            Message::TimerFinished => self.view().map(Some),
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        messages::Bus,
        state::TimerRecord,
        store::MemoryStore,
        utils::ManualClock,
    };

    const T0: i64 = 1_700_000_000_000;

    fn panel() -> (Panel, MemoryStore, Arc<ManualClock>, Bus) {
        let store = MemoryStore::new();
        let clock = Arc::new(ManualClock::new(T0));
        let bus = Bus::default();
        let panel = Panel::new(Arc::new(store.clone()), clock.clone(), Arc::new(bus.clone()));
        (panel, store, clock, bus)
    }

    #[tokio::test]
    async fn start_persists_and_announces() {
        let (panel, store, _clock, bus) = panel();
        let mut daemon = bus.subscribe();

        let view = panel.start("1:00").await.unwrap();
        assert_eq!(view.phase, Phase::Running);
        assert_eq!(view.display, "1:00");

        let record = store.get().unwrap();
        assert_eq!(record.end_time, Some(T0 + 60_000));
        assert_eq!(record.total, 60);
        assert_eq!(
            daemon.recv().await.unwrap(),
            Message::StartTimer {
                seconds: 60,
                end_time: Some(T0 + 60_000)
            }
        );
    }

    #[tokio::test]
    async fn invalid_input_changes_nothing() {
        let (panel, store, _clock, bus) = panel();
        let mut daemon = bus.subscribe();

        assert!(panel.start("later").await.is_err());
        assert_eq!(store.get().unwrap(), TimerRecord::new());
        assert!(daemon.try_recv().is_err());
    }

    #[tokio::test]
    async fn oversized_input_is_rejected_without_touching_the_store() {
        let (panel, store, _clock, bus) = panel();
        let mut daemon = bus.subscribe();

        for input in ["10000000000000000", "99999999999999999999", "99999999999:00"] {
            let err = panel.start(input).await.unwrap_err();
            assert!(matches!(err, crate::error::TimerError::InvalidInput(_)));
        }
        assert!(panel.set_input("10000000000000000").is_err());
        assert_eq!(store.get().unwrap(), TimerRecord::new());
        assert!(daemon.try_recv().is_err());

        panel.start("30").await.unwrap();
        let before = store.get().unwrap();
        assert!(panel.add_time(parse_duration("1e20")).await.is_err());
        assert_eq!(store.get().unwrap(), before);
    }

    #[tokio::test]
    async fn start_succeeds_with_no_daemon_listening() {
        let (panel, store, _clock, _bus) = panel();
        panel.start("30").await.unwrap();
        assert!(store.get().unwrap().running);
    }

    #[tokio::test]
    async fn pause_then_resume_keeps_remainder() {
        let (panel, store, clock, _bus) = panel();
        panel.start("60").await.unwrap();
        clock.advance_secs(10);

        let paused = panel.pause().await.unwrap();
        assert_eq!(paused.phase, Phase::Idle);
        assert_eq!(paused.remaining, 50);
        assert_eq!(store.get().unwrap().end_time, None);

        clock.advance_secs(30);
        let resumed = panel.toggle("60").await.unwrap();
        assert_eq!(resumed.phase, Phase::Running);
        assert!((49..=51).contains(&resumed.remaining));
        assert_eq!(store.get().unwrap().total, 60);
    }

    #[tokio::test]
    async fn add_time_while_running_reannounces() {
        let (panel, store, clock, bus) = panel();
        panel.start("30").await.unwrap();
        let mut daemon = bus.subscribe();
        clock.advance_secs(5);

        panel.add_time(15).await.unwrap();
        let record = store.get().unwrap();
        assert_eq!(record.end_time, Some(T0 + 45_000));
        assert_eq!(record.total, 45);
        assert_eq!(
            daemon.recv().await.unwrap(),
            Message::StartTimer {
                seconds: 40,
                end_time: Some(T0 + 45_000)
            }
        );
    }

    #[tokio::test]
    async fn set_input_previews_duration() {
        let (panel, store, _clock, _bus) = panel();
        let view = panel.set_input("2:30").unwrap();
        assert_eq!(view.display, "2:30");
        assert_eq!(store.get().unwrap().total, 150);
    }

    #[tokio::test]
    async fn tick_shows_finished_then_finalises_after_grace() {
        let (panel, store, clock, _bus) = panel();
        panel.start("5").await.unwrap();

        clock.advance_secs(5);
        let view = panel.tick().unwrap().unwrap();
        assert_eq!(view.phase, Phase::Finished);
        // the daemon still gets its chance to finish first
        assert!(store.get().unwrap().running);

        clock.advance_millis(DEFAULT_FINALIZE_GRACE_MS);
        panel.tick().unwrap();
        assert_eq!(store.get().unwrap(), TimerRecord::finished());
    }

    #[test]
    fn overlapping_tick_is_skipped() {
        let (panel, _store, _clock, _bus) = panel();
        let held = TickGuard::acquire(&panel.ticking).unwrap();
        assert!(panel.tick().unwrap().is_none());
        drop(held);
        assert!(panel.tick().unwrap().is_some());
    }

    #[test]
    fn finished_push_reconciles_view() {
        let (panel, store, _clock, _bus) = panel();
        store.set(&TimerRecord::finished()).unwrap();
        let view = panel.on_message(Message::TimerFinished).unwrap().unwrap();
        assert_eq!(view.phase, Phase::Finished);
        assert!(panel.on_message(Message::PlayDing).unwrap().is_none());

        let fresh = panel.new_timer().unwrap();
        assert_eq!(fresh.phase, Phase::Idle);
        assert_eq!(store.get().unwrap(), TimerRecord::new());
    }
}
