//! On-demand audio helper
//!
//! The daemon never plays sound itself. It starts a helper task on first
//! use and hands it `play-ding` requests over the helper's own bus.

use std::{
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};

use tokio::{sync::broadcast::error::RecvError, task::JoinHandle, time::sleep};
use tracing::{debug, info, warn};

use crate::{
    error::TimerError,
    messages::{Bus, Message},
    services::SoundSink,
};

/// Wait before the single retry when the helper is not listening yet
pub const RETRY_DELAY: Duration = Duration::from_millis(300);

/// The helper: plays a sound for every `play-ding` it receives
pub struct AudioPlayer {
    sink: Arc<dyn SoundSink>,
}

impl AudioPlayer {
    pub fn new(sink: Arc<dyn SoundSink>) -> Self {
        Self { sink }
    }

    pub async fn run(self, bus: Bus) {
        let mut rx = bus.subscribe();
        debug!("Audio helper listening");
        loop {
            match rx.recv().await {
                Ok(Message::PlayDing) => {
                    if let Err(e) = self.sink.play().await {
                        warn!("Audio play failed: {}", e);
                    }
                }
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    debug!("Audio helper skipped {} requests", skipped);
                }
                Err(RecvError::Closed) => break,
            }
        }
    }
}

/// Daemon-side handle that creates the helper when needed and dispatches to it
pub struct AudioBridge {
    bus: Bus,
    sink: Arc<dyn SoundSink>,
    helper: Mutex<Option<JoinHandle<()>>>,
}

impl AudioBridge {
    pub fn new(sink: Arc<dyn SoundSink>) -> Self {
        Self {
            bus: Bus::new(8),
            sink,
            helper: Mutex::new(None),
        }
    }

    /// Start the helper unless it is already running; returns whether it was started
    pub fn ensure_helper(&self) -> bool {
        let mut helper = self.helper.lock().unwrap_or_else(PoisonError::into_inner);
        if helper.as_ref().is_some_and(|h| !h.is_finished()) {
            return false;
        }

        let player = AudioPlayer::new(Arc::clone(&self.sink));
        let bus = self.bus.clone();
        *helper = Some(tokio::spawn(player.run(bus)));
        info!("Audio helper started");
        true
    }

    /// Ask the helper for the completion sound. Failures are logged, never returned.
    pub async fn play_ding(&self) {
        if let Err(e) = self.request() {
            debug!("{}, retrying in {:?}", e, RETRY_DELAY);
            sleep(RETRY_DELAY).await;
            if let Err(e) = self.request() {
                warn!("Giving up on completion sound: {}", e);
            }
        }
    }

    fn request(&self) -> Result<(), TimerError> {
        self.ensure_helper();
        self.bus
            .send(Message::PlayDing)
            .map(|_| ())
            .map_err(|_| TimerError::PlaybackUnavailable("helper is not listening yet".to_string()))
    }

    pub fn is_running(&self) -> bool {
        self.helper
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|h| !h.is_finished())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::future::{BoxFuture, FutureExt};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingSink {
        plays: AtomicUsize,
        fail: bool,
    }

    impl SoundSink for CountingSink {
        fn play(&self) -> BoxFuture<'_, Result<(), String>> {
            self.plays.fetch_add(1, Ordering::SeqCst);
            let result = if self.fail {
                Err("no audio device".to_string())
            } else {
                Ok(())
            };
            async move { result }.boxed()
        }
    }

    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn first_request_starts_helper_and_retries_once() {
        let sink = Arc::new(CountingSink::default());
        let bridge = AudioBridge::new(sink.clone());
        assert!(!bridge.is_running());

        bridge.play_ding().await;
        settle().await;

        assert!(bridge.is_running());
        assert_eq!(sink.plays.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn helper_creation_is_idempotent() {
        let sink = Arc::new(CountingSink::default());
        let bridge = AudioBridge::new(sink.clone());
        assert!(bridge.ensure_helper());
        assert!(!bridge.ensure_helper());
        settle().await;

        bridge.play_ding().await;
        bridge.play_ding().await;
        settle().await;
        assert_eq!(sink.plays.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn playback_errors_do_not_escape() {
        let sink = Arc::new(CountingSink {
            plays: AtomicUsize::new(0),
            fail: true,
        });
        let bridge = AudioBridge::new(sink.clone());
        bridge.play_ding().await;
        settle().await;
        assert_eq!(sink.plays.load(Ordering::SeqCst), 1);
        assert!(bridge.is_running());
    }
}
