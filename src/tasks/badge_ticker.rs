//! 1 Hz badge refresh

use std::{sync::Arc, time::Duration};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{info, warn};

use crate::state::AppState;

pub const BADGE_INTERVAL: Duration = Duration::from_secs(1);

/// Background task that redraws the badge every second from the stored
/// deadline and the wall clock. Nothing is carried between ticks, so a
/// daemon resumed after suspension shows the right value on its first tick.
pub async fn badge_ticker_task(state: Arc<AppState>) {
    info!("Starting badge ticker");

    let mut ticker = interval(BADGE_INTERVAL);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;
        match state.record() {
            Ok(record) => {
                state.badge.render(&record, state.now());
            }
            Err(e) => warn!("Failed to read timer for badge: {}", e),
        }
    }
}
