//! State management module
//!
//! The persisted record, the state machine that moves it, and the shared
//! state of the daemon.

pub mod app_state;
pub mod record;
pub mod timer_state;

// Re-export main types
pub use app_state::AppState;
pub use record::TimerRecord;
pub use timer_state::{
    duration_millis, remaining_until, same_deadline, TimerCommand, TimerState,
    DEADLINE_TOLERANCE_MS, MAX_DURATION_SECS,
};
