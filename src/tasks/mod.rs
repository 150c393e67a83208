//! Background tasks module
//!
//! This module contains background tasks that run alongside the HTTP server.

pub mod alarm_listener;
pub mod alarm_recovery;
pub mod badge_ticker;

// Re-export main functions
pub use alarm_listener::alarm_listener_task;
pub use alarm_recovery::alarm_recovery_task;
pub use badge_ticker::badge_ticker_task;
