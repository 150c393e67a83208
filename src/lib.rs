//! Better Timer - one countdown shared by a daemon, panels and an audio helper
//!
//! None of the contexts runs all the time. They agree on the timer through
//! a single persisted record and use messages only to cut latency.

pub mod api;
pub mod audio;
pub mod config;
pub mod controller;
pub mod error;
pub mod messages;
pub mod panel;
pub mod services;
pub mod state;
pub mod store;
pub mod tasks;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use controller::Controller;
pub use error::TimerError;
pub use panel::Panel;
pub use state::{AppState, TimerRecord, TimerState};
pub use store::TimerStore;
pub use api::create_router;
pub use utils::signals::shutdown_signal;
