//! Error taxonomy shared by the daemon and the panel

use thiserror::Error;

/// Errors raised by timer transitions, the store and inter-context delivery
#[derive(Error, Debug)]
pub enum TimerError {
    #[error("invalid duration: {0}")]
    InvalidInput(String),

    #[error("cannot {command} while {state}")]
    InvalidTransition {
        state: &'static str,
        command: &'static str,
    },

    #[error("stale deadline {deadline}: active deadline is {active:?}")]
    StaleDeadline { deadline: i64, active: Option<i64> },

    #[error("audio surface unavailable: {0}")]
    PlaybackUnavailable(String),

    #[error("message not delivered: {0}")]
    DeliveryFailed(String),

    #[error("store i/o failed: {0}")]
    StoreIo(#[from] std::io::Error),

    #[error("store record is malformed: {0}")]
    StoreFormat(#[from] serde_json::Error),
}

impl TimerError {
    /// Whether the error only reflects a rejected user action and left the store untouched
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::InvalidInput(_) | Self::InvalidTransition { .. } | Self::StaleDeadline { .. }
        )
    }
}

pub type Result<T, E = TimerError> = std::result::Result<T, E>;
