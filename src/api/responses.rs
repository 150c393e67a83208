//! API response structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{panel::PanelView, state::TimerRecord};

/// Reply to a posted message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse {
    pub status: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl ApiResponse {
    /// Create a new API response
    pub fn new(status: &str, message: String) -> Self {
        Self {
            status: status.to_string(),
            message,
            timestamp: Utc::now(),
        }
    }

    /// The message was acted on
    pub fn accepted(message: String) -> Self {
        Self::new("accepted", message)
    }

    /// The message was valid JSON but could not be acted on
    pub fn rejected(message: String) -> Self {
        Self::new("rejected", message)
    }
}

/// Daemon status: the raw record, what a panel would show, and the badge
#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    pub record: TimerRecord,
    pub view: PanelView,
    pub badge: Option<String>,
    pub alarm: Option<i64>,
    pub uptime: String,
    pub port: u16,
    pub host: String,
    pub last_action: Option<String>,
    pub last_action_time: Option<DateTime<Utc>>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

impl HealthResponse {
    /// Create a new health response
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
