//! Icon badge showing the live countdown

use std::{
    fs,
    path::PathBuf,
    sync::{Mutex, PoisonError},
};

use serde::Serialize;
use tracing::{debug, warn};

use crate::state::TimerRecord;

/// Badge background colour (naval blue)
pub const BADGE_COLOR: &str = "#3b4cca";

/// Compact countdown text: `m:ss` from one minute up, `Ns` below
pub fn badge_text(seconds: u64) -> String {
    if seconds >= 60 {
        format!("{}:{:02}", seconds / 60, seconds % 60)
    } else {
        format!("{}s", seconds)
    }
}

/// Badge text for a record at `now`; `None` means the badge is cleared.
/// Remaining time is always derived from the deadline, never cached.
pub fn badge_for(record: &TimerRecord, now: i64) -> Option<String> {
    let state = record.state();
    state.deadline()?;
    match state.remaining_at(now) {
        0 => None,
        left => Some(badge_text(left)),
    }
}

/// Where badge text ends up
pub trait BadgeSurface: Send + Sync {
    fn show(&self, text: &str, color: &str) -> Result<(), String>;
    fn clear(&self) -> Result<(), String>;
}

/// Logs badge changes
#[derive(Debug, Default)]
pub struct LogBadge;

impl BadgeSurface for LogBadge {
    fn show(&self, text: &str, _color: &str) -> Result<(), String> {
        debug!("Badge: {}", text);
        Ok(())
    }

    fn clear(&self) -> Result<(), String> {
        debug!("Badge cleared");
        Ok(())
    }
}

#[derive(Serialize)]
struct BadgeFile<'a> {
    text: &'a str,
    color: &'a str,
}

/// Writes the badge as JSON for status bars to pick up
#[derive(Debug)]
pub struct FileBadge {
    path: PathBuf,
}

impl FileBadge {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn write(&self, text: &str, color: &str) -> Result<(), String> {
        let body = serde_json::to_string(&BadgeFile { text, color })
            .map_err(|e| format!("Failed to encode badge: {}", e))?;
        fs::write(&self.path, body)
            .map_err(|e| format!("Failed to write badge file {}: {}", self.path.display(), e))
    }
}

impl BadgeSurface for FileBadge {
    fn show(&self, text: &str, color: &str) -> Result<(), String> {
        self.write(text, color)
    }

    fn clear(&self) -> Result<(), String> {
        self.write("", BADGE_COLOR)
    }
}

/// Renders the record onto a badge surface, touching it only when the text changes
pub struct BadgeRenderer {
    surface: Box<dyn BadgeSurface>,
    current: Mutex<Option<String>>,
}

impl BadgeRenderer {
    pub fn new(surface: Box<dyn BadgeSurface>) -> Self {
        Self {
            surface,
            current: Mutex::new(None),
        }
    }

    /// Update the badge from the record; returns the text now shown
    pub fn render(&self, record: &TimerRecord, now: i64) -> Option<String> {
        let text = badge_for(record, now);
        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        if *current == text {
            return text;
        }

        let result = match &text {
            Some(t) => self.surface.show(t, BADGE_COLOR),
            None => self.surface.clear(),
        };
        match result {
            Ok(()) => *current = text.clone(),
            Err(e) => warn!("Failed to update badge: {}", e),
        }
        text
    }

    pub fn clear(&self) {
        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        match self.surface.clear() {
            Ok(()) => *current = None,
            Err(e) => warn!("Failed to clear badge: {}", e),
        }
    }

    /// Text currently on the badge
    pub fn text(&self) -> Option<String> {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
