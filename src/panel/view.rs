//! What the panel shows, derived from the record alone

use std::f64::consts::PI;

use serde::Serialize;

use crate::state::TimerState;

/// Radius of the progress ring
pub const RING_RADIUS: f64 = 80.0;

/// Circumference of the progress ring
pub fn ring_circumference() -> f64 {
    2.0 * PI * RING_RADIUS
}

/// Fraction of the timer still left, clamped to `[0, 1]`; an empty timer is 0
pub fn progress_fraction(remaining: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (remaining as f64 / total as f64).clamp(0.0, 1.0)
}

/// Stroke offset for a ring of `circumference`: 0 is a full ring, the
/// whole circumference an empty one
pub fn ring_offset(circumference: f64, remaining: u64, total: u64) -> f64 {
    if total == 0 {
        return circumference;
    }
    circumference * (1.0 - progress_fraction(remaining, total))
}

/// Parse a typed duration: `m:ss` or plain seconds. Anything unreadable is 0.
pub fn parse_duration(input: &str) -> u64 {
    let input = input.trim();
    if input.is_empty() {
        return 0;
    }
    if let Some((minutes, seconds)) = input.split_once(':') {
        let minutes = minutes.trim().parse::<u64>().unwrap_or(0);
        let seconds = seconds.trim().parse::<u64>().unwrap_or(0);
        return minutes.saturating_mul(60).saturating_add(seconds);
    }
    match input.parse::<f64>() {
        Ok(seconds) if seconds.is_finite() && seconds > 0.0 => seconds.floor() as u64,
        _ => 0,
    }
}

/// `m:ss` clock text
pub fn format_clock(seconds: u64) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Idle,
    Running,
    Finished,
}

/// Everything the panel draws
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PanelView {
    pub phase: Phase,
    pub remaining: u64,
    pub total: u64,
    pub display: String,
    pub progress: f64,
    pub ring_offset: f64,
}

impl PanelView {
    /// Derive the view at `now`. A running timer whose deadline already
    /// passed shows as finished even before anyone finalised the record.
    pub fn derive(state: TimerState, now: i64) -> Self {
        let phase = match state {
            TimerState::Finished => Phase::Finished,
            s if s.is_expired(now) => Phase::Finished,
            TimerState::Running { .. } => Phase::Running,
            TimerState::Idle { .. } => Phase::Idle,
        };
        let (remaining, total) = match phase {
            Phase::Finished => (0, 0),
            _ => (state.remaining_at(now), state.total()),
        };

        Self {
            phase,
            remaining,
            total,
            display: format_clock(remaining),
            progress: progress_fraction(remaining, total),
            ring_offset: ring_offset(ring_circumference(), remaining, total),
        }
    }

    /// Label of the start/pause button
    pub fn button(&self) -> &'static str {
        match self.phase {
            Phase::Running => "⏸",
            _ => "▶",
        }
    }

    /// One-line text rendering for terminals
    pub fn render(&self) -> String {
        match self.phase {
            Phase::Finished => "⏰ Time's up!  [n] new timer".to_string(),
            _ => {
                const WIDTH: usize = 20;
                let filled = (self.progress * WIDTH as f64).round() as usize;
                format!(
                    "{} {}  [{}{}]",
                    self.button(),
                    self.display,
                    "█".repeat(filled),
                    "░".repeat(WIDTH - filled)
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_typed_durations() {
        assert_eq!(parse_duration("90"), 90);
        assert_eq!(parse_duration("1:30"), 90);
        assert_eq!(parse_duration(" 2:05 "), 125);
        assert_eq!(parse_duration("5:"), 300);
        assert_eq!(parse_duration(":45"), 45);
        assert_eq!(parse_duration("12.7"), 12);
        assert_eq!(parse_duration(""), 0);
        assert_eq!(parse_duration("soon"), 0);
        assert_eq!(parse_duration("-10"), 0);
    }

    #[test]
    fn formats_clock() {
        assert_eq!(format_clock(0), "0:00");
        assert_eq!(format_clock(59), "0:59");
        assert_eq!(format_clock(3_725), "62:05");
    }

    #[test]
    fn ring_offset_tracks_progress() {
        let c = ring_circumference();
        assert_eq!(ring_offset(c, 0, 0), c);
        assert_eq!(ring_offset(c, 60, 60), 0.0);
        assert!((ring_offset(c, 30, 60) - c / 2.0).abs() < 1e-9);
        // a remaining above total never draws past a full ring
        assert_eq!(ring_offset(c, 90, 60), 0.0);
    }

    #[test]
    fn expired_running_timer_shows_finished() {
        let state = TimerState::Running {
            end_time: 10_000,
            total: 10,
            remaining: 10,
        };
        assert_eq!(PanelView::derive(state, 5_000).phase, Phase::Running);
        let view = PanelView::derive(state, 10_000);
        assert_eq!(view.phase, Phase::Finished);
        assert_eq!(view.remaining, 0);
        assert_eq!(view.ring_offset, ring_circumference());
    }

    #[test]
    fn idle_view_reads_stored_remaining() {
        let view = PanelView::derive(
            TimerState::Idle {
                remaining: 45,
                total: 90,
            },
            0,
        );
        assert_eq!(view.phase, Phase::Idle);
        assert_eq!(view.display, "0:45");
        assert_eq!(view.progress, 0.5);
        assert_eq!(view.button(), "▶");
        assert!(view.render().starts_with("▶ 0:45"));
    }
}
