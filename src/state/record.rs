//! The persisted timer record shared by every context

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::TimerState;

/// Flat record as stored on disk. Field names follow the persisted layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TimerRecord {
    /// Timer actively counting down
    pub running: bool,
    /// Absolute deadline in epoch milliseconds, present only while running
    pub end_time: Option<i64>,
    /// Seconds left when paused or not started
    pub remaining: u64,
    /// Duration basis for progress scaling
    pub total: u64,
    /// Set on deadline completion, cleared by reset or a new timer
    pub timer_finished: bool,
}

impl TimerRecord {
    /// Install defaults, also what reset restores
    pub fn new() -> Self {
        Self {
            running: false,
            end_time: None,
            remaining: 0,
            total: 0,
            timer_finished: false,
        }
    }

    /// The finalised record written when a deadline completes
    pub fn finished() -> Self {
        Self {
            timer_finished: true,
            ..Self::new()
        }
    }

    /// Read the record as an explicit state, repairing contradictory combinations
    pub fn state(&self) -> TimerState {
        if self.timer_finished && !self.running {
            return TimerState::Finished;
        }

        match (self.running, self.end_time) {
            (true, Some(end_time)) => TimerState::Running {
                end_time,
                total: self.total.max(self.remaining),
                remaining: self.remaining,
            },
            (true, None) => {
                warn!("Stored record is running without a deadline, reading it as paused");
                TimerState::Idle {
                    remaining: self.remaining,
                    total: self.total.max(self.remaining),
                }
            }
            (false, _) => TimerState::Idle {
                remaining: self.remaining,
                total: self.total.max(self.remaining),
            },
        }
    }
}

impl Default for TimerRecord {
    fn default() -> Self {
        Self::new()
    }
}

impl From<TimerState> for TimerRecord {
    fn from(state: TimerState) -> Self {
        match state {
            TimerState::Idle { remaining, total } => Self {
                remaining,
                total,
                ..Self::new()
            },
            TimerState::Running {
                end_time,
                total,
                remaining,
            } => Self {
                running: true,
                end_time: Some(end_time),
                remaining,
                total,
                timer_finished: false,
            },
            TimerState::Finished => Self::finished(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialises_with_persisted_field_names() {
        let record = TimerRecord {
            running: true,
            end_time: Some(1_700_000_000_000),
            remaining: 60,
            total: 60,
            timer_finished: false,
        };
        let json = serde_json::to_value(record).unwrap();
        assert_eq!(json["endTime"], 1_700_000_000_000i64);
        assert_eq!(json["timerFinished"], false);
        assert_eq!(json["running"], true);
    }

    #[test]
    fn missing_fields_read_as_defaults() {
        let record: TimerRecord =
            serde_json::from_str(r#"{"running":false,"remaining":0,"total":0,"timerFinished":false}"#)
                .unwrap();
        assert_eq!(record, TimerRecord::new());
    }

    #[test]
    fn running_without_deadline_reads_as_idle() {
        let record = TimerRecord {
            running: true,
            end_time: None,
            remaining: 12,
            total: 30,
            timer_finished: false,
        };
        assert_eq!(record.state(), TimerState::Idle { remaining: 12, total: 30 });
    }

    #[test]
    fn total_never_reads_below_remaining() {
        let record = TimerRecord {
            remaining: 90,
            total: 10,
            ..TimerRecord::new()
        };
        assert_eq!(record.state(), TimerState::Idle { remaining: 90, total: 90 });
    }

    #[test]
    fn state_round_trips_through_record() {
        let running = TimerState::Running {
            end_time: 5_000,
            total: 30,
            remaining: 30,
        };
        assert_eq!(TimerRecord::from(running).state(), running);
        assert_eq!(TimerRecord::from(TimerState::Finished), TimerRecord::finished());
    }
}
