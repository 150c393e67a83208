//! Explicit timer state machine
//!
//! Every writer, panel or daemon, derives the next record by reading the
//! current one, turning it into a [`TimerState`] and applying a single
//! [`TimerCommand`]. The result is always a complete record, never a patch.

use crate::error::{Result, TimerError};

/// Window inside which an alarm's deadline is taken to be the stored one.
/// Alarms are scheduled in fractional minutes; the conversion is exact to the
/// millisecond, so this only absorbs clock reads between scheduling steps and
/// stays well below the smallest amount of time a user can add.
pub const DEADLINE_TOLERANCE_MS: i64 = 250;

/// Longest duration a timer accepts: one year
pub const MAX_DURATION_SECS: u64 = 365 * 24 * 60 * 60;

/// The three states a timer can be in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerState {
    /// Not counting; `remaining` is authoritative
    Idle { remaining: u64, total: u64 },
    /// Counting down to `end_time`; `remaining` is the snapshot taken at start
    Running {
        end_time: i64,
        total: u64,
        remaining: u64,
    },
    /// The deadline completed and nobody has started a new timer yet
    Finished,
}

/// User and daemon actions that move the timer between states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerCommand {
    Start { seconds: u64 },
    Pause,
    AddTime { seconds: u64 },
    Reset,
    NewTimer,
    SetInput { seconds: u64 },
    Complete { deadline: i64 },
}

impl TimerCommand {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Start { .. } => "start",
            Self::Pause => "pause",
            Self::AddTime { .. } => "add time",
            Self::Reset => "reset",
            Self::NewTimer => "start a new timer",
            Self::SetInput { .. } => "set the duration",
            Self::Complete { .. } => "complete",
        }
    }
}

/// Whole seconds left before `end_time`, rounded up; zero exactly when `now >= end_time`
pub fn remaining_until(end_time: i64, now: i64) -> u64 {
    if now >= end_time {
        0
    } else {
        let left = end_time.saturating_sub(now) as u64;
        left / 1000 + u64::from(left % 1000 != 0)
    }
}

/// Whether an alarm scheduled for `at` belongs to the deadline `end_time`
pub fn same_deadline(at: i64, end_time: i64) -> bool {
    at.abs_diff(end_time) < DEADLINE_TOLERANCE_MS as u64
}

/// Check a duration against [`MAX_DURATION_SECS`]
pub fn bounded(seconds: u64) -> Result<u64> {
    if seconds > MAX_DURATION_SECS {
        Err(TimerError::InvalidInput(format!(
            "{}s is longer than the {}s limit",
            seconds, MAX_DURATION_SECS
        )))
    } else {
        Ok(seconds)
    }
}

/// `seconds` in milliseconds, for a bounded duration
pub fn duration_millis(seconds: u64) -> Result<i64> {
    Ok(bounded(seconds)? as i64 * 1000)
}

fn grow(current: u64, seconds: u64) -> Result<u64> {
    bounded(current.saturating_add(seconds))
}

impl TimerState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle { .. } => "idle",
            Self::Running { .. } => "running",
            Self::Finished => "finished",
        }
    }

    /// Seconds left at `now`, derived from the deadline while running
    pub fn remaining_at(&self, now: i64) -> u64 {
        match *self {
            Self::Idle { remaining, .. } => remaining,
            Self::Running { end_time, .. } => remaining_until(end_time, now),
            Self::Finished => 0,
        }
    }

    pub fn total(&self) -> u64 {
        match *self {
            Self::Idle { total, .. } | Self::Running { total, .. } => total,
            Self::Finished => 0,
        }
    }

    pub fn deadline(&self) -> Option<i64> {
        match *self {
            Self::Running { end_time, .. } => Some(end_time),
            _ => None,
        }
    }

    /// Running with a deadline that has already passed
    pub fn is_expired(&self, now: i64) -> bool {
        matches!(*self, Self::Running { end_time, .. } if now >= end_time)
    }

    /// Apply one command, validating that it is allowed from the current state
    pub fn apply(self, command: TimerCommand, now: i64) -> Result<TimerState> {
        let rejected = || TimerError::InvalidTransition {
            state: self.name(),
            command: command.name(),
        };

        match (self, command) {
            (Self::Idle { remaining, total }, TimerCommand::Start { seconds }) => {
                // A paused remainder wins over whatever was typed
                let (duration, total) = if remaining > 0 {
                    (remaining, total.max(remaining))
                } else {
                    (seconds, seconds)
                };
                Self::start(duration, total, now)
            }
            (Self::Finished, TimerCommand::Start { seconds }) => Self::start(seconds, seconds, now),
            (Self::Running { .. }, TimerCommand::Start { .. }) => Err(rejected()),

            (Self::Running { end_time, total, .. }, TimerCommand::Pause) => Ok(Self::Idle {
                remaining: remaining_until(end_time, now),
                total,
            }),
            (_, TimerCommand::Pause) => Err(rejected()),

            (_, TimerCommand::AddTime { seconds: 0 }) => {
                Err(TimerError::InvalidInput("cannot add zero seconds".to_string()))
            }
            (Self::Running { end_time, total, .. }, TimerCommand::AddTime { seconds }) => {
                let end_time = end_time
                    .max(now)
                    .checked_add(duration_millis(seconds)?)
                    .ok_or_else(|| TimerError::InvalidInput("deadline out of range".to_string()))?;
                let remaining = remaining_until(end_time, now);
                Ok(Self::Running {
                    end_time,
                    total: grow(total, seconds)?,
                    remaining: bounded(remaining)?,
                })
            }
            (Self::Idle { remaining, total }, TimerCommand::AddTime { seconds }) => Ok(Self::Idle {
                remaining: grow(remaining, seconds)?,
                total: grow(total, seconds)?,
            }),
            (Self::Finished, TimerCommand::AddTime { .. }) => Err(rejected()),

            (Self::Idle { .. }, TimerCommand::SetInput { seconds }) => Ok(Self::Idle {
                remaining: bounded(seconds)?,
                total: seconds,
            }),
            (_, TimerCommand::SetInput { .. }) => Err(rejected()),

            (_, TimerCommand::Reset) => Ok(Self::default()),
            (Self::Running { .. }, TimerCommand::NewTimer) => Err(rejected()),
            (_, TimerCommand::NewTimer) => Ok(Self::default()),

            (Self::Running { end_time, .. }, TimerCommand::Complete { deadline }) => {
                if same_deadline(deadline, end_time) && now >= end_time {
                    Ok(Self::Finished)
                } else {
                    Err(TimerError::StaleDeadline {
                        deadline,
                        active: Some(end_time),
                    })
                }
            }
            (Self::Finished, TimerCommand::Complete { .. }) => Ok(Self::Finished),
            (Self::Idle { .. }, TimerCommand::Complete { deadline }) => {
                Err(TimerError::StaleDeadline {
                    deadline,
                    active: None,
                })
            }
        }
    }

    fn start(duration: u64, total: u64, now: i64) -> Result<TimerState> {
        if duration == 0 {
            return Err(TimerError::InvalidInput("nothing to start".to_string()));
        }
        let end_time = now
            .checked_add(duration_millis(duration)?)
            .ok_or_else(|| TimerError::InvalidInput("deadline out of range".to_string()))?;
        Ok(Self::Running {
            end_time,
            total: total.max(duration),
            remaining: duration,
        })
    }
}

impl Default for TimerState {
    fn default() -> Self {
        Self::Idle {
            remaining: 0,
            total: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_700_000_000_000;

    #[test]
    fn start_from_idle_sets_deadline() {
        let next = TimerState::default()
            .apply(TimerCommand::Start { seconds: 60 }, NOW)
            .unwrap();
        assert_eq!(
            next,
            TimerState::Running {
                end_time: NOW + 60_000,
                total: 60,
                remaining: 60
            }
        );
    }

    #[test]
    fn start_with_zero_is_rejected() {
        let err = TimerState::default()
            .apply(TimerCommand::Start { seconds: 0 }, NOW)
            .unwrap_err();
        assert!(matches!(err, TimerError::InvalidInput(_)));
    }

    #[test]
    fn paused_remainder_beats_typed_input() {
        let paused = TimerState::Idle {
            remaining: 50,
            total: 60,
        };
        let next = paused.apply(TimerCommand::Start { seconds: 60 }, NOW).unwrap();
        assert_eq!(
            next,
            TimerState::Running {
                end_time: NOW + 50_000,
                total: 60,
                remaining: 50
            }
        );
    }

    #[test]
    fn remaining_is_non_increasing_and_hits_zero_at_deadline() {
        let end = NOW + 3_000;
        let mut last = u64::MAX;
        for step in 0..=40 {
            let now = NOW + step * 100;
            let rem = remaining_until(end, now);
            assert!(rem <= last);
            last = rem;
        }
        assert_eq!(remaining_until(end, end - 1), 1);
        assert_eq!(remaining_until(end, end), 0);
        assert_eq!(remaining_until(end, end + 5_000), 0);
    }

    #[test]
    fn pause_freezes_derived_remaining() {
        let running = TimerState::default()
            .apply(TimerCommand::Start { seconds: 60 }, NOW)
            .unwrap();
        let paused = running.apply(TimerCommand::Pause, NOW + 10_000).unwrap();
        assert_eq!(
            paused,
            TimerState::Idle {
                remaining: 50,
                total: 60
            }
        );
    }

    #[test]
    fn add_time_while_running_extends_deadline_and_total() {
        let running = TimerState::default()
            .apply(TimerCommand::Start { seconds: 30 }, NOW)
            .unwrap();
        let later = NOW + 4_000;
        let extended = running
            .apply(TimerCommand::AddTime { seconds: 15 }, later)
            .unwrap();
        assert_eq!(extended.deadline(), Some(NOW + 45_000));
        assert_eq!(extended.total(), 45);
        // elapsed stays at four seconds
        assert_eq!(extended.total() - extended.remaining_at(later), 4);

        let twice = extended
            .apply(TimerCommand::AddTime { seconds: 15 }, later)
            .unwrap();
        assert_eq!(twice.deadline(), Some(NOW + 60_000));
        assert_eq!(twice.total(), 60);
    }

    #[test]
    fn add_time_while_idle_grows_remaining_and_total() {
        let idle = TimerState::Idle {
            remaining: 20,
            total: 40,
        };
        let next = idle.apply(TimerCommand::AddTime { seconds: 60 }, NOW).unwrap();
        assert_eq!(
            next,
            TimerState::Idle {
                remaining: 80,
                total: 100
            }
        );
    }

    #[test]
    fn complete_requires_matching_deadline() {
        let running = TimerState::default()
            .apply(TimerCommand::Start { seconds: 5 }, NOW)
            .unwrap();
        let stale = running
            .apply(TimerCommand::Complete { deadline: NOW + 2_000 }, NOW + 5_000)
            .unwrap_err();
        assert!(matches!(stale, TimerError::StaleDeadline { .. }));

        let done = running
            .apply(TimerCommand::Complete { deadline: NOW + 5_000 }, NOW + 5_000)
            .unwrap();
        assert_eq!(done, TimerState::Finished);
    }

    #[test]
    fn complete_waits_for_the_deadline() {
        let running = TimerState::default()
            .apply(TimerCommand::Start { seconds: 5 }, NOW)
            .unwrap();
        let early = running
            .apply(TimerCommand::Complete { deadline: NOW + 5_000 }, NOW + 4_999)
            .unwrap_err();
        assert!(matches!(early, TimerError::StaleDeadline { .. }));
    }

    #[test]
    fn adding_one_second_makes_the_old_deadline_stale() {
        let running = TimerState::default()
            .apply(TimerCommand::Start { seconds: 5 }, NOW)
            .unwrap();
        let extended = running
            .apply(TimerCommand::AddTime { seconds: 1 }, NOW + 1_000)
            .unwrap();
        assert_eq!(extended.deadline(), Some(NOW + 6_000));

        let err = extended
            .apply(TimerCommand::Complete { deadline: NOW + 5_000 }, NOW + 5_000)
            .unwrap_err();
        assert!(matches!(
            err,
            TimerError::StaleDeadline {
                active: Some(end),
                ..
            } if end == NOW + 6_000
        ));
        assert!(!same_deadline(NOW + 5_000, NOW + 6_000));
        assert!(same_deadline(NOW + 6_001, NOW + 6_000));
    }

    #[test]
    fn oversized_durations_are_rejected() {
        for seconds in [MAX_DURATION_SECS + 1, 10_000_000_000_000_000, u64::MAX] {
            let err = TimerState::default()
                .apply(TimerCommand::Start { seconds }, NOW)
                .unwrap_err();
            assert!(matches!(err, TimerError::InvalidInput(_)));
        }

        let running = TimerState::default()
            .apply(TimerCommand::Start { seconds: 60 }, NOW)
            .unwrap();
        assert!(matches!(
            running.apply(TimerCommand::AddTime { seconds: u64::MAX }, NOW),
            Err(TimerError::InvalidInput(_))
        ));
        let idle = TimerState::Idle {
            remaining: 10,
            total: MAX_DURATION_SECS,
        };
        assert!(matches!(
            idle.apply(TimerCommand::AddTime { seconds: 1 }, NOW),
            Err(TimerError::InvalidInput(_))
        ));
        assert!(TimerState::default()
            .apply(TimerCommand::Start { seconds: MAX_DURATION_SECS }, NOW)
            .is_ok());
    }

    #[test]
    fn complete_is_idempotent_once_finished() {
        let again = TimerState::Finished
            .apply(TimerCommand::Complete { deadline: NOW }, NOW)
            .unwrap();
        assert_eq!(again, TimerState::Finished);
    }

    #[test]
    fn complete_against_idle_is_stale() {
        let err = TimerState::default()
            .apply(TimerCommand::Complete { deadline: NOW }, NOW)
            .unwrap_err();
        assert!(matches!(err, TimerError::StaleDeadline { active: None, .. }));
    }

    #[test]
    fn finished_only_leaves_through_explicit_actions() {
        assert!(TimerState::Finished.apply(TimerCommand::Pause, NOW).is_err());
        assert!(TimerState::Finished
            .apply(TimerCommand::AddTime { seconds: 10 }, NOW)
            .is_err());
        assert_eq!(
            TimerState::Finished.apply(TimerCommand::NewTimer, NOW).unwrap(),
            TimerState::default()
        );
        assert_eq!(
            TimerState::Finished.apply(TimerCommand::Reset, NOW).unwrap(),
            TimerState::default()
        );
    }
}
