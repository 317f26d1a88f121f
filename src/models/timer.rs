//! Workout clock and rest timer.
//!
//! The timer is stored as timestamps, never as ticks: the workout clock is
//! `elapsed_seconds` accumulated over finished segments plus the time since
//! `running_since` when the clock is running. A rest runs on top of the
//! workout clock and ends at `rest_ends_at`.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::settings::MAX_REST_SECONDS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerState {
    #[default]
    Idle,
    Running,
    Paused,
    Resting,
    Done,
}

impl TimerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimerState::Idle => "idle",
            TimerState::Running => "running",
            TimerState::Paused => "paused",
            TimerState::Resting => "resting",
            TimerState::Done => "done",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "running" => TimerState::Running,
            "paused" => TimerState::Paused,
            "resting" => TimerState::Resting,
            "done" => TimerState::Done,
            _ => TimerState::Idle,
        }
    }

    /// Whether the workout clock advances in this state.
    pub fn clock_runs(&self) -> bool {
        matches!(self, TimerState::Running | TimerState::Resting)
    }
}

impl fmt::Display for TimerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerAction {
    Start,
    Pause,
    Resume,
    Rest { seconds: i64 },
    SkipRest,
    Finish,
}

impl TimerAction {
    pub fn name(&self) -> &'static str {
        match self {
            TimerAction::Start => "start",
            TimerAction::Pause => "pause",
            TimerAction::Resume => "resume",
            TimerAction::Rest { .. } => "rest",
            TimerAction::SkipRest => "skip_rest",
            TimerAction::Finish => "finish",
        }
    }

    /// Parse a form action; `rest` falls back to `default_rest` seconds.
    pub fn parse(name: &str, rest_seconds: Option<i64>, default_rest: i64) -> Option<Self> {
        match name {
            "start" => Some(TimerAction::Start),
            "pause" => Some(TimerAction::Pause),
            "resume" => Some(TimerAction::Resume),
            "rest" => Some(TimerAction::Rest {
                seconds: rest_seconds.unwrap_or(default_rest),
            }),
            "skip_rest" => Some(TimerAction::SkipRest),
            "finish" => Some(TimerAction::Finish),
            _ => None,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TimerError {
    #[error("Cannot {action} a timer that is {from}")]
    InvalidTransition {
        from: TimerState,
        action: &'static str,
    },

    #[error("Rest must be between 1 and 3600 seconds")]
    InvalidRest,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WorkoutTimer {
    pub state: TimerState,
    pub elapsed_seconds: i64,
    pub running_since: Option<DateTime<Utc>>,
    pub rest_ends_at: Option<DateTime<Utc>>,
}

/// What the browser needs to render and tick the timer locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimerSnapshot {
    pub state: TimerState,
    pub elapsed_seconds: i64,
    pub rest_remaining_seconds: Option<i64>,
}

impl TimerSnapshot {
    pub fn elapsed_label(&self) -> String {
        format_clock(self.elapsed_seconds)
    }

    pub fn rest_label(&self) -> String {
        self.rest_remaining_seconds
            .map(format_clock)
            .unwrap_or_default()
    }
}

impl WorkoutTimer {
    /// Resolve a rest that has already run out back to the running state.
    pub fn settle(self, now: DateTime<Utc>) -> Self {
        match (self.state, self.rest_ends_at) {
            (TimerState::Resting, Some(ends_at)) if ends_at <= now => Self {
                state: TimerState::Running,
                rest_ends_at: None,
                ..self
            },
            _ => self,
        }
    }

    pub fn elapsed_at(&self, now: DateTime<Utc>) -> i64 {
        let running = match (self.state.clock_runs(), self.running_since) {
            (true, Some(since)) => (now - since).num_seconds().max(0),
            _ => 0,
        };
        self.elapsed_seconds + running
    }

    /// Whole seconds of rest left, rounded up; `None` outside a rest.
    pub fn rest_remaining_at(&self, now: DateTime<Utc>) -> Option<i64> {
        match (self.state, self.rest_ends_at) {
            (TimerState::Resting, Some(ends_at)) => {
                let millis = (ends_at - now).num_milliseconds().max(0);
                Some((millis + 999) / 1000)
            }
            _ => None,
        }
    }

    pub fn snapshot(&self, now: DateTime<Utc>) -> TimerSnapshot {
        let timer = self.clone().settle(now);
        TimerSnapshot {
            state: timer.state,
            elapsed_seconds: timer.elapsed_at(now),
            rest_remaining_seconds: timer.rest_remaining_at(now),
        }
    }

    pub fn apply(self, action: TimerAction, now: DateTime<Utc>) -> Result<Self, TimerError> {
        use TimerState::*;

        let timer = self.settle(now);
        match (timer.state, action) {
            (Idle, TimerAction::Start) | (Paused, TimerAction::Resume) => Ok(Self {
                state: Running,
                running_since: Some(now),
                rest_ends_at: None,
                ..timer
            }),
            (Running, TimerAction::Pause) | (Resting, TimerAction::Pause) => Ok(Self {
                state: Paused,
                elapsed_seconds: timer.elapsed_at(now),
                running_since: None,
                rest_ends_at: None,
            }),
            (Running, TimerAction::Rest { seconds }) => {
                if !(1..=MAX_REST_SECONDS).contains(&seconds) {
                    return Err(TimerError::InvalidRest);
                }
                Ok(Self {
                    state: Resting,
                    rest_ends_at: Some(now + Duration::seconds(seconds)),
                    ..timer
                })
            }
            (Resting, TimerAction::SkipRest) => Ok(Self {
                state: Running,
                rest_ends_at: None,
                ..timer
            }),
            (Running | Paused | Resting, TimerAction::Finish) => Ok(Self {
                state: Done,
                elapsed_seconds: timer.elapsed_at(now),
                running_since: None,
                rest_ends_at: None,
            }),
            (from, action) => Err(TimerError::InvalidTransition {
                from,
                action: action.name(),
            }),
        }
    }
}

/// `h:mm:ss` above an hour, `m:ss` below.
pub fn format_clock(seconds: i64) -> String {
    let seconds = seconds.max(0);
    let (h, m, s) = (seconds / 3600, (seconds % 3600) / 60, seconds % 60);
    if h > 0 {
        format!("{}:{:02}:{:02}", h, m, s)
    } else {
        format!("{}:{:02}", m, s)
    }
}
