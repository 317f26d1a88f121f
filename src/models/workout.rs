use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::Row;
use serde::{Deserialize, Deserializer, Serialize};

use super::timer::{TimerState, WorkoutTimer};
use super::FromSqliteRow;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workout {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub performed_on: NaiveDate,
    pub notes: Option<String>,
    pub duration_seconds: Option<i64>,
    pub is_public: bool,
    #[serde(skip)]
    pub timer: WorkoutTimer,
    pub created_at: DateTime<Utc>,
}

impl Workout {
    /// "45 min", "1 h 05 min", or an empty string when untracked.
    pub fn duration_label(&self) -> String {
        match self.duration_seconds {
            Some(secs) if secs >= 3600 => format!("{} h {:02} min", secs / 3600, (secs % 3600) / 60),
            Some(secs) => format!("{} min", secs / 60),
            None => String::new(),
        }
    }

    pub fn duration_minutes(&self) -> Option<i64> {
        self.duration_seconds.map(|secs| secs / 60)
    }
}

impl FromSqliteRow for Workout {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let timer_state: String = row.get("timer_state")?;
        Ok(Self {
            id: row.get("id")?,
            user_id: row.get("user_id")?,
            name: row.get("name")?,
            performed_on: row.get("performed_on")?,
            notes: row.get("notes")?,
            duration_seconds: row.get("duration_seconds")?,
            is_public: row.get("is_public")?,
            timer: WorkoutTimer {
                state: TimerState::parse(&timer_state),
                elapsed_seconds: row.get("timer_elapsed_seconds")?,
                running_since: row.get("timer_running_since")?,
                rest_ends_at: row.get("timer_rest_ends_at")?,
            },
            created_at: row.get("created_at")?,
        })
    }
}

/// Deserialize an optional integer from a form field.
/// Handles empty strings by returning None instead of failing.
pub fn deserialize_optional_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    match opt.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => s.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

/// Create and edit form for a workout.
#[derive(Debug, Deserialize)]
pub struct WorkoutForm {
    pub name: String,
    pub performed_on: NaiveDate,
    pub notes: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_i64")]
    pub duration_minutes: Option<i64>,
}

impl WorkoutForm {
    pub fn validate(&self) -> Result<(), &'static str> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err("Workout name is required");
        }
        if name.chars().count() > 100 {
            return Err("Workout name must be at most 100 characters");
        }
        if let Some(minutes) = self.duration_minutes {
            if !(0..=24 * 60).contains(&minutes) {
                return Err("Duration must be between 0 and 1440 minutes");
            }
        }
        Ok(())
    }

    /// Notes with surrounding whitespace removed; blank notes become `None`.
    pub fn notes(&self) -> Option<&str> {
        self.notes
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
    }
}
