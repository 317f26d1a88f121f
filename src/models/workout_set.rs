use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::Row;
use serde::{Deserialize, Serialize};

use super::settings::MAX_REST_SECONDS;
use super::workout::deserialize_optional_i64;
use super::FromSqliteRow;

pub const MAX_REPS: i64 = 1000;
pub const MAX_WEIGHT_KG: f64 = 2000.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkoutSet {
    pub id: String,
    pub workout_id: String,
    pub exercise_id: String,
    pub set_number: i64,
    pub reps: i64,
    pub weight_kg: f64,
    pub rest_seconds: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl WorkoutSet {
    pub fn volume(&self) -> f64 {
        self.reps as f64 * self.weight_kg
    }
}

impl FromSqliteRow for WorkoutSet {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            workout_id: row.get("workout_id")?,
            exercise_id: row.get("exercise_id")?,
            set_number: row.get("set_number")?,
            reps: row.get("reps")?,
            weight_kg: row.get("weight_kg")?,
            rest_seconds: row.get("rest_seconds")?,
            created_at: row.get("created_at")?,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct WorkoutSetWithExercise {
    pub id: String,
    pub workout_id: String,
    pub exercise_id: String,
    pub exercise_name: String,
    pub performed_on: NaiveDate,
    pub set_number: i64,
    pub reps: i64,
    pub weight_kg: f64,
    pub rest_seconds: Option<i64>,
}

impl FromSqliteRow for WorkoutSetWithExercise {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            workout_id: row.get("workout_id")?,
            exercise_id: row.get("exercise_id")?,
            exercise_name: row.get("exercise_name")?,
            performed_on: row.get("performed_on")?,
            set_number: row.get("set_number")?,
            reps: row.get("reps")?,
            weight_kg: row.get("weight_kg")?,
            rest_seconds: row.get("rest_seconds")?,
        })
    }
}

/// Add and edit form for a set. `weight` is in the user's display unit.
#[derive(Debug, Deserialize)]
pub struct SetForm {
    #[serde(default)]
    pub exercise_id: String,
    pub reps: i64,
    pub weight: f64,
    #[serde(default, deserialize_with = "deserialize_optional_i64")]
    pub rest_seconds: Option<i64>,
}

/// Check a set already converted to kilograms.
pub fn validate_set(reps: i64, weight_kg: f64, rest_seconds: Option<i64>) -> Result<(), &'static str> {
    if !(1..=MAX_REPS).contains(&reps) {
        return Err("Reps must be between 1 and 1000");
    }
    if !weight_kg.is_finite() || !(0.0..=MAX_WEIGHT_KG).contains(&weight_kg) {
        return Err("Weight must be between 0 and 2000 kg");
    }
    if let Some(rest) = rest_seconds {
        if !(0..=MAX_REST_SECONDS).contains(&rest) {
            return Err("Rest must be between 0 and 3600 seconds");
        }
    }
    Ok(())
}
