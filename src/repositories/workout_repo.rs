use chrono::{NaiveDate, Utc};
use rusqlite::OptionalExtension;
use uuid::Uuid;

use crate::db::{interact, DbPool};
use crate::error::Result;
use crate::models::timer::{TimerState, WorkoutTimer};
use crate::models::{FromSqliteRow, Workout, WorkoutSet, WorkoutSetWithExercise};

const SET_SELECT: &str = "SELECT s.id, s.workout_id, s.exercise_id, e.name AS exercise_name,
        w.performed_on, s.set_number, s.reps, s.weight_kg, s.rest_seconds
     FROM workout_sets s
     JOIN exercises e ON e.id = s.exercise_id
     JOIN workouts w ON w.id = s.workout_id";

#[derive(Clone)]
pub struct WorkoutRepository {
    pool: DbPool,
}

impl WorkoutRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    // Workouts
    pub async fn create_workout(
        &self,
        user_id: &str,
        name: &str,
        performed_on: NaiveDate,
        notes: Option<&str>,
        is_public: bool,
    ) -> Result<Workout> {
        let workout = Workout {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            name: name.to_string(),
            performed_on,
            notes: notes.map(str::to_string),
            duration_seconds: None,
            is_public,
            timer: WorkoutTimer::default(),
            created_at: Utc::now(),
        };

        let row = workout.clone();
        interact(&self.pool, move |conn| {
            conn.execute(
                "INSERT INTO workouts (id, user_id, name, performed_on, notes, is_public, created_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?)",
                rusqlite::params![
                    row.id,
                    row.user_id,
                    row.name,
                    row.performed_on,
                    row.notes,
                    row.is_public,
                    row.created_at
                ],
            )?;
            Ok(())
        })
        .await?;

        Ok(workout)
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<Workout>> {
        let id = id.to_string();
        interact(&self.pool, move |conn| {
            Ok(conn
                .query_row("SELECT * FROM workouts WHERE id = ?", [&id], Workout::from_row)
                .optional()?)
        })
        .await
    }

    /// A workout only if it belongs to `user_id`.
    pub async fn find_owned(&self, id: &str, user_id: &str) -> Result<Option<Workout>> {
        Ok(self
            .find_by_id(id)
            .await?
            .filter(|workout| workout.user_id == user_id))
    }

    pub async fn find_by_user_paginated(
        &self,
        user_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Workout>> {
        let user_id = user_id.to_string();
        interact(&self.pool, move |conn| {
            let mut stmt = conn.prepare(
                "SELECT * FROM workouts WHERE user_id = ?
                 ORDER BY performed_on DESC, created_at DESC
                 LIMIT ? OFFSET ?",
            )?;
            let workouts = stmt
                .query_map(rusqlite::params![user_id, limit, offset], Workout::from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(workouts)
        })
        .await
    }

    /// Workouts with `from <= performed_on < until`, oldest first.
    pub async fn find_by_user_between(
        &self,
        user_id: &str,
        from: NaiveDate,
        until: NaiveDate,
    ) -> Result<Vec<Workout>> {
        let user_id = user_id.to_string();
        interact(&self.pool, move |conn| {
            let mut stmt = conn.prepare(
                "SELECT * FROM workouts
                 WHERE user_id = ? AND performed_on >= ? AND performed_on < ?
                 ORDER BY performed_on, created_at",
            )?;
            let workouts = stmt
                .query_map(rusqlite::params![user_id, from, until], Workout::from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(workouts)
        })
        .await
    }

    pub async fn count_by_user(&self, user_id: &str) -> Result<i64> {
        let user_id = user_id.to_string();
        interact(&self.pool, move |conn| {
            Ok(conn.query_row(
                "SELECT COUNT(*) FROM workouts WHERE user_id = ?",
                [&user_id],
                |row| row.get(0),
            )?)
        })
        .await
    }

    pub async fn update_workout(
        &self,
        id: &str,
        user_id: &str,
        name: &str,
        performed_on: NaiveDate,
        notes: Option<&str>,
        duration_seconds: Option<i64>,
    ) -> Result<bool> {
        let id = id.to_string();
        let user_id = user_id.to_string();
        let name = name.to_string();
        let notes = notes.map(str::to_string);
        interact(&self.pool, move |conn| {
            let rows = conn.execute(
                "UPDATE workouts SET name = ?, performed_on = ?, notes = ?, duration_seconds = ?
                 WHERE id = ? AND user_id = ?",
                rusqlite::params![name, performed_on, notes, duration_seconds, id, user_id],
            )?;
            Ok(rows > 0)
        })
        .await
    }

    pub async fn set_public(&self, id: &str, user_id: &str, is_public: bool) -> Result<bool> {
        let id = id.to_string();
        let user_id = user_id.to_string();
        interact(&self.pool, move |conn| {
            let rows = conn.execute(
                "UPDATE workouts SET is_public = ? WHERE id = ? AND user_id = ?",
                rusqlite::params![is_public, id, user_id],
            )?;
            Ok(rows > 0)
        })
        .await
    }

    /// Persist the timer. Finishing also records the frozen clock as the duration.
    pub async fn save_timer(&self, id: &str, user_id: &str, timer: &WorkoutTimer) -> Result<bool> {
        let id = id.to_string();
        let user_id = user_id.to_string();
        let timer = timer.clone();
        interact(&self.pool, move |conn| {
            let duration = (timer.state == TimerState::Done).then_some(timer.elapsed_seconds);
            let rows = conn.execute(
                "UPDATE workouts SET
                    timer_state = ?,
                    timer_elapsed_seconds = ?,
                    timer_running_since = ?,
                    timer_rest_ends_at = ?,
                    duration_seconds = COALESCE(?, duration_seconds)
                 WHERE id = ? AND user_id = ?",
                rusqlite::params![
                    timer.state.as_str(),
                    timer.elapsed_seconds,
                    timer.running_since,
                    timer.rest_ends_at,
                    duration,
                    id,
                    user_id
                ],
            )?;
            Ok(rows > 0)
        })
        .await
    }

    pub async fn delete_workout(&self, id: &str, user_id: &str) -> Result<bool> {
        let id = id.to_string();
        let user_id = user_id.to_string();
        interact(&self.pool, move |conn| {
            let rows = conn.execute(
                "DELETE FROM workouts WHERE id = ? AND user_id = ?",
                rusqlite::params![id, user_id],
            )?;
            Ok(rows > 0)
        })
        .await
    }

    // Sets
    pub async fn create_set(
        &self,
        workout_id: &str,
        exercise_id: &str,
        set_number: i64,
        reps: i64,
        weight_kg: f64,
        rest_seconds: Option<i64>,
    ) -> Result<WorkoutSet> {
        let set = WorkoutSet {
            id: Uuid::new_v4().to_string(),
            workout_id: workout_id.to_string(),
            exercise_id: exercise_id.to_string(),
            set_number,
            reps,
            weight_kg,
            rest_seconds,
            created_at: Utc::now(),
        };

        let row = set.clone();
        interact(&self.pool, move |conn| {
            conn.execute(
                "INSERT INTO workout_sets (id, workout_id, exercise_id, set_number, reps, weight_kg, rest_seconds, created_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
                rusqlite::params![
                    row.id,
                    row.workout_id,
                    row.exercise_id,
                    row.set_number,
                    row.reps,
                    row.weight_kg,
                    row.rest_seconds,
                    row.created_at
                ],
            )?;
            Ok(())
        })
        .await?;

        Ok(set)
    }

    pub async fn find_set_by_id(&self, id: &str) -> Result<Option<WorkoutSet>> {
        let id = id.to_string();
        interact(&self.pool, move |conn| {
            Ok(conn
                .query_row("SELECT * FROM workout_sets WHERE id = ?", [&id], WorkoutSet::from_row)
                .optional()?)
        })
        .await
    }

    /// Sets of one workout in the order they were logged.
    pub async fn find_sets_by_workout(&self, workout_id: &str) -> Result<Vec<WorkoutSetWithExercise>> {
        let workout_id = workout_id.to_string();
        interact(&self.pool, move |conn| {
            let mut stmt = conn.prepare(&format!(
                "{} WHERE s.workout_id = ? ORDER BY s.created_at, s.set_number",
                SET_SELECT
            ))?;
            let sets = stmt
                .query_map([&workout_id], WorkoutSetWithExercise::from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(sets)
        })
        .await
    }

    /// Insert a set numbered after the exercise's last set in this workout.
    ///
    /// Numbering and insert are one statement, so concurrent submissions
    /// never share a number.
    pub async fn append_set(
        &self,
        workout_id: &str,
        exercise_id: &str,
        reps: i64,
        weight_kg: f64,
        rest_seconds: Option<i64>,
    ) -> Result<WorkoutSet> {
        let mut set = WorkoutSet {
            id: Uuid::new_v4().to_string(),
            workout_id: workout_id.to_string(),
            exercise_id: exercise_id.to_string(),
            set_number: 0,
            reps,
            weight_kg,
            rest_seconds,
            created_at: Utc::now(),
        };

        let row = set.clone();
        set.set_number = interact(&self.pool, move |conn| {
            let set_number = conn.query_row(
                "INSERT INTO workout_sets (id, workout_id, exercise_id, set_number, reps, weight_kg, rest_seconds, created_at)
                 SELECT ?1, ?2, ?3, COALESCE(MAX(set_number), 0) + 1, ?4, ?5, ?6, ?7
                 FROM workout_sets WHERE workout_id = ?2 AND exercise_id = ?3
                 RETURNING set_number",
                rusqlite::params![
                    row.id,
                    row.workout_id,
                    row.exercise_id,
                    row.reps,
                    row.weight_kg,
                    row.rest_seconds,
                    row.created_at
                ],
                |r| r.get(0),
            )?;
            Ok(set_number)
        })
        .await?;

        Ok(set)
    }

    pub async fn update_set(
        &self,
        id: &str,
        workout_id: &str,
        reps: i64,
        weight_kg: f64,
        rest_seconds: Option<i64>,
    ) -> Result<bool> {
        let id = id.to_string();
        let workout_id = workout_id.to_string();
        interact(&self.pool, move |conn| {
            let rows = conn.execute(
                "UPDATE workout_sets SET reps = ?, weight_kg = ?, rest_seconds = ?
                 WHERE id = ? AND workout_id = ?",
                rusqlite::params![reps, weight_kg, rest_seconds, id, workout_id],
            )?;
            Ok(rows > 0)
        })
        .await
    }

    pub async fn delete_set(&self, id: &str, workout_id: &str) -> Result<bool> {
        let id = id.to_string();
        let workout_id = workout_id.to_string();
        interact(&self.pool, move |conn| {
            let rows = conn.execute(
                "DELETE FROM workout_sets WHERE id = ? AND workout_id = ?",
                rusqlite::params![id, workout_id],
            )?;
            Ok(rows > 0)
        })
        .await
    }

    // History and statistics
    /// Every set the user has logged; the input for personal records.
    pub async fn set_history(&self, user_id: &str) -> Result<Vec<WorkoutSetWithExercise>> {
        let user_id = user_id.to_string();
        interact(&self.pool, move |conn| {
            let mut stmt = conn.prepare(&format!(
                "{} WHERE w.user_id = ? ORDER BY w.performed_on, s.created_at",
                SET_SELECT
            ))?;
            let sets = stmt
                .query_map([&user_id], WorkoutSetWithExercise::from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(sets)
        })
        .await
    }

    pub async fn exercise_history(
        &self,
        user_id: &str,
        exercise_id: &str,
        limit: i64,
    ) -> Result<Vec<WorkoutSetWithExercise>> {
        let user_id = user_id.to_string();
        let exercise_id = exercise_id.to_string();
        interact(&self.pool, move |conn| {
            let mut stmt = conn.prepare(&format!(
                "{} WHERE w.user_id = ? AND s.exercise_id = ?
                 ORDER BY w.performed_on DESC, s.set_number
                 LIMIT ?",
                SET_SELECT
            ))?;
            let sets = stmt
                .query_map(
                    rusqlite::params![user_id, exercise_id, limit],
                    WorkoutSetWithExercise::from_row,
                )?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(sets)
        })
        .await
    }

    pub async fn count_workouts_since(&self, user_id: &str, since: NaiveDate) -> Result<i64> {
        let user_id = user_id.to_string();
        interact(&self.pool, move |conn| {
            Ok(conn.query_row(
                "SELECT COUNT(*) FROM workouts WHERE user_id = ? AND performed_on >= ?",
                rusqlite::params![user_id, since],
                |row| row.get(0),
            )?)
        })
        .await
    }

    /// Sum of reps x weight over workouts performed on or after `since`.
    pub async fn volume_since(&self, user_id: &str, since: NaiveDate) -> Result<f64> {
        let user_id = user_id.to_string();
        interact(&self.pool, move |conn| {
            Ok(conn.query_row(
                "SELECT COALESCE(SUM(s.reps * s.weight_kg), 0.0)
                 FROM workout_sets s
                 JOIN workouts w ON w.id = s.workout_id
                 WHERE w.user_id = ? AND w.performed_on >= ?",
                rusqlite::params![user_id, since],
                |row| row.get(0),
            )?)
        })
        .await
    }

    pub async fn daily_volume_since(
        &self,
        user_id: &str,
        since: NaiveDate,
    ) -> Result<Vec<(NaiveDate, f64)>> {
        let user_id = user_id.to_string();
        interact(&self.pool, move |conn| {
            let mut stmt = conn.prepare(
                "SELECT w.performed_on, COALESCE(SUM(s.reps * s.weight_kg), 0.0)
                 FROM workouts w
                 LEFT JOIN workout_sets s ON s.workout_id = w.id
                 WHERE w.user_id = ? AND w.performed_on >= ?
                 GROUP BY w.performed_on
                 ORDER BY w.performed_on",
            )?;
            let rows = stmt
                .query_map(rusqlite::params![user_id, since], |row| {
                    Ok((row.get(0)?, row.get(1)?))
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(rows)
        })
        .await
    }

    /// Distinct training days, newest first.
    pub async fn workout_dates(&self, user_id: &str) -> Result<Vec<NaiveDate>> {
        let user_id = user_id.to_string();
        interact(&self.pool, move |conn| {
            let mut stmt = conn.prepare(
                "SELECT DISTINCT performed_on FROM workouts WHERE user_id = ? ORDER BY performed_on DESC",
            )?;
            let dates = stmt
                .query_map([&user_id], |row| row.get(0))?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(dates)
        })
        .await
    }
}
