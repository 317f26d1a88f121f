use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::OptionalExtension;
use uuid::Uuid;

use crate::db::{interact, DbPool};
use crate::error::Result;
use crate::models::{FromSqliteRow, Goal, GoalKind};

#[derive(Clone)]
pub struct GoalRepository {
    pool: DbPool,
}

impl GoalRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        user_id: &str,
        kind: GoalKind,
        exercise_id: Option<&str>,
        target_value: f64,
        deadline: Option<NaiveDate>,
    ) -> Result<Goal> {
        let goal = Goal {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            kind,
            exercise_id: exercise_id.map(str::to_string),
            target_value,
            deadline,
            achieved_at: None,
            created_at: Utc::now(),
        };

        let row = goal.clone();
        interact(&self.pool, move |conn| {
            conn.execute(
                "INSERT INTO goals (id, user_id, kind, exercise_id, target_value, deadline, created_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?)",
                rusqlite::params![
                    row.id,
                    row.user_id,
                    row.kind.as_str(),
                    row.exercise_id,
                    row.target_value,
                    row.deadline,
                    row.created_at
                ],
            )?;
            Ok(())
        })
        .await?;

        Ok(goal)
    }

    /// Goals of a user: open ones first, then achieved, each newest first.
    pub async fn find_by_user(&self, user_id: &str) -> Result<Vec<Goal>> {
        let user_id = user_id.to_string();
        interact(&self.pool, move |conn| {
            let mut stmt = conn.prepare(
                "SELECT * FROM goals WHERE user_id = ?
                 ORDER BY achieved_at IS NOT NULL, created_at DESC",
            )?;
            let goals = stmt
                .query_map([&user_id], Goal::from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(goals)
        })
        .await
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<Goal>> {
        let id = id.to_string();
        interact(&self.pool, move |conn| {
            Ok(conn
                .query_row("SELECT * FROM goals WHERE id = ?", [&id], Goal::from_row)
                .optional()?)
        })
        .await
    }

    /// Stamp the first time a goal is reached; later calls keep the original time.
    pub async fn mark_achieved(&self, id: &str, at: DateTime<Utc>) -> Result<bool> {
        let id = id.to_string();
        interact(&self.pool, move |conn| {
            let rows = conn.execute(
                "UPDATE goals SET achieved_at = ? WHERE id = ? AND achieved_at IS NULL",
                rusqlite::params![at, id],
            )?;
            Ok(rows > 0)
        })
        .await
    }

    pub async fn delete(&self, id: &str, user_id: &str) -> Result<bool> {
        let id = id.to_string();
        let user_id = user_id.to_string();
        interact(&self.pool, move |conn| {
            let rows = conn.execute(
                "DELETE FROM goals WHERE id = ? AND user_id = ?",
                rusqlite::params![id, user_id],
            )?;
            Ok(rows > 0)
        })
        .await
    }
}
