use rusqlite::{Connection, OptionalExtension};
use uuid::Uuid;

use crate::db::{interact, DbPool};
use crate::error::Result;
use crate::models::exercise::DEFAULT_EXERCISES;
use crate::models::{Exercise, FromSqliteRow};

#[derive(Clone)]
pub struct ExerciseRepository {
    pool: DbPool,
}

impl ExerciseRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<Exercise>> {
        let id = id.to_string();
        interact(&self.pool, move |conn| {
            Ok(conn
                .query_row("SELECT * FROM exercises WHERE id = ?", [&id], Exercise::from_row)
                .optional()?)
        })
        .await
    }

    /// An exercise only if it belongs to `user_id`.
    pub async fn find_owned(&self, id: &str, user_id: &str) -> Result<Option<Exercise>> {
        Ok(self
            .find_by_id(id)
            .await?
            .filter(|exercise| exercise.user_id == user_id))
    }

    pub async fn find_by_user(&self, user_id: &str) -> Result<Vec<Exercise>> {
        let user_id = user_id.to_string();
        interact(&self.pool, move |conn| {
            let mut stmt = conn.prepare(
                "SELECT * FROM exercises WHERE user_id = ? ORDER BY category, name COLLATE NOCASE",
            )?;
            let exercises = stmt
                .query_map([&user_id], Exercise::from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(exercises)
        })
        .await
    }

    pub async fn name_taken(&self, user_id: &str, name: &str, except_id: Option<&str>) -> Result<bool> {
        let user_id = user_id.to_string();
        let name = name.to_string();
        let except_id = except_id.unwrap_or("").to_string();
        interact(&self.pool, move |conn| {
            Ok(conn.query_row(
                "SELECT COUNT(*) > 0 FROM exercises
                 WHERE user_id = ? AND name = ? COLLATE NOCASE AND id != ?",
                rusqlite::params![user_id, name, except_id],
                |row| row.get(0),
            )?)
        })
        .await
    }

    pub async fn create(&self, user_id: &str, name: &str, category: &str) -> Result<Exercise> {
        let exercise = Exercise {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            name: name.to_string(),
            category: category.to_string(),
        };

        let row = exercise.clone();
        interact(&self.pool, move |conn| {
            conn.execute(
                "INSERT INTO exercises (id, user_id, name, category) VALUES (?, ?, ?, ?)",
                rusqlite::params![row.id, row.user_id, row.name, row.category],
            )?;
            Ok(())
        })
        .await?;

        Ok(exercise)
    }

    pub async fn update(&self, id: &str, user_id: &str, name: &str, category: &str) -> Result<bool> {
        let id = id.to_string();
        let user_id = user_id.to_string();
        let name = name.to_string();
        let category = category.to_string();
        interact(&self.pool, move |conn| {
            let rows = conn.execute(
                "UPDATE exercises SET name = ?, category = ? WHERE id = ? AND user_id = ?",
                rusqlite::params![name, category, id, user_id],
            )?;
            Ok(rows > 0)
        })
        .await
    }

    /// Delete an exercise together with every set logged against it.
    pub async fn delete(&self, id: &str, user_id: &str) -> Result<bool> {
        let id = id.to_string();
        let user_id = user_id.to_string();
        interact(&self.pool, move |conn| {
            let rows = conn.execute(
                "DELETE FROM exercises WHERE id = ? AND user_id = ?",
                rusqlite::params![id, user_id],
            )?;
            Ok(rows > 0)
        })
        .await
    }
}

/// Give a new account the starter library. Existing names are left alone.
pub(crate) fn insert_default_exercises(conn: &Connection, user_id: &str) -> rusqlite::Result<usize> {
    let mut stmt = conn.prepare(
        "INSERT OR IGNORE INTO exercises (id, user_id, name, category) VALUES (?, ?, ?, ?)",
    )?;
    let mut inserted = 0;
    for (name, category) in DEFAULT_EXERCISES {
        inserted += stmt.execute(rusqlite::params![
            Uuid::new_v4().to_string(),
            user_id,
            name,
            category
        ])?;
    }
    Ok(inserted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::test_support::{create_test_user, setup_test_db};

    #[tokio::test]
    async fn test_create_exercise() {
        let pool = setup_test_db();
        create_test_user(&pool, "user1");
        let repo = ExerciseRepository::new(pool);

        let exercise = repo.create("user1", "Bench Press", "chest").await.unwrap();

        assert_eq!(exercise.name, "Bench Press");
        assert_eq!(exercise.category, "chest");
        assert_eq!(exercise.user_id, "user1");
        assert!(!exercise.id.is_empty());
    }

    #[tokio::test]
    async fn test_find_by_id_not_exists() {
        let pool = setup_test_db();
        let repo = ExerciseRepository::new(pool);
        assert!(repo.find_by_id("nonexistent").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_find_owned_filters_other_users() {
        let pool = setup_test_db();
        create_test_user(&pool, "user1");
        create_test_user(&pool, "user2");
        let repo = ExerciseRepository::new(pool);

        let exercise = repo.create("user1", "Squat", "legs").await.unwrap();

        assert!(repo.find_owned(&exercise.id, "user1").await.unwrap().is_some());
        assert!(repo.find_owned(&exercise.id, "user2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_find_by_user() {
        let pool = setup_test_db();
        create_test_user(&pool, "user1");
        create_test_user(&pool, "user2");
        let repo = ExerciseRepository::new(pool);

        repo.create("user1", "Bench Press", "chest").await.unwrap();
        repo.create("user1", "Squat", "legs").await.unwrap();
        repo.create("user2", "Deadlift", "back").await.unwrap();

        assert_eq!(repo.find_by_user("user1").await.unwrap().len(), 2);
        assert_eq!(repo.find_by_user("user2").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_name_taken_is_case_insensitive() {
        let pool = setup_test_db();
        create_test_user(&pool, "user1");
        let repo = ExerciseRepository::new(pool);

        let bench = repo.create("user1", "Bench Press", "chest").await.unwrap();

        assert!(repo.name_taken("user1", "bench press", None).await.unwrap());
        assert!(!repo.name_taken("user1", "bench press", Some(&bench.id)).await.unwrap());
        assert!(!repo.name_taken("user1", "Squat", None).await.unwrap());
    }

    #[tokio::test]
    async fn test_default_exercises_are_repeatable() {
        let pool = setup_test_db();
        create_test_user(&pool, "user1");

        let (first, second) = {
            let conn = pool.get().unwrap();
            (
                insert_default_exercises(&conn, "user1").unwrap(),
                insert_default_exercises(&conn, "user1").unwrap(),
            )
        };

        assert_eq!(first, DEFAULT_EXERCISES.len());
        assert_eq!(second, 0);
        let repo = ExerciseRepository::new(pool);
        assert_eq!(repo.find_by_user("user1").await.unwrap().len(), DEFAULT_EXERCISES.len());
    }

    #[tokio::test]
    async fn test_update_wrong_user() {
        let pool = setup_test_db();
        create_test_user(&pool, "user1");
        create_test_user(&pool, "user2");
        let repo = ExerciseRepository::new(pool);

        let exercise = repo.create("user1", "Bench Press", "chest").await.unwrap();
        let updated = repo
            .update(&exercise.id, "user2", "Hacked", "chest")
            .await
            .unwrap();

        assert!(!updated);
        let found = repo.find_by_id(&exercise.id).await.unwrap().unwrap();
        assert_eq!(found.name, "Bench Press");
    }

    #[tokio::test]
    async fn test_delete_wrong_user() {
        let pool = setup_test_db();
        create_test_user(&pool, "user1");
        create_test_user(&pool, "user2");
        let repo = ExerciseRepository::new(pool);

        let exercise = repo.create("user1", "Bench Press", "chest").await.unwrap();

        assert!(!repo.delete(&exercise.id, "user2").await.unwrap());
        assert!(repo.delete(&exercise.id, "user1").await.unwrap());
        assert!(repo.find_by_id(&exercise.id).await.unwrap().is_none());
    }
}
