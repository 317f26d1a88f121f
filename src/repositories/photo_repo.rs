use rusqlite::OptionalExtension;

use crate::db::{interact, DbPool};
use crate::error::Result;
use crate::models::{FromSqliteRow, ProgressPhoto};

#[derive(Clone)]
pub struct PhotoRepository {
    pool: DbPool,
}

impl PhotoRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, photo: &ProgressPhoto) -> Result<()> {
        let row = photo.clone();
        interact(&self.pool, move |conn| {
            conn.execute(
                "INSERT INTO progress_photos (id, user_id, workout_id, taken_on, caption, file_name, content_type, created_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
                rusqlite::params![
                    row.id,
                    row.user_id,
                    row.workout_id,
                    row.taken_on,
                    row.caption,
                    row.file_name,
                    row.content_type,
                    row.created_at
                ],
            )?;
            Ok(())
        })
        .await
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<ProgressPhoto>> {
        let id = id.to_string();
        interact(&self.pool, move |conn| {
            Ok(conn
                .query_row(
                    "SELECT * FROM progress_photos WHERE id = ?",
                    [&id],
                    ProgressPhoto::from_row,
                )
                .optional()?)
        })
        .await
    }

    pub async fn find_by_user(&self, user_id: &str) -> Result<Vec<ProgressPhoto>> {
        let user_id = user_id.to_string();
        interact(&self.pool, move |conn| {
            let mut stmt = conn.prepare(
                "SELECT * FROM progress_photos WHERE user_id = ? ORDER BY taken_on DESC, created_at DESC",
            )?;
            let photos = stmt
                .query_map([&user_id], ProgressPhoto::from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(photos)
        })
        .await
    }

    pub async fn find_by_workout(&self, workout_id: &str) -> Result<Vec<ProgressPhoto>> {
        let workout_id = workout_id.to_string();
        interact(&self.pool, move |conn| {
            let mut stmt = conn.prepare(
                "SELECT * FROM progress_photos WHERE workout_id = ? ORDER BY created_at",
            )?;
            let photos = stmt
                .query_map([&workout_id], ProgressPhoto::from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(photos)
        })
        .await
    }

    pub async fn delete(&self, id: &str, user_id: &str) -> Result<bool> {
        let id = id.to_string();
        let user_id = user_id.to_string();
        interact(&self.pool, move |conn| {
            let rows = conn.execute(
                "DELETE FROM progress_photos WHERE id = ? AND user_id = ?",
                rusqlite::params![id, user_id],
            )?;
            Ok(rows > 0)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::test_support::{create_test_user, setup_test_db};
    use chrono::{NaiveDate, Utc};

    fn photo(id: &str, user_id: &str, day: u32) -> ProgressPhoto {
        ProgressPhoto {
            id: id.to_string(),
            user_id: user_id.to_string(),
            workout_id: None,
            taken_on: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            caption: Some(format!("day {}", day)),
            file_name: format!("{}.jpg", id),
            content_type: "image/jpeg".to_string(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_gallery_newest_first() {
        let pool = setup_test_db();
        create_test_user(&pool, "u1");
        let repo = PhotoRepository::new(pool);

        repo.create(&photo("p1", "u1", 1)).await.unwrap();
        repo.create(&photo("p2", "u1", 20)).await.unwrap();

        let photos = repo.find_by_user("u1").await.unwrap();
        let ids: Vec<_> = photos.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["p2", "p1"]);
    }

    #[tokio::test]
    async fn test_delete_scoped_to_owner() {
        let pool = setup_test_db();
        create_test_user(&pool, "u1");
        create_test_user(&pool, "u2");
        let repo = PhotoRepository::new(pool);
        repo.create(&photo("p1", "u1", 1)).await.unwrap();

        assert!(!repo.delete("p1", "u2").await.unwrap());
        assert!(repo.delete("p1", "u1").await.unwrap());
        assert!(repo.find_by_id("p1").await.unwrap().is_none());
    }
}
