use rusqlite::{Connection, OptionalExtension};

use crate::db::{interact, DbPool};
use crate::error::Result;
use crate::models::{FromSqliteRow, UserSettings};

#[derive(Clone)]
pub struct SettingsRepository {
    pool: DbPool,
}

impl SettingsRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Stored settings, or defaults derived from the username when none exist.
    pub async fn get(&self, user_id: &str) -> Result<UserSettings> {
        let user_id = user_id.to_string();
        interact(&self.pool, move |conn| {
            let stored = conn
                .query_row(
                    "SELECT * FROM user_settings WHERE user_id = ?",
                    [&user_id],
                    UserSettings::from_row,
                )
                .optional()?;

            match stored {
                Some(settings) => Ok(settings),
                None => {
                    let username: String = conn.query_row(
                        "SELECT username FROM users WHERE id = ?",
                        [&user_id],
                        |row| row.get(0),
                    )?;
                    Ok(UserSettings::defaults_for(&user_id, &username))
                }
            }
        })
        .await
    }

    pub async fn save(&self, settings: &UserSettings) -> Result<()> {
        let settings = settings.clone();
        interact(&self.pool, move |conn| Ok(upsert_settings(conn, &settings)?)).await
    }
}

pub(crate) fn upsert_settings(conn: &Connection, settings: &UserSettings) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO user_settings (user_id, display_name, weight_unit, default_rest_seconds, share_by_default)
         VALUES (?, ?, ?, ?, ?)
         ON CONFLICT(user_id) DO UPDATE SET
            display_name = excluded.display_name,
            weight_unit = excluded.weight_unit,
            default_rest_seconds = excluded.default_rest_seconds,
            share_by_default = excluded.share_by_default",
        rusqlite::params![
            settings.user_id,
            settings.display_name,
            settings.weight_unit.as_str(),
            settings.default_rest_seconds,
            settings.share_by_default
        ],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::WeightUnit;
    use crate::repositories::test_support::{create_test_user, setup_test_db};

    #[tokio::test]
    async fn test_defaults_when_missing() {
        let pool = setup_test_db();
        create_test_user(&pool, "u1");
        let repo = SettingsRepository::new(pool);

        let settings = repo.get("u1").await.unwrap();
        assert_eq!(settings.display_name, "user_u1");
        assert_eq!(settings.weight_unit, WeightUnit::Kg);
        assert!(!settings.share_by_default);
    }

    #[tokio::test]
    async fn test_save_upserts() {
        let pool = setup_test_db();
        create_test_user(&pool, "u1");
        let repo = SettingsRepository::new(pool);

        let mut settings = repo.get("u1").await.unwrap();
        settings.weight_unit = WeightUnit::Lb;
        settings.display_name = "Lifter".to_string();
        repo.save(&settings).await.unwrap();

        settings.default_rest_seconds = 120;
        repo.save(&settings).await.unwrap();

        let stored = repo.get("u1").await.unwrap();
        assert_eq!(stored.weight_unit, WeightUnit::Lb);
        assert_eq!(stored.display_name, "Lifter");
        assert_eq!(stored.default_rest_seconds, 120);
    }
}
