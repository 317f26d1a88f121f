use chrono::{DateTime, Duration, Utc};
use rusqlite::OptionalExtension;
use uuid::Uuid;

use crate::db::{interact, DbPool};
use crate::error::Result;
use crate::session::SESSION_TTL_DAYS;

/// The signed-in user behind a session token.
#[derive(Debug, Clone)]
pub struct SessionUser {
    pub user_id: String,
    pub username: String,
}

#[derive(Clone)]
pub struct SessionRepository {
    pool: DbPool,
}

impl SessionRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Start a session for `user_id`, returning its token.
    pub async fn create(&self, user_id: &str) -> Result<String> {
        let token = Uuid::new_v4().to_string();
        let user_id = user_id.to_string();
        let now = Utc::now();
        let expires_at = now + Duration::days(SESSION_TTL_DAYS);

        let row_token = token.clone();
        interact(&self.pool, move |conn| {
            conn.execute(
                "INSERT INTO sessions (token, user_id, created_at, expires_at) VALUES (?, ?, ?, ?)",
                rusqlite::params![row_token, user_id, now, expires_at],
            )?;
            Ok(())
        })
        .await?;

        Ok(token)
    }

    /// Resolve a live token to its user. An expired session is deleted on sight.
    pub async fn find_user(&self, token: &str) -> Result<Option<SessionUser>> {
        let token = token.to_string();
        let now = Utc::now();

        interact(&self.pool, move |conn| {
            let found: Option<(String, String, DateTime<Utc>)> = conn
                .query_row(
                    "SELECT s.user_id, u.username, s.expires_at
                     FROM sessions s
                     JOIN users u ON u.id = s.user_id
                     WHERE s.token = ?",
                    [&token],
                    |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
                )
                .optional()?;

            match found {
                Some((_, _, expires_at)) if expires_at <= now => {
                    conn.execute("DELETE FROM sessions WHERE token = ?", [&token])?;
                    Ok(None)
                }
                Some((user_id, username, _)) => Ok(Some(SessionUser { user_id, username })),
                None => Ok(None),
            }
        })
        .await
    }

    pub async fn delete(&self, token: &str) -> Result<()> {
        let token = token.to_string();
        interact(&self.pool, move |conn| {
            conn.execute("DELETE FROM sessions WHERE token = ?", [&token])?;
            Ok(())
        })
        .await
    }

    /// Sign the user out everywhere except `keep_token`.
    pub async fn delete_all_for_user_except(&self, user_id: &str, keep_token: &str) -> Result<usize> {
        let user_id = user_id.to_string();
        let keep_token = keep_token.to_string();
        interact(&self.pool, move |conn| {
            Ok(conn.execute(
                "DELETE FROM sessions WHERE user_id = ? AND token != ?",
                rusqlite::params![user_id, keep_token],
            )?)
        })
        .await
    }

    pub async fn cleanup_expired(&self) -> Result<usize> {
        let now = Utc::now();
        interact(&self.pool, move |conn| {
            Ok(conn.execute(
                "DELETE FROM sessions WHERE expires_at <= ?",
                rusqlite::params![now],
            )?)
        })
        .await
    }
}
