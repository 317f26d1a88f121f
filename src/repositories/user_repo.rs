use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension};
use uuid::Uuid;

use crate::db::{interact, DbPool};
use crate::error::{AppError, Result};
use crate::models::{FromSqliteRow, User, UserSettings};
use crate::repositories::exercise_repo::insert_default_exercises;
use crate::repositories::settings_repo::upsert_settings;

#[derive(Clone)]
pub struct UserRepository {
    pool: DbPool,
}

impl UserRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn count(&self) -> Result<i64> {
        interact(&self.pool, |conn| {
            Ok(conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?)
        })
        .await
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<User>> {
        let id = id.to_string();
        interact(&self.pool, move |conn| {
            Ok(conn
                .query_row("SELECT * FROM users WHERE id = ?", [&id], User::from_row)
                .optional()?)
        })
        .await
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let username = username.to_string();
        interact(&self.pool, move |conn| {
            Ok(conn
                .query_row(
                    "SELECT * FROM users WHERE username = ?",
                    [&username],
                    User::from_row,
                )
                .optional()?)
        })
        .await
    }

    /// Insert a user with an argon2 hash of `password`.
    pub async fn create(&self, username: &str, password: &str) -> Result<User> {
        let user = new_user(username, password)?;

        let row = user.clone();
        interact(&self.pool, move |conn| Ok(insert_user(conn, &row)?)).await?;

        Ok(user)
    }

    /// Sign up a user together with default settings and the starter
    /// exercise library. All rows are written in one transaction.
    ///
    /// Returns the user and the number of seeded exercises.
    pub async fn create_account(&self, username: &str, password: &str) -> Result<(User, usize)> {
        let user = new_user(username, password)?;

        let row = user.clone();
        let seeded = interact(&self.pool, move |conn| {
            let tx = conn.unchecked_transaction()?;
            insert_user(&tx, &row)?;
            upsert_settings(&tx, &UserSettings::defaults_for(&row.id, &row.username))?;
            let seeded = insert_default_exercises(&tx, &row.id)?;
            tx.commit()?;
            Ok(seeded)
        })
        .await?;

        Ok((user, seeded))
    }

    /// The user when `password` matches, `None` for an unknown name or wrong password.
    pub async fn verify_password(&self, username: &str, password: &str) -> Result<Option<User>> {
        match self.find_by_username(username).await? {
            Some(user) if verify_password(password, &user.password_hash)? => Ok(Some(user)),
            _ => Ok(None),
        }
    }

    pub async fn update_password(&self, id: &str, new_password: &str) -> Result<bool> {
        let password_hash = hash_password(new_password)?;
        let id = id.to_string();
        interact(&self.pool, move |conn| {
            let rows = conn.execute(
                "UPDATE users SET password_hash = ? WHERE id = ?",
                rusqlite::params![password_hash, id],
            )?;
            Ok(rows > 0)
        })
        .await
    }
}

fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|_| AppError::PasswordHash)?
        .to_string();
    Ok(password_hash)
}

fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AppError::PasswordHash)?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

fn new_user(username: &str, password: &str) -> Result<User> {
    Ok(User {
        id: Uuid::new_v4().to_string(),
        username: username.to_string(),
        password_hash: hash_password(password)?,
        created_at: Utc::now(),
    })
}

fn insert_user(conn: &Connection, user: &User) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO users (id, username, password_hash, created_at) VALUES (?, ?, ?, ?)",
        rusqlite::params![user.id, user.username, user.password_hash, user.created_at],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::exercise::DEFAULT_EXERCISES;
    use crate::repositories::test_support::setup_test_db;

    #[tokio::test]
    async fn test_create_and_verify() {
        let repo = UserRepository::new(setup_test_db());

        let user = repo.create("alice", "password123").await.unwrap();
        assert_ne!(user.password_hash, "password123");

        let ok = repo.verify_password("alice", "password123").await.unwrap();
        assert_eq!(ok.map(|u| u.id), Some(user.id));

        assert!(repo.verify_password("alice", "wrong").await.unwrap().is_none());
        assert!(repo.verify_password("bob", "password123").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_username_fails() {
        let repo = UserRepository::new(setup_test_db());
        repo.create("alice", "password123").await.unwrap();
        assert!(repo.create("alice", "password456").await.is_err());
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_update_password() {
        let repo = UserRepository::new(setup_test_db());
        let user = repo.create("alice", "password123").await.unwrap();

        assert!(repo.update_password(&user.id, "new-password").await.unwrap());
        assert!(repo.verify_password("alice", "password123").await.unwrap().is_none());
        assert!(repo.verify_password("alice", "new-password").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_create_account_seeds_settings_and_exercises() {
        let pool = setup_test_db();
        let repo = UserRepository::new(pool.clone());

        let (user, seeded) = repo.create_account("alice", "password123").await.unwrap();

        assert_eq!(seeded, DEFAULT_EXERCISES.len());
        let conn = pool.get().unwrap();
        let settings_rows: i64 = conn
            .query_row("SELECT COUNT(*) FROM user_settings WHERE user_id = ?", [&user.id], |r| r.get(0))
            .unwrap();
        assert_eq!(settings_rows, 1);
    }

    #[tokio::test]
    async fn test_create_account_rolls_back_on_failure() {
        let pool = setup_test_db();
        pool.get()
            .unwrap()
            .execute_batch(
                "CREATE TRIGGER reject_exercises BEFORE INSERT ON exercises
                 BEGIN SELECT RAISE(ABORT, 'no exercises'); END;",
            )
            .unwrap();
        let repo = UserRepository::new(pool.clone());

        assert!(repo.create_account("alice", "password123").await.is_err());

        assert_eq!(repo.count().await.unwrap(), 0);
        let settings_rows: i64 = pool
            .get()
            .unwrap()
            .query_row("SELECT COUNT(*) FROM user_settings", [], |r| r.get(0))
            .unwrap();
        assert_eq!(settings_rows, 0);
    }
}
