use chrono::{DateTime, Utc};
use rusqlite::Row;
use serde::{Deserialize, Serialize};

use super::FromSqliteRow;

pub const USERNAME_MIN_LEN: usize = 3;
pub const USERNAME_MAX_LEN: usize = 32;
pub const PASSWORD_MIN_LEN: usize = 8;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl FromSqliteRow for User {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            username: row.get("username")?,
            password_hash: row.get("password_hash")?,
            created_at: row.get("created_at")?,
        })
    }
}

/// Login and signup form.
#[derive(Debug, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Returns a user-facing message when the username is unacceptable.
pub fn validate_username(username: &str) -> Option<&'static str> {
    let len = username.chars().count();
    if len < USERNAME_MIN_LEN || len > USERNAME_MAX_LEN {
        return Some("Username must be between 3 and 32 characters");
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Some("Username may only contain letters, digits, '_' and '-'");
    }
    None
}

pub fn validate_password(password: &str) -> Option<&'static str> {
    if password.chars().count() < PASSWORD_MIN_LEN {
        return Some("Password must be at least 8 characters");
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_username() {
        assert!(validate_username("lifter_01").is_none());
        assert!(validate_username("ab").is_some());
        assert!(validate_username(&"a".repeat(33)).is_some());
        assert!(validate_username("has space").is_some());
        assert!(validate_username("dash-ok").is_none());
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("1234567").is_some());
        assert!(validate_password("12345678").is_none());
    }

    #[test]
    fn test_password_hash_not_serialized() {
        let user = User {
            id: "u1".to_string(),
            username: "alice".to_string(),
            password_hash: "secret-hash".to_string(),
            created_at: Utc::now(),
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("secret-hash"));
    }
}
