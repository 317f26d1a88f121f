use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::Row;
use serde::Serialize;

use super::FromSqliteRow;

/// Accepted upload types and the extension each is stored under.
pub const ALLOWED_IMAGE_TYPES: &[(&str, &str)] = &[
    ("image/jpeg", "jpg"),
    ("image/png", "png"),
    ("image/webp", "webp"),
];

#[derive(Debug, Clone, Serialize)]
pub struct ProgressPhoto {
    pub id: String,
    pub user_id: String,
    pub workout_id: Option<String>,
    pub taken_on: NaiveDate,
    pub caption: Option<String>,
    pub file_name: String,
    pub content_type: String,
    pub created_at: DateTime<Utc>,
}

impl FromSqliteRow for ProgressPhoto {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            user_id: row.get("user_id")?,
            workout_id: row.get("workout_id")?,
            taken_on: row.get("taken_on")?,
            caption: row.get("caption")?,
            file_name: row.get("file_name")?,
            content_type: row.get("content_type")?,
            created_at: row.get("created_at")?,
        })
    }
}

pub fn extension_for(content_type: &str) -> Option<&'static str> {
    ALLOWED_IMAGE_TYPES
        .iter()
        .find(|(mime, _)| *mime == content_type)
        .map(|(_, ext)| *ext)
}
