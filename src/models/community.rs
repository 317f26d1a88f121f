use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::Row;
use serde::{Deserialize, Serialize};

use super::FromSqliteRow;

pub const COMMENT_MAX_LEN: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReactionKind {
    Like,
    Fire,
    Strong,
}

impl ReactionKind {
    pub const ALL: [ReactionKind; 3] = [ReactionKind::Like, ReactionKind::Fire, ReactionKind::Strong];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReactionKind::Like => "like",
            ReactionKind::Fire => "fire",
            ReactionKind::Strong => "strong",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == s)
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            ReactionKind::Like => "👍",
            ReactionKind::Fire => "🔥",
            ReactionKind::Strong => "💪",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReactionCounts {
    pub like: i64,
    pub fire: i64,
    pub strong: i64,
}

impl ReactionCounts {
    pub fn add(&mut self, kind: ReactionKind, count: i64) {
        match kind {
            ReactionKind::Like => self.like += count,
            ReactionKind::Fire => self.fire += count,
            ReactionKind::Strong => self.strong += count,
        }
    }

    pub fn get(&self, kind: ReactionKind) -> i64 {
        match kind {
            ReactionKind::Like => self.like,
            ReactionKind::Fire => self.fire,
            ReactionKind::Strong => self.strong,
        }
    }

    pub fn total(&self) -> i64 {
        self.like + self.fire + self.strong
    }
}

/// One public workout as shown in the feed.
#[derive(Debug, Clone, Serialize)]
pub struct FeedItem {
    pub workout_id: String,
    pub user_id: String,
    pub author: String,
    pub name: String,
    pub performed_on: NaiveDate,
    pub duration_seconds: Option<i64>,
    pub set_count: i64,
    pub reaction_count: i64,
    pub comment_count: i64,
    pub is_public: bool,
}

impl FromSqliteRow for FeedItem {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            workout_id: row.get("workout_id")?,
            user_id: row.get("user_id")?,
            author: row.get("author")?,
            name: row.get("name")?,
            performed_on: row.get("performed_on")?,
            duration_seconds: row.get("duration_seconds")?,
            set_count: row.get("set_count")?,
            reaction_count: row.get("reaction_count")?,
            comment_count: row.get("comment_count")?,
            is_public: row.get("is_public")?,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Comment {
    pub id: String,
    pub workout_id: String,
    pub user_id: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

impl FromSqliteRow for Comment {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            workout_id: row.get("workout_id")?,
            user_id: row.get("user_id")?,
            body: row.get("body")?,
            created_at: row.get("created_at")?,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CommentWithAuthor {
    pub id: String,
    pub workout_id: String,
    pub user_id: String,
    pub author: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

impl CommentWithAuthor {
    pub fn posted_at(&self) -> String {
        self.created_at.format("%Y-%m-%d %H:%M").to_string()
    }
}

impl FromSqliteRow for CommentWithAuthor {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            workout_id: row.get("workout_id")?,
            user_id: row.get("user_id")?,
            author: row.get("author")?,
            body: row.get("body")?,
            created_at: row.get("created_at")?,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct CommentForm {
    pub body: String,
}

#[derive(Debug, Deserialize)]
pub struct ReactionForm {
    pub kind: String,
}

/// Trimmed comment body, or a user-facing reason it was rejected.
pub fn clean_comment(body: &str) -> Result<&str, &'static str> {
    let body = body.trim();
    if body.is_empty() {
        return Err("Comment cannot be empty");
    }
    if body.chars().count() > COMMENT_MAX_LEN {
        return Err("Comment must be at most 500 characters");
    }
    Ok(body)
}
