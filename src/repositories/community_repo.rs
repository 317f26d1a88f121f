use chrono::Utc;
use rusqlite::OptionalExtension;
use uuid::Uuid;

use crate::db::{interact, DbPool};
use crate::error::Result;
use crate::models::{Comment, CommentWithAuthor, FeedItem, FromSqliteRow, ReactionCounts, ReactionKind};

const FEED_SELECT: &str = "SELECT w.id AS workout_id, w.user_id,
        COALESCE(us.display_name, u.username) AS author,
        w.name, w.performed_on, w.duration_seconds, w.is_public,
        (SELECT COUNT(*) FROM workout_sets s WHERE s.workout_id = w.id) AS set_count,
        (SELECT COUNT(*) FROM reactions r WHERE r.workout_id = w.id) AS reaction_count,
        (SELECT COUNT(*) FROM comments c WHERE c.workout_id = w.id) AS comment_count
     FROM workouts w
     JOIN users u ON u.id = w.user_id
     LEFT JOIN user_settings us ON us.user_id = w.user_id";

const COMMENT_SELECT: &str = "SELECT c.id, c.workout_id, c.user_id,
        COALESCE(us.display_name, u.username) AS author,
        c.body, c.created_at
     FROM comments c
     JOIN users u ON u.id = c.user_id
     LEFT JOIN user_settings us ON us.user_id = c.user_id";

#[derive(Clone)]
pub struct CommunityRepository {
    pool: DbPool,
}

impl CommunityRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// One page of public workouts plus whether another page follows.
    pub async fn feed_page(&self, limit: i64, offset: i64) -> Result<(Vec<FeedItem>, bool)> {
        interact(&self.pool, move |conn| {
            let mut stmt = conn.prepare(&format!(
                "{} WHERE w.is_public = 1
                 ORDER BY w.performed_on DESC, w.created_at DESC
                 LIMIT ? OFFSET ?",
                FEED_SELECT
            ))?;
            // One extra row tells us whether there is a next page.
            let mut items = stmt
                .query_map(rusqlite::params![limit + 1, offset], FeedItem::from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            let has_more = items.len() as i64 > limit;
            items.truncate(limit.max(0) as usize);
            Ok((items, has_more))
        })
        .await
    }

    /// Feed entry for any workout, public or not; callers decide visibility.
    pub async fn find_item(&self, workout_id: &str) -> Result<Option<FeedItem>> {
        let workout_id = workout_id.to_string();
        interact(&self.pool, move |conn| {
            Ok(conn
                .query_row(
                    &format!("{} WHERE w.id = ?", FEED_SELECT),
                    [&workout_id],
                    FeedItem::from_row,
                )
                .optional()?)
        })
        .await
    }

    /// Add the reaction if absent, remove it if present. Returns whether it is now set.
    pub async fn toggle_reaction(&self, workout_id: &str, user_id: &str, kind: ReactionKind) -> Result<bool> {
        let workout_id = workout_id.to_string();
        let user_id = user_id.to_string();
        interact(&self.pool, move |conn| {
            let tx = conn.unchecked_transaction()?;
            let removed = tx.execute(
                "DELETE FROM reactions WHERE workout_id = ? AND user_id = ? AND kind = ?",
                rusqlite::params![workout_id, user_id, kind.as_str()],
            )?;
            if removed == 0 {
                tx.execute(
                    "INSERT INTO reactions (id, workout_id, user_id, kind, created_at) VALUES (?, ?, ?, ?, ?)",
                    rusqlite::params![
                        Uuid::new_v4().to_string(),
                        workout_id,
                        user_id,
                        kind.as_str(),
                        Utc::now()
                    ],
                )?;
            }
            tx.commit()?;
            Ok(removed == 0)
        })
        .await
    }

    pub async fn reaction_counts(&self, workout_id: &str) -> Result<ReactionCounts> {
        let workout_id = workout_id.to_string();
        interact(&self.pool, move |conn| {
            let mut stmt = conn.prepare(
                "SELECT kind, COUNT(*) FROM reactions WHERE workout_id = ? GROUP BY kind",
            )?;
            let rows = stmt
                .query_map([&workout_id], |row| {
                    Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            let mut counts = ReactionCounts::default();
            for (kind, count) in rows {
                if let Some(kind) = ReactionKind::parse(&kind) {
                    counts.add(kind, count);
                }
            }
            Ok(counts)
        })
        .await
    }

    pub async fn user_reactions(&self, workout_id: &str, user_id: &str) -> Result<Vec<ReactionKind>> {
        let workout_id = workout_id.to_string();
        let user_id = user_id.to_string();
        interact(&self.pool, move |conn| {
            let mut stmt =
                conn.prepare("SELECT kind FROM reactions WHERE workout_id = ? AND user_id = ?")?;
            let kinds = stmt
                .query_map(rusqlite::params![workout_id, user_id], |row| {
                    row.get::<_, String>(0)
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(kinds.iter().filter_map(|k| ReactionKind::parse(k)).collect())
        })
        .await
    }

    pub async fn add_comment(&self, workout_id: &str, user_id: &str, body: &str) -> Result<Comment> {
        let comment = Comment {
            id: Uuid::new_v4().to_string(),
            workout_id: workout_id.to_string(),
            user_id: user_id.to_string(),
            body: body.to_string(),
            created_at: Utc::now(),
        };

        let row = comment.clone();
        interact(&self.pool, move |conn| {
            conn.execute(
                "INSERT INTO comments (id, workout_id, user_id, body, created_at) VALUES (?, ?, ?, ?, ?)",
                rusqlite::params![row.id, row.workout_id, row.user_id, row.body, row.created_at],
            )?;
            Ok(())
        })
        .await?;

        Ok(comment)
    }

    /// Comments on a workout, oldest first.
    pub async fn list_comments(&self, workout_id: &str) -> Result<Vec<CommentWithAuthor>> {
        let workout_id = workout_id.to_string();
        interact(&self.pool, move |conn| {
            let mut stmt = conn.prepare(&format!(
                "{} WHERE c.workout_id = ? ORDER BY c.created_at",
                COMMENT_SELECT
            ))?;
            let comments = stmt
                .query_map([&workout_id], CommentWithAuthor::from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(comments)
        })
        .await
    }

    pub async fn find_comment(&self, id: &str) -> Result<Option<Comment>> {
        let id = id.to_string();
        interact(&self.pool, move |conn| {
            Ok(conn
                .query_row("SELECT * FROM comments WHERE id = ?", [&id], Comment::from_row)
                .optional()?)
        })
        .await
    }

    pub async fn delete_comment(&self, id: &str) -> Result<bool> {
        let id = id.to_string();
        interact(&self.pool, move |conn| {
            Ok(conn.execute("DELETE FROM comments WHERE id = ?", [&id])? > 0)
        })
        .await
    }
}
