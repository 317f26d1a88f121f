//! Embedded database migrations
//!
//! SQL files under `migrations/` are compiled into the binary and applied in
//! order. Applied names are recorded in `_migrations` so restarts are no-ops.

use crate::db::DbPool;

pub const MIGRATIONS: &[(&str, &str)] = &[
    (
        "001_create_users.sql",
        include_str!("../migrations/001_create_users.sql"),
    ),
    (
        "002_create_sessions.sql",
        include_str!("../migrations/002_create_sessions.sql"),
    ),
    (
        "003_create_user_settings.sql",
        include_str!("../migrations/003_create_user_settings.sql"),
    ),
    (
        "004_create_exercises.sql",
        include_str!("../migrations/004_create_exercises.sql"),
    ),
    (
        "005_create_workouts.sql",
        include_str!("../migrations/005_create_workouts.sql"),
    ),
    (
        "006_create_workout_sets.sql",
        include_str!("../migrations/006_create_workout_sets.sql"),
    ),
    (
        "007_create_goals.sql",
        include_str!("../migrations/007_create_goals.sql"),
    ),
    (
        "008_create_community.sql",
        include_str!("../migrations/008_create_community.sql"),
    ),
    (
        "009_create_progress_photos.sql",
        include_str!("../migrations/009_create_progress_photos.sql"),
    ),
    (
        "010_unique_set_numbers.sql",
        include_str!("../migrations/010_unique_set_numbers.sql"),
    ),
];

/// Apply every migration not yet recorded in `_migrations`.
pub fn run_migrations(pool: &DbPool) -> anyhow::Result<()> {
    tracing::info!("Running migrations...");

    let mut conn = pool.get()?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS _migrations (
            name TEXT PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    let mut applied = 0;
    for (filename, sql) in MIGRATIONS {
        let already_applied: bool = conn.query_row(
            "SELECT COUNT(*) > 0 FROM _migrations WHERE name = ?",
            [filename],
            |row| row.get(0),
        )?;

        if already_applied {
            tracing::debug!("Skipping already applied migration: {}", filename);
            continue;
        }

        tracing::info!("Running migration: {}", filename);

        // Script and bookkeeping row land together or not at all.
        let tx = conn.transaction()?;
        tx.execute_batch(sql)?;
        tx.execute("INSERT INTO _migrations (name) VALUES (?)", [filename])?;
        tx.commit()?;
        applied += 1;
    }

    tracing::info!("Migrations completed ({} applied)", applied);
    Ok(())
}

/// Apply all migrations to a fresh database without bookkeeping.
pub fn run_migrations_for_tests(pool: &DbPool) -> Result<(), Box<dyn std::error::Error>> {
    let conn = pool.get()?;

    for (_filename, sql) in MIGRATIONS {
        conn.execute_batch(sql)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_memory_pool;

    #[test]
    fn test_run_migrations_is_idempotent() {
        let pool = create_memory_pool().unwrap();
        run_migrations(&pool).unwrap();
        run_migrations(&pool).unwrap();

        let conn = pool.get().unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM _migrations", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, MIGRATIONS.len() as i64);
    }

    #[test]
    fn test_migration_names_are_ordered() {
        let names: Vec<_> = MIGRATIONS.iter().map(|(name, _)| *name).collect();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
    }
}
